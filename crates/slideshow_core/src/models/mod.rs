//! Core data types (profiles, slots, timecodes, tags).

mod enums;
mod profile;
pub mod slots;
mod tags;
mod timecode;

pub use enums::{AudioOrder, UnitKind};
pub use profile::{Profile, ProfileName, UnknownProfile};
pub use slots::SlotPlan;
pub use tags::{escape_xml, TagMetadata, TAG_COMMENT};
pub use timecode::Timecode;
