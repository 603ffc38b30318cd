//! Slot numbering for pictures and transitions.
//!
//! Every picture gets an odd slot and every transition the even slot
//! between the two pictures it bridges:
//!
//! ```text
//! slot:  1      2      3      4      5    ...   2N+2    2N+3
//!        first  morph  pic 1  morph  pic 2 ...  morph   last
//! ```
//!
//! Slot 1 is the generated title picture, slots `3, 5, ..., 2N+1` are the
//! N source pictures in source order, and `2N+3` is the generated epilog
//! picture. File names embed the slot zero-padded to six digits, so sorting
//! the movie segment names lexically yields playback order.

/// Slot of the generated first (title) picture.
pub const FIRST_SLOT: u32 = 1;

/// Slot of the first source picture.
pub const FIRST_SOURCE_SLOT: u32 = 3;

/// Frame file pattern inside a morph folder (ImageMagick/ffmpeg syntax).
pub const MORPH_FRAME_PATTERN: &str = "%03d.jpg";

/// Slot of the source picture at `index` (0-based, in source order).
pub fn source_slot(index: usize) -> u32 {
    FIRST_SOURCE_SLOT + 2 * index as u32
}

/// Slot reserved for the generated last (epilog) picture.
pub fn last_slot(source_count: usize) -> u32 {
    source_slot(source_count)
}

/// Whether `slot` belongs to a picture (odd) rather than a transition.
pub fn is_picture_slot(slot: u32) -> bool {
    slot % 2 == 1
}

/// File name of a normalized picture.
pub fn picture_file_name(slot: u32) -> String {
    format!("pic-{:06}.jpg", slot)
}

/// Folder name holding the morph frames of a transition.
pub fn morph_dir_name(slot: u32) -> String {
    format!("morph-{:06}", slot)
}

/// File name of the rendered movie segment for a slot.
///
/// Pictures and transitions share the prefix so that a plain sort of the
/// movies directory interleaves them.
pub fn movie_file_name(slot: u32) -> String {
    format!("mov-pic-{:06}.mp4", slot)
}

/// Extract the slot number from any of the generated names.
pub fn slot_from_name(name: &str) -> Option<u32> {
    let stem = name.split('.').next()?;
    let digits = stem.rsplit('-').next()?;
    if digits.len() != 6 {
        return None;
    }
    digits.parse().ok()
}

/// The full slot layout for a show with a given number of source pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlan {
    source_count: usize,
}

impl SlotPlan {
    pub fn new(source_count: usize) -> Self {
        Self { source_count }
    }

    /// Number of source pictures.
    pub fn source_count(&self) -> usize {
        self.source_count
    }

    /// Slots of the source pictures only.
    pub fn source_slots(&self) -> Vec<u32> {
        (0..self.source_count).map(source_slot).collect()
    }

    /// Slot of the generated last picture.
    pub fn last_slot(&self) -> u32 {
        last_slot(self.source_count)
    }

    /// All picture slots in playback order (first, sources, last).
    pub fn picture_slots(&self) -> Vec<u32> {
        let mut slots = Vec::with_capacity(self.source_count + 2);
        slots.push(FIRST_SLOT);
        slots.extend(self.source_slots());
        slots.push(self.last_slot());
        slots
    }

    /// Transition slots, one between each adjacent picture pair.
    pub fn transition_slots(&self) -> Vec<u32> {
        self.picture_slots()
            .windows(2)
            .map(|pair| pair[0] + 1)
            .collect()
    }

    /// Total number of movie segments (pictures plus transitions).
    pub fn segment_count(&self) -> usize {
        2 * self.source_count + 3
    }
}
