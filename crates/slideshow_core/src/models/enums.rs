//! Small enums shared across the crate.

use serde::{Deserialize, Serialize};

/// How transcoded audio segments are ordered before merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioOrder {
    /// Keep the order the audio files were given in.
    #[default]
    Input,
    /// Re-sort by the generated segment file name (`audio-NNN.aac`).
    ///
    /// Matches input order for up to 999 files; beyond that the lexical
    /// sort moves `audio-1000.aac` ahead of `audio-101.aac`.
    GeneratedName,
}

impl std::fmt::Display for AudioOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AudioOrder::Input => write!(f, "input"),
            AudioOrder::GeneratedName => write!(f, "generated_name"),
        }
    }
}

/// The units of work a slideshow run is split into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitKind {
    Video,
    Audio,
    Muxer,
}

impl UnitKind {
    /// Name used for workspace folders and error context.
    pub fn name(&self) -> &'static str {
        match self {
            UnitKind::Video => "VideoBuilder",
            UnitKind::Audio => "AudioBuilder",
            UnitKind::Muxer => "Muxer",
        }
    }
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_order_serde() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            order: AudioOrder,
        }
        let w: Wrapper = toml::from_str("order = \"generated_name\"").unwrap();
        assert_eq!(w.order, AudioOrder::GeneratedName);
        assert_eq!(AudioOrder::default(), AudioOrder::Input);
    }

    #[test]
    fn unit_names() {
        assert_eq!(UnitKind::Video.to_string(), "VideoBuilder");
        assert_eq!(UnitKind::Muxer.name(), "Muxer");
    }
}
