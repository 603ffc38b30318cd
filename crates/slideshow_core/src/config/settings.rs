//! Buildfile settings with TOML-based sections.
//!
//! A buildfile describes one slideshow. Every field has a default, so a file
//! only needs the values that differ (usually just `[sources]`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};
use crate::models::{AudioOrder, ProfileName};
use crate::tools::{Executables, Tool, DEFAULT_FONT};

/// Root settings structure containing all buildfile sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Input images and audio.
    #[serde(default)]
    pub sources: SourceSettings,

    /// Look of the show.
    #[serde(default)]
    pub show: ShowSettings,

    /// Output and scratch locations.
    #[serde(default)]
    pub paths: PathSettings,

    /// External program locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.show.image_duration < 1 {
            return Err("show.image_duration must be at least 1 second".to_string());
        }
        if self.show.transition_duration < 1 {
            return Err("show.transition_duration must be at least 1 second".to_string());
        }
        if self.paths.output.trim().is_empty() {
            return Err("paths.output must not be empty".to_string());
        }
        Ok(())
    }
}

/// Input entries.
///
/// Each entry is a file, a directory (direct children only), `+dir` for a
/// recursive search, or `@list.txt` with one entry per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default)]
    pub audio: Vec<String>,
}

/// Show parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowSettings {
    /// Output profile: dvd, 720p, 1080p, uhd or 4k.
    #[serde(default)]
    pub profile: ProfileName,

    /// Seconds each image is shown.
    #[serde(default = "default_image_duration")]
    pub image_duration: u32,

    /// Seconds each transition lasts.
    #[serde(default = "default_transition_duration")]
    pub transition_duration: u32,

    /// Font name or path to a .ttf file.
    #[serde(default = "default_font")]
    pub font: String,

    /// Title drawn on the first slide (`@file` reads it from a file).
    #[serde(default)]
    pub title: String,

    /// Author shown on the last slide.
    #[serde(default)]
    pub author: String,

    /// Closing text on the last slide (`@file` reads it from a file).
    #[serde(default)]
    pub epilog: String,

    /// Color behind text and around resized images.
    #[serde(default = "default_background")]
    pub background: String,

    /// Color of title and epilog text.
    #[serde(default = "default_textcolor")]
    pub textcolor: String,

    /// Order of audio segments: input or generated_name.
    #[serde(default)]
    pub audio_order: AudioOrder,
}

fn default_image_duration() -> u32 {
    5
}

fn default_transition_duration() -> u32 {
    1
}

fn default_font() -> String {
    DEFAULT_FONT.to_string()
}

fn default_background() -> String {
    "black".to_string()
}

fn default_textcolor() -> String {
    "white".to_string()
}

impl Default for ShowSettings {
    fn default() -> Self {
        Self {
            profile: ProfileName::default(),
            image_duration: default_image_duration(),
            transition_duration: default_transition_duration(),
            font: default_font(),
            title: String::new(),
            author: String::new(),
            epilog: String::new(),
            background: default_background(),
            textcolor: default_textcolor(),
            audio_order: AudioOrder::default(),
        }
    }
}

/// Path configuration for output, scratch space and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSettings {
    /// Final output file (`.mkv` is appended when missing).
    #[serde(default = "default_output")]
    pub output: String,

    /// Parent of the workspaces; empty means the system temp dir.
    #[serde(default)]
    pub workdir: String,

    /// Folder for run logs; empty disables the log file.
    #[serde(default)]
    pub logs_folder: String,

    /// Delete intermediate files as soon as they are no longer needed.
    #[serde(default = "default_true")]
    pub remove_tempfiles: bool,
}

fn default_output() -> String {
    "slideshow.mkv".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            output: default_output(),
            workdir: String::new(),
            logs_folder: String::new(),
            remove_tempfiles: true,
        }
    }
}

impl PathSettings {
    pub fn workdir(&self) -> Option<PathBuf> {
        non_empty_path(&self.workdir)
    }

    pub fn logs_folder(&self) -> Option<PathBuf> {
        non_empty_path(&self.logs_folder)
    }
}

fn non_empty_path(s: &str) -> Option<PathBuf> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

/// Locations of the external programs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSettings {
    #[serde(default = "default_convert")]
    pub convert: String,
    #[serde(default = "default_montage")]
    pub montage: String,
    #[serde(default = "default_mogrify")]
    pub mogrify: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_mkvmerge")]
    pub mkvmerge: String,
}

fn default_program(tool: Tool) -> String {
    tool.default_program().to_string_lossy().into_owned()
}

fn default_convert() -> String {
    default_program(Tool::Convert)
}

fn default_montage() -> String {
    default_program(Tool::Montage)
}

fn default_mogrify() -> String {
    default_program(Tool::Mogrify)
}

fn default_ffmpeg() -> String {
    default_program(Tool::Ffmpeg)
}

fn default_mkvmerge() -> String {
    default_program(Tool::Mkvmerge)
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            convert: default_convert(),
            montage: default_montage(),
            mogrify: default_mogrify(),
            ffmpeg: default_ffmpeg(),
            mkvmerge: default_mkvmerge(),
        }
    }
}

impl ToolSettings {
    /// Build the immutable executable map.
    pub fn executables(&self) -> Executables {
        Executables::default()
            .with(Tool::Convert, &self.convert)
            .with(Tool::Montage, &self.montage)
            .with(Tool::Mogrify, &self.mogrify)
            .with(Tool::Ffmpeg, &self.ffmpeg)
            .with(Tool::Mkvmerge, &self.mkvmerge)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Minimum level: trace, debug, info, warn, error.
    #[serde(default)]
    pub level: LogLevel,

    /// Keep tool output out of the log unless a tool fails.
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Number of tool output lines shown after a failure.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix log lines with the time.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            compact: true,
            error_tail: default_error_tail(),
            show_timestamps: true,
        }
    }
}

impl LoggingSettings {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
        }
    }
}

/// Buildfile sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Sources,
    Show,
    Paths,
    Tools,
    Logging,
}

impl ConfigSection {
    pub const ALL: [ConfigSection; 5] = [
        ConfigSection::Sources,
        ConfigSection::Show,
        ConfigSection::Paths,
        ConfigSection::Tools,
        ConfigSection::Logging,
    ];

    /// Get the TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Sources => "sources",
            ConfigSection::Show => "show",
            ConfigSection::Paths => "paths",
            ConfigSection::Tools => "tools",
            ConfigSection::Logging => "logging",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_settings_serializes() {
        let settings = Settings::default();
        let toml = toml::to_string_pretty(&settings).unwrap();
        assert!(toml.contains("[show]"));
        assert!(toml.contains("profile = \"1080p\""));
        assert!(toml.contains("audio_order = \"input\""));
    }

    #[test]
    fn settings_round_trip() {
        let mut settings = Settings::default();
        settings.sources.images = vec!["+/home/me/pictures".to_string()];
        settings.show.profile = ProfileName::Dvd;
        let toml = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let parsed: Settings = toml::from_str(
            "[sources]\nimages = [\"a.jpg\"]\n\n[show]\nprofile = \"DVD\"\ntitle = \"Trip\"\n",
        )
        .unwrap();
        assert_eq!(parsed.show.profile, ProfileName::Dvd);
        assert_eq!(parsed.show.image_duration, 5);
        assert_eq!(parsed.show.background, "black");
        assert!(parsed.paths.remove_tempfiles);
        assert_eq!(parsed.paths.workdir(), None);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let result: Result<Settings, _> = toml::from_str("[show]\nprofile = \"8k\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn durations_must_be_positive() {
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());
        settings.show.transition_duration = 0;
        assert!(settings.validate().is_err());
        settings.show.transition_duration = 1;
        settings.show.image_duration = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn tool_paths_build_executables() {
        let tools = ToolSettings {
            ffmpeg: "/opt/ffmpeg".to_string(),
            ..ToolSettings::default()
        };
        let exes = tools.executables();
        assert_eq!(exes.get(Tool::Ffmpeg), Path::new("/opt/ffmpeg"));
    }
}
