//! Buildfile manager for loading, validating and atomic saving.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during buildfile operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read buildfile: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse buildfile: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize buildfile: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid buildfile: {0}")]
    Invalid(String),

    #[error("Buildfile not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for buildfile operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages one buildfile on disk.
pub struct ConfigManager {
    /// Path to the buildfile.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
}

impl ConfigManager {
    /// Create a manager for `config_path`.
    ///
    /// Does not load anything - call `load()` or `load_or_create()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    /// Get the buildfile path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    ///
    /// Changes stay in memory until `save()` is called.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Take the loaded settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Load and validate the buildfile.
    ///
    /// Returns error if file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        self.settings = Self::parse_and_validate(&content)?;
        Ok(())
    }

    /// Load the buildfile, writing a default one first if it doesn't exist.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if self.config_path.exists() {
            self.load()
        } else {
            self.settings = Settings::default();
            self.save()
        }
    }

    /// Parse and validate buildfile content.
    pub fn parse_and_validate(content: &str) -> ConfigResult<Settings> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate().map_err(ConfigError::Invalid)?;
        Ok(settings)
    }

    /// Save the buildfile atomically, with explanatory comments.
    pub fn save(&self) -> ConfigResult<()> {
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        tracing::debug!("Saved buildfile to {}", self.config_path.display());
        Ok(())
    }

    /// Generate buildfile content with helpful comments.
    pub fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();

        output.push_str("# Slideshow buildfile\n");
        output.push_str("# Build it with: slideshow build <this file>\n\n");

        for section in ConfigSection::ALL {
            for line in section_comment(section).lines() {
                output.push_str("# ");
                output.push_str(line);
                output.push('\n');
            }
            output.push_str(&format!("[{}]\n", section.table_name()));
            let body = match section {
                ConfigSection::Sources => section_body(&self.settings.sources)?,
                ConfigSection::Show => section_body(&self.settings.show)?,
                ConfigSection::Paths => section_body(&self.settings.paths)?,
                ConfigSection::Tools => section_body(&self.settings.tools)?,
                ConfigSection::Logging => section_body(&self.settings.logging)?,
            };
            output.push_str(&body);
            output.push('\n');
        }

        Ok(output)
    }

    /// Write content to the buildfile atomically (temp file, then rename).
    fn atomic_write(&self, content: &str) -> io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.config_path.with_extension("toml.tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;

        Ok(())
    }
}

fn section_body<T: Serialize>(section: &T) -> ConfigResult<String> {
    let mut body = toml::to_string_pretty(section)?;
    if !body.ends_with('\n') {
        body.push('\n');
    }
    Ok(body)
}

fn section_comment(section: ConfigSection) -> &'static str {
    match section {
        ConfigSection::Sources => {
            "Images and audio files. Entries may be files, folders (direct children),\n\
             +folder (searched recursively) or @list.txt (one entry per line).\n\
             Images need at least 4 entries in total."
        }
        ConfigSection::Show => {
            "Profiles: dvd (720x576, 30Hz), 720p (1280x720, 60Hz), 1080p (1920x1080, 60Hz),\n\
             uhd (3840x2160, 60Hz), 4k (4096x2304, 60Hz).\n\
             Durations are whole seconds. Run `slideshow list-fonts` for available fonts.\n\
             title and epilog may be @file to read the text from a file.\n\
             audio_order: input (as given) or generated_name (legacy lexical order)."
        }
        ConfigSection::Paths => {
            "workdir: parent of the temporary folders (empty = system temp dir).\n\
             logs_folder: where run logs are written (empty = no log file)."
        }
        ConfigSection::Tools => "External programs, if they are not on your PATH.",
        ConfigSection::Logging => "Logging configuration.",
    }
}
