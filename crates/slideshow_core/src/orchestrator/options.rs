//! Options of one slideshow run.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::builders::VideoOptions;
use crate::config::Settings;
use crate::models::{AudioOrder, ProfileName};
use crate::sources::read_text_arg;
use crate::tools::{Executables, DEFAULT_FONT};

use super::errors::SlideshowError;

/// Everything a run needs besides the input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideshowOptions {
    pub profile: ProfileName,
    pub image_duration: u32,
    pub transition_duration: u32,
    pub font: String,
    pub title: String,
    pub author: String,
    pub epilog: String,
    pub background: String,
    pub textcolor: String,
    pub audio_order: AudioOrder,
    /// Output container; `.mkv` is appended when missing.
    pub output: PathBuf,
    /// Parent of the unit workspaces; system temp dir when `None`.
    pub workdir: Option<PathBuf>,
    pub remove_tempfiles: bool,
    pub executables: Executables,
}

impl Default for SlideshowOptions {
    fn default() -> Self {
        Self {
            profile: ProfileName::default(),
            image_duration: 5,
            transition_duration: 1,
            font: DEFAULT_FONT.to_string(),
            title: String::new(),
            author: String::new(),
            epilog: String::new(),
            background: "black".to_string(),
            textcolor: "white".to_string(),
            audio_order: AudioOrder::default(),
            output: PathBuf::from("slideshow.mkv"),
            workdir: None,
            remove_tempfiles: true,
            executables: Executables::default(),
        }
    }
}

impl SlideshowOptions {
    /// Options from a loaded buildfile.
    ///
    /// `@file` title and epilog values are read from their files.
    pub fn from_settings(settings: &Settings) -> Result<Self, SlideshowError> {
        let show = &settings.show;
        Ok(Self {
            profile: show.profile,
            image_duration: show.image_duration,
            transition_duration: show.transition_duration,
            font: show.font.clone(),
            title: read_text_arg(&show.title)?,
            author: show.author.clone(),
            epilog: read_text_arg(&show.epilog)?,
            background: show.background.clone(),
            textcolor: show.textcolor.clone(),
            audio_order: show.audio_order,
            output: PathBuf::from(&settings.paths.output),
            workdir: settings.paths.workdir(),
            remove_tempfiles: settings.paths.remove_tempfiles,
            executables: settings.tools.executables(),
        })
    }

    /// Select a profile by its name (`dvd`, `720p`, `1080p`, `uhd`, `4k`).
    pub fn with_profile(mut self, name: &str) -> Result<Self, SlideshowError> {
        self.profile = name.parse()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), SlideshowError> {
        if self.image_duration < 1 {
            return Err(SlideshowError::InvalidOptions(
                "image duration must be at least 1 second".to_string(),
            ));
        }
        if self.transition_duration < 1 {
            return Err(SlideshowError::InvalidOptions(
                "transition duration must be at least 1 second".to_string(),
            ));
        }
        if self.output.as_os_str().is_empty() {
            return Err(SlideshowError::InvalidOptions(
                "output path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn video_options(&self) -> VideoOptions {
        VideoOptions {
            profile: self.profile.profile(),
            image_duration: self.image_duration,
            transition_duration: self.transition_duration,
            font: self.font.clone(),
            title: self.title.clone(),
            author: self.author.clone(),
            epilog: self.epilog.clone(),
            background: self.background.clone(),
            textcolor: self.textcolor.clone(),
            remove_tempfiles: self.remove_tempfiles,
        }
    }
}

/// Append `.mkv` unless the path already ends with it (case-insensitive).
pub fn normalize_output(path: &Path) -> PathBuf {
    let has_ext = path
        .to_string_lossy()
        .to_ascii_lowercase()
        .ends_with(".mkv");
    if has_ext {
        return path.to_path_buf();
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".mkv");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn normalize_output_appends_extension() {
        assert_eq!(normalize_output(Path::new("show")), PathBuf::from("show.mkv"));
        assert_eq!(normalize_output(Path::new("show.MKV")), PathBuf::from("show.MKV"));
        assert_eq!(
            normalize_output(Path::new("out/show.mp4")),
            PathBuf::from("out/show.mp4.mkv")
        );
    }

    #[test]
    fn from_settings_reads_text_files() {
        let dir = tempdir().unwrap();
        let epilog = dir.path().join("epilog.txt");
        fs::write(&epilog, "Thanks\n").unwrap();
        let toml = format!(
            "[show]\nprofile = \"dvd\"\ntitle = \"Summer\"\nepilog = \"@{}\"\n\n[paths]\noutput = \"summer\"\nremove_tempfiles = false\n",
            epilog.display()
        );
        let settings = ConfigManager::parse_and_validate(&toml).unwrap();

        let options = SlideshowOptions::from_settings(&settings).unwrap();
        assert_eq!(options.profile, ProfileName::Dvd);
        assert_eq!(options.title, "Summer");
        assert_eq!(options.epilog, "Thanks");
        assert_eq!(options.output, PathBuf::from("summer"));
        assert!(!options.remove_tempfiles);
        assert_eq!(options.video_options().profile.fps, 30);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let err = SlideshowOptions::default().with_profile("8k").unwrap_err();
        assert!(matches!(err, SlideshowError::UnknownProfile(_)));
        let ok = SlideshowOptions::default().with_profile("UHD").unwrap();
        assert_eq!(ok.profile, ProfileName::Uhd);
    }

    #[test]
    fn zero_durations_are_invalid() {
        let options = SlideshowOptions {
            transition_duration: 0,
            ..SlideshowOptions::default()
        };
        assert!(matches!(
            options.validate(),
            Err(SlideshowError::InvalidOptions(_))
        ));
    }
}
