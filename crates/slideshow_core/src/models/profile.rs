//! Output profiles (resolution, frame rate, font size).

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Concrete output parameters for a show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Point size for title and epilog text.
    pub fontsize: u32,
}

impl Profile {
    pub const fn new(width: u32, height: u32, fps: u32, fontsize: u32) -> Self {
        Self {
            width,
            height,
            fps,
            fontsize,
        }
    }

    /// Width of one tile in the title collage.
    pub fn montage_width(&self) -> u32 {
        self.width / 2
    }

    /// Height of one tile in the title collage.
    pub fn montage_height(&self) -> u32 {
        self.height / 2
    }

    /// Full frame size as `WxH`.
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// Collage tile geometry as `WxH+10+50`.
    pub fn montage_geometry(&self) -> String {
        format!("{}x{}+10+50", self.montage_width(), self.montage_height())
    }

    /// Number of in-between frames for a transition of `seconds`.
    ///
    /// The two pictures being morphed are the frames either side of the
    /// sequence, hence the `- 2`. Saturates at zero.
    pub fn morph_frames(&self, seconds: u32) -> u32 {
        (self.fps * seconds).saturating_sub(2)
    }
}

/// Named profiles selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProfileName {
    /// 720x576 at 30 Hz.
    Dvd,
    /// 1280x720 at 60 Hz.
    Hd720,
    /// 1920x1080 at 60 Hz.
    #[default]
    Hd1080,
    /// 3840x2160 at 60 Hz.
    Uhd,
    /// 4096x2304 at 60 Hz.
    FourK,
}

impl ProfileName {
    /// Every profile, in ascending resolution.
    pub const ALL: [ProfileName; 5] = [
        ProfileName::Dvd,
        ProfileName::Hd720,
        ProfileName::Hd1080,
        ProfileName::Uhd,
        ProfileName::FourK,
    ];

    /// Key used on the command line and in buildfiles.
    pub fn key(&self) -> &'static str {
        match self {
            ProfileName::Dvd => "dvd",
            ProfileName::Hd720 => "720p",
            ProfileName::Hd1080 => "1080p",
            ProfileName::Uhd => "uhd",
            ProfileName::FourK => "4k",
        }
    }

    /// Resolve to concrete parameters.
    pub fn profile(&self) -> Profile {
        match self {
            ProfileName::Dvd => Profile::new(720, 576, 30, 48),
            ProfileName::Hd720 => Profile::new(1280, 720, 60, 80),
            ProfileName::Hd1080 => Profile::new(1920, 1080, 60, 80),
            ProfileName::Uhd => Profile::new(3840, 2160, 60, 80),
            ProfileName::FourK => Profile::new(4096, 2304, 60, 80),
        }
    }
}

impl std::fmt::Display for ProfileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Error for unknown profile names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown profile '{0}' (expected one of: dvd, 720p, 1080p, uhd, 4k)")]
pub struct UnknownProfile(pub String);

impl FromStr for ProfileName {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        ProfileName::ALL
            .into_iter()
            .find(|p| p.key() == lower)
            .ok_or_else(|| UnknownProfile(s.to_string()))
    }
}

impl TryFrom<String> for ProfileName {
    type Error = UnknownProfile;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ProfileName> for String {
    fn from(name: ProfileName) -> Self {
        name.key().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("1080P".parse::<ProfileName>().unwrap(), ProfileName::Hd1080);
        assert_eq!("DVD".parse::<ProfileName>().unwrap(), ProfileName::Dvd);
        assert_eq!("4k".parse::<ProfileName>().unwrap(), ProfileName::FourK);
        assert!("8k".parse::<ProfileName>().is_err());
    }

    #[test]
    fn montage_is_half_size() {
        let p = ProfileName::Hd1080.profile();
        assert_eq!(p.montage_width(), 960);
        assert_eq!(p.montage_height(), 540);
        assert_eq!(p.montage_geometry(), "960x540+10+50");
        assert_eq!(p.size(), "1920x1080");
    }

    #[test]
    fn dvd_uses_smaller_font() {
        let p = ProfileName::Dvd.profile();
        assert_eq!((p.width, p.height, p.fps, p.fontsize), (720, 576, 30, 48));
    }

    #[test]
    fn morph_frames_subtracts_endpoints() {
        assert_eq!(ProfileName::Hd1080.profile().morph_frames(1), 58);
        assert_eq!(ProfileName::Dvd.profile().morph_frames(2), 58);
        assert_eq!(Profile::new(10, 10, 1, 10).morph_frames(1), 0);
    }

    #[test]
    fn serde_uses_keys() {
        #[derive(Serialize, Deserialize)]
        struct Wrapper {
            profile: ProfileName,
        }
        let parsed: Wrapper = toml::from_str("profile = \"UHD\"").unwrap();
        assert_eq!(parsed.profile, ProfileName::Uhd);
        let out = toml::to_string(&Wrapper {
            profile: ProfileName::Hd720,
        })
        .unwrap();
        assert!(out.contains("\"720p\""));
    }
}
