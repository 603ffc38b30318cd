//! Timecodes in the `HH:MM:SS.ffff` form mkvmerge understands.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A non-negative duration printable as a merge-tool timecode.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Timecode {
    seconds: f64,
}

impl Timecode {
    /// Create from seconds; negative values clamp to zero.
    pub fn from_secs(seconds: f64) -> Self {
        Self {
            seconds: seconds.max(0.0),
        }
    }

    pub fn as_secs(&self) -> f64 {
        self.seconds
    }

    /// Parse `HH:MM:SS[.fraction]` as printed by ffmpeg.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().split(':');
        let hours: u64 = parts.next()?.parse().ok()?;
        let minutes: u64 = parts.next()?.parse().ok()?;
        let seconds: f64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        Some(Self::from_secs(
            (hours * 3600 + minutes * 60) as f64 + seconds,
        ))
    }

    /// Hours, minutes and seconds of the value rounded to `decimals` places.
    ///
    /// Rounding first keeps carries out of the seconds field (59.6 s is one minute).
    fn split(&self, decimals: i32) -> (u64, u64, f64) {
        let scale = 10f64.powi(decimals);
        let rounded = (self.seconds * scale).round() / scale;
        let whole = rounded.trunc() as u64;
        let hours = whole / 3600;
        let minutes = (whole % 3600) / 60;
        let seconds = rounded - (hours * 3600 + minutes * 60) as f64;
        (hours, minutes, seconds)
    }

    /// Whole-second form `HH:MM:SS`, used for run-time reports.
    pub fn whole_seconds(&self) -> String {
        let (hours, minutes, seconds) = self.split(0);
        format!("{:02}:{:02}:{:02.0}", hours, minutes, seconds)
    }
}

impl From<Duration> for Timecode {
    fn from(d: Duration) -> Self {
        Self::from_secs(d.as_secs_f64())
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (hours, minutes, seconds) = self.split(4);
        write!(f, "{:02}:{:02}:{:07.4}", hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_four_decimals() {
        assert_eq!(Timecode::from_secs(30.0).to_string(), "00:00:30.0000");
        assert_eq!(Timecode::from_secs(3725.5).to_string(), "01:02:05.5000");
        assert_eq!(Timecode::from_secs(0.25).to_string(), "00:00:00.2500");
    }

    #[test]
    fn whole_second_form() {
        assert_eq!(Timecode::from_secs(61.2).whole_seconds(), "00:01:01");
        assert_eq!(Timecode::from_secs(7322.0).whole_seconds(), "02:02:02");
    }

    #[test]
    fn rounding_carries_into_minutes() {
        assert_eq!(Timecode::from_secs(59.6).whole_seconds(), "00:01:00");
        assert_eq!(Timecode::from_secs(3599.5).whole_seconds(), "01:00:00");
        assert_eq!(Timecode::from_secs(59.4).whole_seconds(), "00:00:59");
        assert_eq!(Timecode::from_secs(59.99996).to_string(), "00:01:00.0000");
    }

    #[test]
    fn parses_ffmpeg_durations() {
        let tc = Timecode::parse("00:03:25.46").unwrap();
        assert!((tc.as_secs() - 205.46).abs() < 1e-9);
        assert_eq!(Timecode::parse("01:00:00").unwrap().as_secs(), 3600.0);
        assert!(Timecode::parse("N/A").is_none());
        assert!(Timecode::parse("00:00").is_none());
        assert!(Timecode::parse("1:2:3:4").is_none());
    }

    #[test]
    fn negative_clamps_to_zero() {
        assert_eq!(Timecode::from_secs(-3.0).as_secs(), 0.0);
    }

    #[test]
    fn from_duration() {
        let tc = Timecode::from(Duration::from_millis(1500));
        assert_eq!(tc.to_string(), "00:00:01.5000");
    }
}
