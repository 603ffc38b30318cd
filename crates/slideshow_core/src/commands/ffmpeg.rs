//! ffmpeg invocations and parsing of its diagnostic output.

use std::path::Path;

use crate::models::slots::MORPH_FRAME_PATTERN;
use crate::models::Timecode;
use crate::pipeline::{StepError, StepResult};
use crate::tools::{Executables, Invocation, Tool};

/// Seconds each fade lasts.
pub const FADE_SECONDS: u32 = 2;

/// Encode a looped still image into a clip of `seconds`.
///
/// `overwrite` adds `-y`, used for the intermediate clips that get a fade pass.
pub fn still_clip(
    exes: &Executables,
    picture: &Path,
    seconds: u32,
    fps: u32,
    overwrite: bool,
    out: &Path,
) -> Invocation {
    let mut inv = Invocation::new(exes, Tool::Ffmpeg)
        .args(["-loop", "1", "-i"])
        .path(picture)
        .args(["-c:v", "libx264", "-t"])
        .arg(seconds.to_string())
        .arg("-r")
        .arg(fps.to_string());
    if overwrite {
        inv = inv.arg("-y");
    }
    inv.args(["-pix_fmt", "yuv420p"]).path(out)
}

/// Second pass fading in over the first two seconds.
pub fn fade_in(exes: &Executables, input: &Path, fps: u32, out: &Path) -> Invocation {
    fade(exes, input, format!("fade=in:0:{}", fps * FADE_SECONDS), out)
}

/// Second pass fading out, starting after `image_duration` seconds.
pub fn fade_out(
    exes: &Executables,
    input: &Path,
    image_duration: u32,
    fps: u32,
    out: &Path,
) -> Invocation {
    let begin = image_duration * fps;
    fade(
        exes,
        input,
        format!("fade=out:{}:{}", begin, fps * FADE_SECONDS),
        out,
    )
}

fn fade(exes: &Executables, input: &Path, filter: String, out: &Path) -> Invocation {
    Invocation::new(exes, Tool::Ffmpeg)
        .arg("-i")
        .path(input)
        .args(["-y", "-vf"])
        .arg(filter)
        .path(out)
}

/// Encode the numbered frames in `morph_dir` into a clip.
pub fn transition_clip(exes: &Executables, morph_dir: &Path, fps: u32, out: &Path) -> Invocation {
    Invocation::new(exes, Tool::Ffmpeg)
        .arg("-r")
        .arg(fps.to_string())
        .arg("-i")
        .path(&morph_dir.join(MORPH_FRAME_PATTERN))
        .args(["-c:v", "libx264", "-vf"])
        .arg(format!("fps={},format=yuv420p", fps))
        .path(out)
}

/// Transcode any audio input to AAC at 256k.
pub fn transcode_aac(exes: &Executables, input: &Path, out: &Path) -> Invocation {
    Invocation::new(exes, Tool::Ffmpeg)
        .arg("-i")
        .path(input)
        .args(["-c:a", "aac", "-strict", "-2", "-b:a", "256k"])
        .path(out)
}

/// `ffmpeg -i <file>`; exits non-zero but prints stream info to stderr.
pub fn probe(exes: &Executables, file: &Path) -> Invocation {
    Invocation::new(exes, Tool::Ffmpeg).arg("-i").path(file)
}

/// Extract the duration in seconds from `ffmpeg -i` diagnostics.
///
/// Expects a line such as `  Duration: 00:03:25.46, start: 0.000000, ...`.
pub fn parse_duration(diagnostics: &str) -> StepResult<f64> {
    let line = diagnostics
        .lines()
        .find(|l| l.contains("Duration"))
        .ok_or_else(|| StepError::parse_error("duration", "no Duration line in ffmpeg output"))?;

    let token = line
        .split(',')
        .next()
        .and_then(|head| head.split_whitespace().nth(1))
        .ok_or_else(|| StepError::parse_error("duration", format!("malformed line '{}'", line.trim())))?;

    Timecode::parse(token)
        .map(|tc| tc.as_secs())
        .ok_or_else(|| StepError::parse_error("duration", format!("invalid timecode '{}'", token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROBE: &str = "\
Input #0, matroska,webm, from 'video_only.mkv':
  Metadata:
    COMMENT         : Created with the slideshow maker.
  Duration: 00:01:02.50, start: 0.000000, bitrate: 1805 kb/s
    Stream #0:0: Video: h264 (High), yuv420p, 1920x1080, 60 fps
At least one output file must be specified
";

    #[test]
    fn parses_duration_line() {
        assert_eq!(parse_duration(PROBE).unwrap(), 62.5);
    }

    #[test]
    fn missing_duration_is_error() {
        let err = parse_duration("no such file").unwrap_err();
        assert!(matches!(err, StepError::ParseError { .. }));
    }

    #[test]
    fn unavailable_duration_is_error() {
        assert!(parse_duration("  Duration: N/A, bitrate: N/A").is_err());
    }

    #[test]
    fn still_clip_arguments() {
        let inv = still_clip(
            &Executables::default(),
            Path::new("pic-000003.jpg"),
            5,
            60,
            false,
            Path::new("mov-pic-000003.mp4"),
        );
        assert_eq!(
            inv.arg_strings(),
            vec![
                "-loop", "1", "-i", "pic-000003.jpg", "-c:v", "libx264", "-t", "5", "-r", "60",
                "-pix_fmt", "yuv420p", "mov-pic-000003.mp4"
            ]
        );
    }

    #[test]
    fn fades_span_two_seconds() {
        let exes = Executables::default();
        let fin = fade_in(&exes, Path::new("first.mp4"), 30, Path::new("out.mp4"));
        assert!(fin.arg_strings().contains(&"fade=in:0:60".to_string()));

        let fout = fade_out(&exes, Path::new("last.mp4"), 5, 30, Path::new("out.mp4"));
        assert!(fout.arg_strings().contains(&"fade=out:150:60".to_string()));
    }

    #[test]
    fn transition_reads_frame_pattern() {
        let inv = transition_clip(
            &Executables::default(),
            Path::new("morph-000002"),
            60,
            Path::new("mov-pic-000002.mp4"),
        );
        assert_eq!(inv.arg_strings()[0..2], ["-r".to_string(), "60".to_string()]);
        assert!(inv.arg_strings()[3].ends_with("%03d.jpg"));
        assert!(inv.arg_strings().contains(&"fps=60,format=yuv420p".to_string()));
    }
}
