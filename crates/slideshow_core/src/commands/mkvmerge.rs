//! mkvmerge option files and invocations.
//!
//! Concatenations are passed through an option file (`mkvmerge @file`), one
//! token per line, so long segment lists never hit command-line limits.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::Timecode;
use crate::pipeline::{StepError, StepResult};
use crate::tools::{Executables, Invocation, Tool};

/// Builder for the tokens of an mkvmerge option file.
#[derive(Debug, Clone, Default)]
pub struct OptionFileBuilder {
    output: PathBuf,
    title: Option<String>,
    global_tags: Option<PathBuf>,
    aac_is_sbr: bool,
    segments: Vec<PathBuf>,
}

impl OptionFileBuilder {
    /// Start a file writing to `output`.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    /// Container title; empty titles are skipped.
    pub fn title(mut self, title: &str) -> Self {
        if !title.is_empty() {
            self.title = Some(title.to_string());
        }
        self
    }

    /// Embed a global tags XML file.
    pub fn global_tags(mut self, tags: impl Into<PathBuf>) -> Self {
        self.global_tags = Some(tags.into());
        self
    }

    /// Flag every segment as HE-AAC (spectral band replication).
    pub fn aac_is_sbr(mut self) -> Self {
        self.aac_is_sbr = true;
        self
    }

    /// Segments in playback order; all but the first are appended.
    pub fn segments(mut self, segments: impl IntoIterator<Item = PathBuf>) -> Self {
        self.segments.extend(segments);
        self
    }

    /// Build the token list.
    ///
    /// The option file is UTF-8, so every path must be valid UTF-8.
    pub fn build(&self) -> StepResult<Vec<String>> {
        let mut tokens = vec!["-o".to_string(), portable(&self.output)?];

        if let Some(ref title) = self.title {
            tokens.push("--title".to_string());
            tokens.push(title.clone());
        }

        if let Some(ref tags) = self.global_tags {
            tokens.push("--global-tags".to_string());
            tokens.push(portable(tags)?);
        }

        for (i, segment) in self.segments.iter().enumerate() {
            if self.aac_is_sbr {
                tokens.push("--aac-is-sbr".to_string());
                tokens.push("1".to_string());
            }
            let path = portable(segment)?;
            tokens.push(if i == 0 { path } else { format!("+{}", path) });
        }

        Ok(tokens)
    }

    /// Write the option file and return the `mkvmerge @file` invocation.
    pub fn write(&self, exes: &Executables, options_path: &Path) -> StepResult<Invocation> {
        if self.segments.is_empty() {
            return Err(StepError::precondition_failed(
                "mkvmerge option file has no segments",
            ));
        }
        let mut content = self.build()?.join("\n");
        content.push('\n');
        fs::write(options_path, content)
            .map_err(|e| StepError::io_error("writing mkvmerge option file", e))?;
        let mut arg = OsString::from("@");
        arg.push(options_path);
        Ok(Invocation::new(exes, Tool::Mkvmerge).arg(arg))
    }
}

/// Forward slashes only; mkvmerge option files treat `\` as an escape.
fn portable(path: &Path) -> StepResult<String> {
    path.to_str()
        .map(|p| p.replace('\\', "/"))
        .ok_or_else(|| {
            StepError::invalid_input(format!(
                "Path is not valid UTF-8 and cannot go into an mkvmerge option file: {}",
                path.display()
            ))
        })
}

/// Concatenate `file` with itself.
pub fn double(exes: &Executables, file: &Path, out: &Path) -> Invocation {
    Invocation::new(exes, Tool::Mkvmerge)
        .arg("-o")
        .path(out)
        .path(file)
        .arg("+")
        .path(file)
}

/// Split `file` at `at`; `out_pattern` contains `%02d` for the part number.
pub fn split_at(exes: &Executables, file: &Path, at: Timecode, out_pattern: &Path) -> Invocation {
    Invocation::new(exes, Tool::Mkvmerge)
        .arg("-o")
        .path(out_pattern)
        .arg("--split")
        .arg(format!("timecodes:{}", at))
        .path(file)
}

/// Merge a video and an audio container into `out`.
pub fn merge(exes: &Executables, video: &Path, audio: &Path, out: &Path) -> Invocation {
    Invocation::new(exes, Tool::Mkvmerge)
        .arg("-o")
        .path(out)
        .path(video)
        .path(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn movies(n: u32) -> Vec<PathBuf> {
        (1..=n)
            .map(|i| PathBuf::from(format!("/w/movies/mov-pic-{:06}.mp4", i)))
            .collect()
    }

    #[test]
    fn video_option_file_layout() {
        let tokens = OptionFileBuilder::new("/w/video_only.mkv")
            .title("Holiday")
            .global_tags("/w/tags.xml")
            .segments(movies(3))
            .build()
            .unwrap();

        assert_eq!(
            tokens,
            vec![
                "-o",
                "/w/video_only.mkv",
                "--title",
                "Holiday",
                "--global-tags",
                "/w/tags.xml",
                "/w/movies/mov-pic-000001.mp4",
                "+/w/movies/mov-pic-000002.mp4",
                "+/w/movies/mov-pic-000003.mp4",
            ]
        );
    }

    #[test]
    fn empty_title_is_omitted() {
        let tokens = OptionFileBuilder::new("out.mkv")
            .title("")
            .segments(movies(1))
            .build()
            .unwrap();
        assert!(!tokens.contains(&"--title".to_string()));
    }

    #[test]
    fn audio_segments_carry_sbr_flag() {
        let tokens = OptionFileBuilder::new("audio_only.mkv")
            .aac_is_sbr()
            .segments(vec![PathBuf::from("audio-001.aac"), PathBuf::from("audio-002.aac")])
            .build()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                "-o",
                "audio_only.mkv",
                "--aac-is-sbr",
                "1",
                "audio-001.aac",
                "--aac-is-sbr",
                "1",
                "+audio-002.aac",
            ]
        );
    }

    #[test]
    fn backslashes_become_slashes() {
        let tokens = OptionFileBuilder::new(r"C:\show\out.mkv")
            .segments(vec![PathBuf::from(r"C:\show\a.mp4")])
            .build()
            .unwrap();
        assert_eq!(tokens[1], "C:/show/out.mkv");
        assert_eq!(tokens[2], "C:/show/a.mp4");
    }

    #[test]
    fn writes_option_file() {
        let dir = tempdir().unwrap();
        let opts = dir.path().join("video_only.txt");
        let inv = OptionFileBuilder::new(dir.path().join("out.mkv"))
            .segments(movies(2))
            .write(&Executables::default(), &opts)
            .unwrap();

        assert!(inv.arg_strings()[0].starts_with('@'));
        let content = fs::read_to_string(&opts).unwrap();
        assert_eq!(content.lines().count(), 4);
        assert!(content.ends_with("+/w/movies/mov-pic-000002.mp4\n"));
    }

    #[test]
    fn refuses_empty_segment_list() {
        let dir = tempdir().unwrap();
        let result = OptionFileBuilder::new("out.mkv")
            .write(&Executables::default(), &dir.path().join("o.txt"));
        assert!(matches!(result, Err(StepError::PreconditionFailed(_))));
    }

    #[test]
    fn split_uses_timecode() {
        let inv = split_at(
            &Executables::default(),
            Path::new("audio-03.mkv"),
            Timecode::from_secs(30.0),
            Path::new("audio-cut-%02d.mkv"),
        );
        assert_eq!(
            inv.arg_strings(),
            vec![
                "-o",
                "audio-cut-%02d.mkv",
                "--split",
                "timecodes:00:00:30.0000",
                "audio-03.mkv"
            ]
        );
    }

    #[test]
    fn double_appends_file_to_itself() {
        let inv = double(&Executables::default(), Path::new("a.mkv"), Path::new("audio-01.mkv"));
        assert_eq!(inv.arg_strings(), vec!["-o", "audio-01.mkv", "a.mkv", "+", "a.mkv"]);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_segment_is_invalid_input() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let segment = dir.path().join(OsStr::from_bytes(b"mov-\xff.mp4"));
        let builder = OptionFileBuilder::new(dir.path().join("out.mkv")).segments(vec![segment]);

        assert!(matches!(builder.build(), Err(StepError::InvalidInput(_))));
        let opts = dir.path().join("o.txt");
        assert!(matches!(
            builder.write(&Executables::default(), &opts),
            Err(StepError::InvalidInput(_))
        ));
        assert!(!opts.exists());
    }
}
