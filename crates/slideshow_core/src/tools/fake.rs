//! Scripted stand-in for ImageMagick, ffmpeg and mkvmerge.
//!
//! Each emulated tool creates the files the real one would. Media files are
//! plain text holding `duration=<seconds>`, so durations survive copies,
//! concatenation and splitting and can be probed like real containers.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::models::Timecode;
use crate::pipeline::StepResult;

use super::executables::Tool;
use super::runner::{Invocation, ToolOutput, ToolRunner};

pub const FONT_LISTING: &str = "  Font: DejaVu-Sans\n  Font: DejaVu-Sans-Book\n";

/// Write a fake media file of the given duration.
pub fn write_media(path: &Path, seconds: f64) {
    fs::write(path, format!("duration={}\n", seconds)).unwrap();
}

/// Duration stored in a fake media file.
pub fn read_duration(path: &Path) -> Option<f64> {
    fs::read_to_string(path)
        .ok()?
        .lines()
        .find_map(|l| l.strip_prefix("duration="))
        .and_then(|v| v.trim().parse().ok())
}

#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    option_files: Mutex<Vec<Vec<String>>>,
    fail: Option<Tool>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call of `tool` exits with code 2.
    pub fn failing(tool: Tool) -> Self {
        Self {
            fail: Some(tool),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn calls_of(&self, tool: Tool) -> Vec<Invocation> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.tool == tool)
            .cloned()
            .collect()
    }

    /// Token lists of every `@file` handed to mkvmerge, in call order.
    pub fn option_files(&self) -> Vec<Vec<String>> {
        self.option_files.lock().clone()
    }

    fn convert(&self, args: &[String]) -> ToolOutput {
        if args.first().map(String::as_str) == Some("-list") {
            return ok(FONT_LISTING);
        }
        if let Some(pos) = args.iter().position(|a| a == "-morph") {
            let frames: usize = args[pos + 1].parse().unwrap();
            let pattern = PathBuf::from(args.last().unwrap());
            let dir = pattern.parent().unwrap();
            for i in 0..frames + 2 {
                fs::write(dir.join(format!("{:03}.jpg", i)), "frame").unwrap();
            }
            return ok("");
        }
        for input in args.iter().filter(|a| a.ends_with(".jpg") && Some(*a) != args.last()) {
            if !Path::new(input).exists() {
                return failed(&format!("convert: unable to open image '{}'", input));
            }
        }
        write_image(args.last().unwrap());
        ok("")
    }

    fn ffmpeg(&self, args: &[String]) -> ToolOutput {
        if args.len() == 2 && args[0] == "-i" {
            let mut out = ToolOutput {
                exit_code: 1,
                stderr: "At least one output file must be specified\n".to_string(),
                ..ToolOutput::default()
            };
            if let Some(d) = read_duration(Path::new(&args[1])) {
                out.stderr = format!(
                    "Input #0, matroska,webm, from '{}':\n  Duration: {}, start: 0.000000, bitrate: 2 kb/s\n{}",
                    args[1],
                    Timecode::from_secs(d),
                    out.stderr
                );
            }
            return out;
        }

        let value_of = |flag: &str| {
            args.iter()
                .position(|a| a == flag)
                .and_then(|p| args.get(p + 1))
        };
        let output = args.last().unwrap();
        let duration = if let Some(t) = value_of("-t") {
            t.parse().unwrap()
        } else {
            let input = value_of("-i").unwrap();
            if input.contains("%03d") {
                let dir = Path::new(input).parent().unwrap();
                let frames = fs::read_dir(dir).unwrap().count() as f64;
                let rate: f64 = value_of("-r").map(|r| r.parse().unwrap()).unwrap_or(25.0);
                frames / rate
            } else {
                match read_duration(Path::new(input)) {
                    Some(d) => d,
                    None => return failed(&format!("{}: No such file or directory", input)),
                }
            }
        };
        write_media(Path::new(output), duration);
        ok("")
    }

    fn mkvmerge(&self, args: &[String]) -> ToolOutput {
        let tokens = match args.first().and_then(|a| a.strip_prefix('@')) {
            Some(file) => {
                let tokens: Vec<String> = fs::read_to_string(file)
                    .unwrap()
                    .lines()
                    .map(str::to_string)
                    .collect();
                self.option_files.lock().push(tokens.clone());
                tokens
            }
            None => args.to_vec(),
        };

        let mut output = None;
        let mut split = None;
        let mut groups: Vec<f64> = Vec::new();
        let mut append_next = false;
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            match token.as_str() {
                "-o" => output = iter.next().cloned(),
                "--split" => split = iter.next().cloned(),
                "--global-tags" => {
                    let tags = iter.next().unwrap();
                    if !Path::new(tags).exists() {
                        return failed(&format!("Error: The file '{}' could not be opened", tags));
                    }
                }
                "--title" | "--aac-is-sbr" => {
                    iter.next();
                }
                "+" => append_next = true,
                other => {
                    let (path, appended) = match other.strip_prefix('+') {
                        Some(p) => (p, true),
                        None => (other, append_next),
                    };
                    append_next = false;
                    let Some(d) = read_duration(Path::new(path)) else {
                        return failed(&format!("Error: The file '{}' could not be opened", path));
                    };
                    match groups.last_mut() {
                        Some(last) if appended => *last += d,
                        _ => groups.push(d),
                    }
                }
            }
        }

        let output = output.unwrap();
        let total = groups.iter().cloned().fold(0.0, f64::max);
        match split {
            Some(at) => {
                let tc = Timecode::parse(at.strip_prefix("timecodes:").unwrap()).unwrap();
                write_media(Path::new(&output.replace("%02d", "01")), tc.as_secs().min(total));
                if total > tc.as_secs() {
                    write_media(
                        Path::new(&output.replace("%02d", "02")),
                        total - tc.as_secs(),
                    );
                }
            }
            None => write_media(Path::new(&output), total),
        }
        ok("")
    }
}

impl ToolRunner for FakeRunner {
    fn output(&self, invocation: &Invocation) -> StepResult<ToolOutput> {
        self.calls.lock().push(invocation.clone());
        if self.fail == Some(invocation.tool) {
            return Ok(ToolOutput {
                exit_code: 2,
                stderr: format!("{} exploded", invocation.tool),
                ..ToolOutput::default()
            });
        }

        let args = &invocation.arg_strings();
        Ok(match invocation.tool {
            Tool::Convert => self.convert(args),
            Tool::Montage => {
                write_image(args.last().unwrap());
                ok("")
            }
            Tool::Mogrify => {
                if Path::new(args.last().unwrap()).exists() {
                    ok("")
                } else {
                    failed("mogrify: unable to open image")
                }
            }
            Tool::Ffmpeg => self.ffmpeg(args),
            Tool::Mkvmerge => self.mkvmerge(args),
        })
    }
}

fn write_image(path: &str) {
    fs::write(path, "image").unwrap();
}

fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        exit_code: 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

fn failed(stderr: &str) -> ToolOutput {
    ToolOutput {
        exit_code: 2,
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
