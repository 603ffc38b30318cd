//! Resolving user input entries into image and audio file lists.
//!
//! An entry is one of:
//! - a file, kept when it is a supported image/audio file
//! - a directory, contributing its direct children
//! - `+dir`, searched recursively
//! - `@list.txt`, one entry per line (blank lines ignored, `+` allowed)
//!
//! Directory contents are sorted by path so a show is reproducible.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use walkdir::WalkDir;

/// Audio file extensions accepted as input (lowercase, without dot).
pub const AUDIO_EXTENSIONS: [&str; 5] = ["wav", "ogg", "mp3", "m4a", "aac"];

/// Errors while resolving input entries.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

pub type SourceResult<T> = Result<T, SourceError>;

/// What kind of media an entry list is resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    /// Whether `path` is an accepted file of this kind.
    pub fn accepts(&self, path: &Path) -> bool {
        match self {
            MediaKind::Image => is_image(path),
            MediaKind::Audio => is_audio(path),
        }
    }
}

/// Whether the file content sniffs as TIFF, JPEG, BMP or PNG.
///
/// The extension is ignored; only the header decides.
pub fn is_image(path: &Path) -> bool {
    let format = File::open(path)
        .and_then(|file| ImageReader::new(BufReader::new(file)).with_guessed_format())
        .ok()
        .and_then(|reader| reader.format());
    matches!(
        format,
        Some(ImageFormat::Tiff | ImageFormat::Jpeg | ImageFormat::Bmp | ImageFormat::Png)
    )
}

/// Whether the file extension names a supported audio format.
pub fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.as_str()))
}

/// Resolve image entries into files, in entry order.
pub fn collect_images(entries: &[String]) -> SourceResult<Vec<PathBuf>> {
    collect(entries, MediaKind::Image)
}

/// Resolve audio entries into files, in entry order.
pub fn collect_audio(entries: &[String]) -> SourceResult<Vec<PathBuf>> {
    collect(entries, MediaKind::Audio)
}

/// Resolve entries of `kind`.
pub fn collect(entries: &[String], kind: MediaKind) -> SourceResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in entries {
        match entry.strip_prefix('@') {
            Some(list) => {
                for line in read_list(Path::new(list))? {
                    resolve_entry(&line, kind, &mut files)?;
                }
            }
            None => resolve_entry(entry, kind, &mut files)?,
        }
    }
    Ok(files)
}

/// Read a `@` value from its file, or return the value unchanged.
///
/// Used for title and epilog text.
pub fn read_text_arg(value: &str) -> SourceResult<String> {
    match value.strip_prefix('@') {
        Some(file) => fs::read_to_string(file)
            .map(|text| text.trim_end_matches(['\r', '\n']).to_string())
            .map_err(|source| SourceError::Io {
                path: PathBuf::from(file),
                source,
            }),
        None => Ok(value.to_string()),
    }
}

fn read_list(path: &Path) -> SourceResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

fn resolve_entry(entry: &str, kind: MediaKind, files: &mut Vec<PathBuf>) -> SourceResult<()> {
    let (recursive, raw) = match entry.strip_prefix('+') {
        Some(rest) => (true, rest.trim()),
        None => (false, entry),
    };
    let path = absolute(Path::new(raw));

    if path.is_file() {
        if kind.accepts(&path) {
            files.push(path);
        } else {
            tracing::warn!("Skipping unsupported file {}", path.display());
        }
        return Ok(());
    }

    if !path.is_dir() {
        tracing::warn!("Skipping missing entry {}", path.display());
        return Ok(());
    }

    let max_depth = if recursive { usize::MAX } else { 1 };
    for item in WalkDir::new(&path)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name()
    {
        let item = item.map_err(|source| SourceError::Walk {
            path: path.clone(),
            source,
        })?;
        if item.file_type().is_file() && kind.accepts(item.path()) {
            files.push(item.into_path());
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
