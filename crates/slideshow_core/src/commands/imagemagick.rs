//! ImageMagick invocations: normalize, collage, text, resize, morph.

use std::path::{Path, PathBuf};

use crate::models::slots::MORPH_FRAME_PATTERN;
use crate::models::Profile;
use crate::tools::{Executables, Invocation, Tool};

/// Font and colors used for rendered text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextStyle {
    pub font: String,
    pub pointsize: u32,
    pub fill: String,
    pub background: String,
}

/// `convert <src> -auto-orient <dest>`
pub fn auto_orient(exes: &Executables, src: &Path, dest: &Path) -> Invocation {
    Invocation::new(exes, Tool::Convert)
        .path(src)
        .arg("-auto-orient")
        .path(dest)
}

/// Tile pictures two per row into a collage at half profile size.
pub fn montage(
    exes: &Executables,
    profile: &Profile,
    pictures: &[PathBuf],
    background: &str,
    out: &Path,
) -> Invocation {
    let mut inv = Invocation::new(exes, Tool::Montage).args(["-tile", "2x"]);
    for pic in pictures {
        inv = inv.path(pic);
    }
    inv.arg("-geometry")
        .arg(profile.montage_geometry())
        .arg("-background")
        .arg(background)
        .path(out)
}

/// Draw `title` centered over `input`.
pub fn draw_title(
    exes: &Executables,
    input: &Path,
    title: &str,
    style: &TextStyle,
    out: &Path,
) -> Invocation {
    Invocation::new(exes, Tool::Convert)
        .path(input)
        .args(["-gravity", "center", "-font"])
        .arg(style.font.as_str())
        .arg("-pointsize")
        .arg(style.pointsize.to_string())
        .arg("-fill")
        .arg(style.fill.as_str())
        .arg("-draw")
        .arg(format!("text 0,0 '{}'", title.replace('\'', "\\'")))
        .path(out)
}

/// Render a text block at full profile size.
pub fn label(
    exes: &Executables,
    profile: &Profile,
    text: &str,
    style: &TextStyle,
    out: &Path,
) -> Invocation {
    Invocation::new(exes, Tool::Convert)
        .arg("-size")
        .arg(profile.size())
        .arg("-background")
        .arg(style.background.as_str())
        .arg("-fill")
        .arg(style.fill.as_str())
        .arg("-font")
        .arg(style.font.as_str())
        .arg("-pointsize")
        .arg(style.pointsize.to_string())
        .args(["-gravity", "center"])
        .arg(format!("label:{}", text))
        .path(out)
}

/// Resize in place to the profile, padding with `background`.
pub fn resize(exes: &Executables, profile: &Profile, background: &str, pic: &Path) -> Invocation {
    let size = profile.size();
    Invocation::new(exes, Tool::Mogrify)
        .arg("-resize")
        .arg(size.as_str())
        .arg("-background")
        .arg(background)
        .args(["-gravity", "center", "-extent"])
        .arg(size)
        .path(pic)
}

/// Write `frames` in-between images from `from` to `to` into `dir`.
pub fn morph(exes: &Executables, from: &Path, to: &Path, frames: u32, dir: &Path) -> Invocation {
    Invocation::new(exes, Tool::Convert)
        .path(from)
        .path(to)
        .arg("-morph")
        .arg(frames.to_string())
        .path(&dir.join(MORPH_FRAME_PATTERN))
}
