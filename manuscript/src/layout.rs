//! The manuscript directory layout:
//!
//! ```text
//! manuscript/
//!   NN-Chapter Title/
//!     chNN-scMM.md        scene files, optional front matter
//!   header_material.md    optional title page metadata and front text
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::error::ManuscriptError;

/// Title page metadata and front-of-book text, at the manuscript root.
pub const HEADER_FILE: &str = "header_material.md";

static CHAPTER_DIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<num>[0-9]{2})-(?P<title>.+)$").expect("chapter pattern is valid")
});
static CHAPTER_DIR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<num>[0-9]{2})-").expect("prefix pattern is valid"));
static CHAPTER_DIR_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^chapter-(?P<num>[0-9]{2})$").expect("chapter word pattern is valid")
});
static TWO_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<num>[0-9]{2})").expect("digit pattern is valid"));
static SCENE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^ch(?P<ch>[0-9]{2})-sc(?P<sc>[0-9]{2})\.md$").expect("scene pattern is valid")
});

/// How chapter directory names are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// `NN-Title` only.
    Strict,
    /// Also `NN-`, `Chapter-NN`, or any name holding two digits.
    Lenient,
}

#[derive(Debug, Clone)]
pub struct Scene {
    /// Chapter number from the file name, which may differ from its folder's.
    pub chapter: u32,
    pub number: u32,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ChapterDir {
    pub number: u32,
    pub title: String,
    pub path: PathBuf,
    /// Sorted by (chapter, scene, file name).
    pub scenes: Vec<Scene>,
}

/// Match a chapter directory name, returning its number and title.
pub fn parse_chapter_dir(name: &str, naming: Naming) -> Option<(u32, String)> {
    if let Some(caps) = CHAPTER_DIR.captures(name) {
        let number = caps["num"].parse().ok()?;
        return Some((number, caps["title"].trim().to_string()));
    }
    if naming == Naming::Strict {
        return None;
    }
    [&*CHAPTER_DIR_PREFIX, &*CHAPTER_DIR_WORD, &*TWO_DIGITS]
        .into_iter()
        .find_map(|re| re.captures(name))
        .and_then(|caps| caps["num"].parse().ok())
        .map(|number| (number, name.to_string()))
}

/// Match a scene file name, returning (chapter, scene).
pub fn parse_scene_file(name: &str) -> Option<(u32, u32)> {
    let caps = SCENE_FILE.captures(name)?;
    Some((caps["ch"].parse().ok()?, caps["sc"].parse().ok()?))
}

/// Find chapter directories and their scene files under `root`.
///
/// Chapters come back sorted by (number, lowercase title). Entries that don't
/// follow the naming scheme are skipped.
pub fn discover(root: &Path, naming: Naming) -> Result<Vec<ChapterDir>, ManuscriptError> {
    if !root.is_dir() {
        return Err(ManuscriptError::RootNotFound(root.to_path_buf()));
    }

    let mut chapters = Vec::new();
    for path in list_dir(root)? {
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some((number, title)) = parse_chapter_dir(name, naming) else {
            debug!(dir = %path.display(), "not a chapter folder");
            continue;
        };

        let mut scenes = Vec::new();
        for file in list_dir(&path)? {
            let Some(file_name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match parse_scene_file(file_name) {
                Some((chapter, scene)) if file.is_file() => scenes.push(Scene {
                    chapter,
                    number: scene,
                    path: file,
                }),
                _ => debug!(file = %file.display(), "not a scene file"),
            }
        }
        scenes.sort_by(|a, b| {
            (a.chapter, a.number, a.path.file_name()).cmp(&(b.chapter, b.number, b.path.file_name()))
        });

        chapters.push(ChapterDir {
            number,
            title,
            path,
            scenes,
        });
    }

    chapters.sort_by(|a, b| {
        (a.number, a.title.to_lowercase()).cmp(&(b.number, b.title.to_lowercase()))
    });
    Ok(chapters)
}

fn list_dir(dir: &Path) -> Result<Vec<PathBuf>, ManuscriptError> {
    let io_err = |source| ManuscriptError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        paths.push(entry.map_err(io_err)?.path());
    }
    Ok(paths)
}

/// Read a file as UTF-8, dropping invalid byte sequences.
pub fn read_lossy(path: &Path) -> Result<String, ManuscriptError> {
    let bytes = fs::read(path).map_err(|source| ManuscriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            warn!(file = %path.display(), "file is not valid UTF-8; dropping invalid bytes");
            Ok(drop_invalid_utf8(err.as_bytes()))
        }
    }
}

/// Decode `bytes`, skipping invalid sequences. Valid U+FFFD characters are kept.
fn drop_invalid_utf8(mut bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                out.push_str(valid);
                return out;
            }
            Err(err) => {
                let (valid, rest) = bytes.split_at(err.valid_up_to());
                // `valid` was just checked.
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // Truncated sequence at the end of input.
                    None => return out,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_chapter_names() {
        assert_eq!(
            parse_chapter_dir("03-The Ferry ", Naming::Strict),
            Some((3, "The Ferry".to_string()))
        );
        assert_eq!(parse_chapter_dir("3-The Ferry", Naming::Strict), None);
        assert_eq!(parse_chapter_dir("Chapter-03", Naming::Strict), None);
    }

    #[test]
    fn lenient_chapter_names() {
        assert_eq!(
            parse_chapter_dir("Chapter-07", Naming::Lenient),
            Some((7, "Chapter-07".to_string()))
        );
        assert_eq!(
            parse_chapter_dir("draft 12 old", Naming::Lenient),
            Some((12, "draft 12 old".to_string()))
        );
        assert_eq!(parse_chapter_dir("notes", Naming::Lenient), None);
    }

    #[test]
    fn invalid_bytes_are_dropped_but_replacement_chars_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ch01-sc01.md");
        let mut bytes = b"Rain\xff fell \xe2\x80 on ".to_vec();
        bytes.extend_from_slice("\u{fffd} the gate".as_bytes());
        // A sequence cut off at the end of the file.
        bytes.extend_from_slice(b"\xf0\x9f");
        std::fs::write(&path, &bytes).unwrap();

        let text = read_lossy(&path).unwrap();
        assert_eq!(text, "Rain fell  on \u{fffd} the gate");
        assert_eq!(crate::words::count_words(&text), 5);
    }

    #[test]
    fn scene_names() {
        assert_eq!(parse_scene_file("ch01-sc02.md"), Some((1, 2)));
        assert_eq!(parse_scene_file("CH01-SC10.MD"), Some((1, 10)));
        assert_eq!(parse_scene_file("ch1-sc2.md"), None);
        assert_eq!(parse_scene_file("ch01-sc02.md.bak"), None);
    }
}
