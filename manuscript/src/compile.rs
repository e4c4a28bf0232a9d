use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ManuscriptError;
use crate::front_matter::{parse_front_matter, strip_front_matter};
use crate::layout::{self, ChapterDir, HEADER_FILE, Naming};
use crate::title_page::TitlePage;
use crate::words::count_words;

/// How each chapter is introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingStyle {
    /// `# Chapter 03: The Ferry`
    #[default]
    Title,
    /// `# Chapter 03`
    Number,
    #[serde(rename = "none")]
    Omit,
}

/// What goes between two scenes of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SceneSeparator {
    /// `***` (`em`)
    #[default]
    Asterisks,
    /// `<hr class="scene-break" />` (`hr`)
    Rule,
    /// Blank lines only (`none`)
    Omit,
    /// Any other string, placed verbatim.
    Literal(String),
}

/// What goes between two chapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterBreak {
    /// `<hr class="chapter-break" />`
    #[default]
    #[serde(rename = "hr")]
    Rule,
    /// `<!-- CHAPTER BREAK -->`, understood by some page-layout tools.
    Page,
    #[serde(rename = "none")]
    Omit,
}

impl HeadingStyle {
    pub fn render(self, chapter: &ChapterDir) -> String {
        match self {
            HeadingStyle::Title => format!("# Chapter {:02}: {}\n\n", chapter.number, chapter.title),
            HeadingStyle::Number => format!("# Chapter {:02}\n\n", chapter.number),
            HeadingStyle::Omit => String::new(),
        }
    }
}

impl SceneSeparator {
    pub fn render(&self) -> String {
        match self {
            SceneSeparator::Asterisks => "\n\n***\n\n".to_string(),
            SceneSeparator::Rule => "\n\n<hr class=\"scene-break\" />\n\n".to_string(),
            SceneSeparator::Omit => String::new(),
            SceneSeparator::Literal(s) => format!("\n\n{}\n\n", s),
        }
    }
}

impl ChapterBreak {
    pub fn render(self) -> &'static str {
        match self {
            ChapterBreak::Rule => "\n\n<hr class=\"chapter-break\" />\n\n",
            ChapterBreak::Page => "\n\n<!-- CHAPTER BREAK -->\n\n",
            ChapterBreak::Omit => "\n\n",
        }
    }
}

impl FromStr for HeadingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" => Ok(HeadingStyle::Title),
            "number" => Ok(HeadingStyle::Number),
            "none" => Ok(HeadingStyle::Omit),
            other => Err(format!(
                "unknown chapter heading style `{}` (expected title, number or none)",
                other
            )),
        }
    }
}

impl FromStr for ChapterBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hr" => Ok(ChapterBreak::Rule),
            "page" => Ok(ChapterBreak::Page),
            "none" => Ok(ChapterBreak::Omit),
            other => Err(format!(
                "unknown chapter break `{}` (expected hr, page or none)",
                other
            )),
        }
    }
}

impl From<String> for SceneSeparator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "em" => SceneSeparator::Asterisks,
            "hr" => SceneSeparator::Rule,
            "none" => SceneSeparator::Omit,
            _ => SceneSeparator::Literal(s),
        }
    }
}

impl From<SceneSeparator> for String {
    fn from(sep: SceneSeparator) -> Self {
        sep.to_string()
    }
}

impl FromStr for SceneSeparator {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SceneSeparator::from(s.to_string()))
    }
}

impl fmt::Display for SceneSeparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneSeparator::Asterisks => write!(f, "em"),
            SceneSeparator::Rule => write!(f, "hr"),
            SceneSeparator::Omit => write!(f, "none"),
            SceneSeparator::Literal(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Include the body of `header_material.md` before the first chapter.
    pub include_header: bool,
    /// Generate a title page from `header_material.md` front matter.
    pub title_page: bool,
    pub chapter_heading: HeadingStyle,
    pub scene_separator: SceneSeparator,
    pub chapter_break: ChapterBreak,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            include_header: true,
            title_page: true,
            chapter_heading: HeadingStyle::default(),
            scene_separator: SceneSeparator::default(),
            chapter_break: ChapterBreak::default(),
        }
    }
}

/// A compiled manuscript.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub text: String,
    /// Words in scene bodies. Headings and the title page don't count.
    pub words: usize,
    /// Chapters that produced output.
    pub chapters: usize,
    /// Scenes with a non-empty body.
    pub scenes: usize,
}

/// Concatenate the manuscript under `root` into one markdown document.
pub fn compile(root: &Path, options: &CompileOptions) -> Result<Compiled, ManuscriptError> {
    let chapters = layout::discover(root, Naming::Strict)?;
    if chapters.is_empty() {
        return Err(ManuscriptError::NoChapters(root.to_path_buf()));
    }

    let mut blocks: Vec<String> = Vec::new();
    let mut words = 0;
    let mut scenes = 0;

    for chapter in &chapters {
        if chapter.scenes.is_empty() {
            debug!(chapter = chapter.number, "chapter has no scenes; skipping");
            continue;
        }

        let mut parts: Vec<String> = Vec::new();
        let heading = options.chapter_heading.render(chapter);
        if !heading.is_empty() {
            parts.push(heading);
        }

        let mut first_scene = true;
        for scene in &chapter.scenes {
            let text = layout::read_lossy(&scene.path)?;
            let body = strip_front_matter(&text).trim();
            if body.is_empty() {
                debug!(scene = %scene.path.display(), "empty scene; skipping");
                continue;
            }
            if !first_scene {
                parts.push(options.scene_separator.render());
            }
            first_scene = false;
            parts.push(format!("{}\n\n", body));
            words += count_words(body);
            scenes += 1;
        }

        if !parts.is_empty() {
            blocks.push(parts.concat());
        }
    }

    let mut out = String::new();

    let header_path = root.join(HEADER_FILE);
    if header_path.is_file() {
        let header = layout::read_lossy(&header_path)?;
        let (meta, body) = parse_front_matter(&header);

        if options.title_page {
            if let Some(meta) = meta.filter(|m| !m.is_empty()) {
                out.push_str(&TitlePage::from_front_matter(&meta).render(words));
            }
        }
        if options.include_header {
            let body = body.trim_end();
            if !body.is_empty() {
                out.push_str(body);
                out.push_str("\n\n");
            }
        }
    }

    for (idx, block) in blocks.iter().enumerate() {
        if idx > 0 {
            out.push_str(options.chapter_break.render());
        }
        out.push_str(block);
    }

    Ok(Compiled {
        text: format!("{}\n", out.trim_end()),
        words,
        chapters: blocks.len(),
        scenes,
    })
}

/// Write the compiled text, creating parent directories as needed.
pub fn write_output(path: &Path, text: &str) -> Result<(), ManuscriptError> {
    let write_err = |source| ManuscriptError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, text).map_err(write_err)?;
    info!(path = %path.display(), bytes = text.len(), "wrote manuscript");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_strings() {
        assert_eq!("none".parse::<HeadingStyle>(), Ok(HeadingStyle::Omit));
        assert!("bold".parse::<HeadingStyle>().is_err());
        assert_eq!("page".parse::<ChapterBreak>(), Ok(ChapterBreak::Page));
        assert_eq!(SceneSeparator::from("em".to_string()), SceneSeparator::Asterisks);
        assert_eq!(
            SceneSeparator::from("~ ~ ~".to_string()),
            SceneSeparator::Literal("~ ~ ~".into())
        );
    }

    #[test]
    fn separators_render_between_blank_lines() {
        assert_eq!(SceneSeparator::Literal("#".into()).render(), "\n\n#\n\n");
        assert_eq!(SceneSeparator::Omit.render(), "");
        assert_eq!(ChapterBreak::Omit.render(), "\n\n");
    }
}
