use std::ops::Range;

use serde::Serialize;

use crate::text::Text;

/// An ordered grouping of chapters, opened by a `## Act <ordinal>` heading.
#[derive(Debug, Clone, Serialize)]
pub struct Act {
    /// Numeric position parsed from the heading.
    pub ordinal: u32,
    /// The ordinal exactly as written (`II`, `Two`, `2`).
    pub label: String,
    pub title: Option<String>,
    pub chapters: Vec<Chapter>,
    /// Span of the act heading.
    #[serde(skip)]
    pub span: Range<usize>,
}

impl Act {
    /// Heading text without the `##` marker, e.g. `Act II: The Return`.
    pub fn heading(&self) -> String {
        match &self.title {
            Some(title) => format!("Act {}: {}", self.label, title),
            None => format!("Act {}", self.label),
        }
    }
}

/// A planned chapter.
#[derive(Debug, Clone, Serialize)]
pub struct Chapter {
    pub ordinal: u32,
    pub label: String,
    pub title: Option<String>,
    /// Time and place, from the heading's parenthetical or a `Setting:` bullet.
    pub setting: Option<String>,
    pub genre: Option<String>,
    /// Point-of-view mode.
    pub pov: Option<String>,
    pub lesson: Option<String>,
    pub fetter: Option<String>,
    /// Character names referenced by a `Characters:` bullet.
    pub characters: Vec<String>,
    /// Free-text thematic notes.
    pub notes: Vec<Text>,
    /// Span of the chapter heading.
    #[serde(skip)]
    pub span: Range<usize>,
}

/// The single spiritual-obstacle tag a chapter may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterTag<'a> {
    Lesson(&'a str),
    Fetter(&'a str),
}

impl Chapter {
    pub fn new(ordinal: u32, label: impl Into<String>, span: Range<usize>) -> Self {
        Chapter {
            ordinal,
            label: label.into(),
            title: None,
            setting: None,
            genre: None,
            pov: None,
            lesson: None,
            fetter: None,
            characters: Vec::new(),
            notes: Vec::new(),
            span,
        }
    }

    /// The chapter's tag. A fetter wins when both are present.
    pub fn tag(&self) -> Option<ChapterTag<'_>> {
        self.fetter
            .as_deref()
            .map(ChapterTag::Fetter)
            .or_else(|| self.lesson.as_deref().map(ChapterTag::Lesson))
    }

    /// Heading text without the `###` marker, e.g. `Chapter 3: Rain (Kyoto, 1968)`.
    pub fn heading(&self) -> String {
        let mut heading = format!("Chapter {}", self.label);
        if let Some(title) = &self.title {
            heading.push_str(": ");
            heading.push_str(title);
        }
        if let Some(setting) = &self.setting {
            heading.push_str(" (");
            heading.push_str(setting);
            heading.push(')');
        }
        heading
    }
}
