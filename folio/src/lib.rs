pub mod act;
pub mod character;
pub mod ordinal;
pub mod parser;
mod render;
pub mod text;
pub mod validate;

use serde::Serialize;

use crate::act::Act;
use crate::character::{Character, Theme};
use crate::text::Text;

/// A parsed novel outline.
#[derive(Debug, Clone, Serialize)]
pub struct Outline {
    /// Level-1 heading text, if the outline has one.
    pub title: Option<String>,
    /// Acts in document order.
    pub acts: Vec<Act>,
    /// Entries of the character arcs section.
    pub characters: Vec<Character>,
    pub themes: Vec<Theme>,
    /// Free-text writing approach notes.
    pub approach: Vec<Text>,
    /// The source file ID (for error reporting with codespan-reporting).
    #[serde(skip)]
    pub source_id: usize,
}

impl Outline {
    /// All chapters across all acts, in reading order.
    pub fn chapters(&self) -> impl Iterator<Item = &act::Chapter> {
        self.acts.iter().flat_map(|act| act.chapters.iter())
    }

    /// Case-insensitive character lookup.
    pub fn character(&self, name: &str) -> Option<&Character> {
        let lower = name.to_lowercase();
        self.characters
            .iter()
            .find(|c| c.name.to_lowercase() == lower)
    }
}
