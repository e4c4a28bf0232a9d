use std::ops::Range;

use serde::Serialize;

use crate::text::Text;

/// An entry of the character arcs section.
#[derive(Debug, Clone, Serialize)]
pub struct Character {
    pub name: String,
    /// Arc notes, one per bullet.
    pub arc: Vec<Text>,
    #[serde(skip)]
    pub span: Range<usize>,
}

/// A theme label. Themes carry no structure beyond their text.
#[derive(Debug, Clone, Serialize)]
pub struct Theme {
    pub label: Text,
    #[serde(skip)]
    pub span: Range<usize>,
}
