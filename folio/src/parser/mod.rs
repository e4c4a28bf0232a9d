pub mod error;
mod heading;
mod structural;

pub use error::ParseError;

use crate::Outline;

/// Reads outline markdown into an [`Outline`].
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the outline text. All structural errors are collected before
    /// returning.
    pub fn parse(&self) -> Result<Outline, Vec<ParseError>> {
        structural::parse_outline(&self.source, self.file_id)
    }
}
