use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};

/// An outline diagnostic with source location information.
///
/// Produced both by the parser (always errors) and by the validator (errors
/// or warnings).
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    /// Stable rule identifier, e.g. `chapter-ordinal-order`.
    pub code: Option<&'static str>,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
    /// Related locations, e.g. the earlier chapter a duplicate collides with.
    pub secondary: Vec<(Range<usize>, String)>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        Self::new(Severity::Error, message, span, file_id)
    }

    pub fn warning(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        Self::new(Severity::Warning, message, span, file_id)
    }

    fn new(
        severity: Severity,
        message: impl Into<String>,
        span: Range<usize>,
        file_id: usize,
    ) -> Self {
        ParseError {
            message: message.into(),
            code: None,
            span,
            file_id,
            severity,
            notes: Vec::new(),
            secondary: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_secondary(mut self, span: Range<usize>, message: impl Into<String>) -> Self {
        self.secondary.push((span, message.into()));
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Bug | Severity::Error)
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let mut labels = vec![Label::primary(self.file_id, self.span.clone())];
        labels.extend(
            self.secondary
                .iter()
                .map(|(span, msg)| Label::secondary(self.file_id, span.clone()).with_message(msg)),
        );
        let diagnostic = Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(labels)
            .with_notes(self.notes.clone());
        match self.code {
            Some(code) => diagnostic.with_code(code),
            None => diagnostic,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ParseError {}
