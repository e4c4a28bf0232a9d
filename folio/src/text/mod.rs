use std::fmt;

use serde::{Serialize, Serializer};

/// A run of inline markdown: a note, an arc entry, a theme label.
///
/// Rendering with `Display` yields markdown. `plain_text` drops the markup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Text {
    pub inlines: Vec<InlineNode>,
}

/// Inline elements that appear within a line of outline text.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineNode {
    Text(String),
    Strong(Vec<InlineNode>),
    Emphasis(Vec<InlineNode>),
    Strikethrough(Vec<InlineNode>),
    CodeSpan(String),
    Link {
        dest: String,
        content: Vec<InlineNode>,
    },
    SoftBreak,
    HardBreak,
}

impl Text {
    pub fn new(inlines: Vec<InlineNode>) -> Self {
        Text { inlines }
    }

    /// A text consisting of a single unformatted run.
    pub fn plain(s: impl Into<String>) -> Self {
        Text {
            inlines: vec![InlineNode::Text(s.into())],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// The text with all markup removed and line breaks folded to spaces.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        push_plain(&self.inlines, &mut out);
        out
    }

    /// Trim whitespace at both ends of the run, dropping runs that become empty.
    pub fn trimmed(mut self) -> Self {
        while matches!(self.inlines.first(), Some(InlineNode::SoftBreak | InlineNode::HardBreak)) {
            self.inlines.remove(0);
        }
        while matches!(self.inlines.last(), Some(InlineNode::SoftBreak | InlineNode::HardBreak)) {
            self.inlines.pop();
        }
        if let Some(InlineNode::Text(s)) = self.inlines.first_mut() {
            *s = s.trim_start().to_string();
            if s.is_empty() {
                self.inlines.remove(0);
            }
        }
        if let Some(InlineNode::Text(s)) = self.inlines.last_mut() {
            *s = s.trim_end().to_string();
            if s.is_empty() {
                self.inlines.pop();
            }
        }
        self
    }
}

impl From<&str> for Text {
    fn from(s: &str) -> Self {
        Text::plain(s)
    }
}

fn push_plain(inlines: &[InlineNode], out: &mut String) {
    for inline in inlines {
        match inline {
            InlineNode::Text(s) | InlineNode::CodeSpan(s) => out.push_str(s),
            InlineNode::Strong(children)
            | InlineNode::Emphasis(children)
            | InlineNode::Strikethrough(children)
            | InlineNode::Link {
                content: children, ..
            } => push_plain(children, out),
            InlineNode::SoftBreak | InlineNode::HardBreak => out.push(' '),
        }
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_inlines(f, &self.inlines)
    }
}

fn write_inlines(f: &mut fmt::Formatter<'_>, inlines: &[InlineNode]) -> fmt::Result {
    inlines.iter().try_for_each(|inline| write!(f, "{}", inline))
}

fn write_wrapped(f: &mut fmt::Formatter<'_>, marker: &str, inlines: &[InlineNode]) -> fmt::Result {
    f.write_str(marker)?;
    write_inlines(f, inlines)?;
    f.write_str(marker)
}

impl Serialize for Text {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl fmt::Display for InlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineNode::Text(s) => f.write_str(s),
            InlineNode::Strong(children) => write_wrapped(f, "**", children),
            InlineNode::Emphasis(children) => write_wrapped(f, "*", children),
            InlineNode::Strikethrough(children) => write_wrapped(f, "~~", children),
            InlineNode::CodeSpan(code) => write!(f, "`{}`", code),
            InlineNode::Link { dest, content } => {
                f.write_str("[")?;
                write_inlines(f, content)?;
                write!(f, "]({})", dest)
            }
            // A note renders on one bullet line; breaks fold to spaces.
            InlineNode::SoftBreak | InlineNode::HardBreak => f.write_str(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_drops_markup() {
        let text = Text::new(vec![
            InlineNode::Strong(vec![InlineNode::Text("Hana".into())]),
            InlineNode::Text(": learns to ".into()),
            InlineNode::Emphasis(vec![InlineNode::Text("let go".into())]),
        ]);
        assert_eq!(text.plain_text(), "Hana: learns to let go");
        assert_eq!(text.to_string(), "**Hana**: learns to *let go*");
    }

    #[test]
    fn trimmed_removes_edge_whitespace_and_breaks() {
        let text = Text::new(vec![
            InlineNode::SoftBreak,
            InlineNode::Text("  quiet  ".into()),
            InlineNode::HardBreak,
        ])
        .trimmed();
        assert_eq!(text.inlines, vec![InlineNode::Text("quiet".into())]);
    }

    #[test]
    fn whitespace_only_text_is_empty() {
        assert!(Text::plain("   ").is_empty());
        assert!(!Text::plain("x").is_empty());
    }
}
