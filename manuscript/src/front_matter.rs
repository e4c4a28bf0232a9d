//! Leading YAML front matter on scene and header files.
//!
//! A block opens with a `---` first line (a byte-order mark is tolerated) and
//! closes with the next `---` or `...` line. An unterminated block is not
//! front matter; the text is left alone.

use serde_yaml::{Mapping, Value};
use tracing::warn;

/// Parsed front matter. Scalar values read back as strings.
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    values: Mapping,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A scalar value, trimmed. Empty strings and non-scalars read as `None`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// A list of scalars, or a single scalar as a one-line list.
    pub fn get_lines(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(scalar_to_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(_) => self.get_str(key).into_iter().collect(),
            None => Vec::new(),
        }
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// The text without its front matter block.
pub fn strip_front_matter(text: &str) -> &str {
    match split_front_matter(text) {
        Some((_, body)) => body,
        None => text,
    }
}

/// Parse the front matter block and return it with the remaining body.
///
/// Blocks that aren't valid YAML are read line by line instead (see
/// [`parse_lines`]). An unquoted ` #` is kept as text rather than starting a
/// comment, so `street: 1 Temple Road, Apt #3` survives intact.
pub fn parse_front_matter(text: &str) -> (Option<FrontMatter>, &str) {
    let Some((yaml, body)) = split_front_matter(text) else {
        return (None, text);
    };

    if yaml.trim().is_empty() {
        return (None, body);
    }

    let values = match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(mut values)) => {
            for (key, raw) in parse_lines(yaml) {
                if has_hash(&raw) && values.contains_key(&key) {
                    values.insert(key, raw);
                }
            }
            values
        }
        Ok(Value::Null) => Mapping::new(),
        Ok(_) => {
            warn!("front matter is not a key/value mapping; ignoring it");
            Mapping::new()
        }
        Err(error) => {
            warn!(%error, "front matter is not valid YAML; reading it line by line");
            parse_lines(yaml)
        }
    };

    if values.is_empty() {
        (None, body)
    } else {
        (Some(FrontMatter { values }), body)
    }
}

/// Read the simple subset front matter is usually written in: `key: value`
/// lines, `key:` followed by indented `- item` lines, and `key: |` (or `>`)
/// followed by an indented block. Values are taken verbatim after the first
/// colon, so they may contain further colons.
fn parse_lines(yaml: &str) -> Mapping {
    let lines: Vec<&str> = yaml.lines().collect();
    let nested = |i: usize| i < lines.len() && (lines[i].trim().is_empty() || indent(lines[i]) > 0);

    let mut values = Mapping::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        i += 1;
        if indent(line) > 0 || line.trim_start().starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = match value.trim() {
            "|" | "|-" | ">" | ">-" => {
                let start = i;
                while nested(i) {
                    i += 1;
                }
                Value::String(block(&lines[start..i]))
            }
            "" => {
                let mut items = Vec::new();
                while nested(i) {
                    let item = lines[i].trim();
                    if let Some(item) = item.strip_prefix('-') {
                        items.push(Value::String(unquote(item.trim()).to_string()));
                    }
                    i += 1;
                }
                if items.is_empty() {
                    Value::String(String::new())
                } else {
                    Value::Sequence(items)
                }
            }
            scalar => Value::String(unquote(scalar).to_string()),
        };
        values.insert(Value::String(key.to_string()), value);
    }
    values
}

fn indent(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Indented block lines with the first line's indentation removed.
fn block(lines: &[&str]) -> String {
    let base = lines
        .iter()
        .find(|l| !l.trim().is_empty())
        .map_or(0, |l| indent(l));
    let text: Vec<&str> = lines
        .iter()
        .map(|l| l[indent(l).min(base)..].trim_end())
        .collect();
    text.join("\n").trim_end_matches('\n').to_string()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn has_hash(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(" #"),
        Value::Sequence(items) => items.iter().any(has_hash),
        _ => false,
    }
}

/// Split into (yaml, body) when the text opens with a terminated block.
fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_start_matches('\u{feff}').trim() != "---" {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if matches!(line.trim(), "---" | "...") {
            return Some((&text[yaml_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_dashes_and_dots_terminators() {
        assert_eq!(strip_front_matter("---\npov: Hana\n---\nRain.\n"), "Rain.\n");
        assert_eq!(strip_front_matter("---\npov: Hana\n...\nRain.\n"), "Rain.\n");
    }

    #[test]
    fn tolerates_bom_and_crlf() {
        assert_eq!(
            strip_front_matter("\u{feff}---\r\npov: Hana\r\n---\r\nRain.\r\n"),
            "Rain.\r\n"
        );
    }

    #[test]
    fn unterminated_block_is_kept() {
        let text = "---\npov: Hana\nRain.\n";
        assert_eq!(strip_front_matter(text), text);
        let (meta, body) = parse_front_matter(text);
        assert!(meta.is_none());
        assert_eq!(body, text);
    }

    #[test]
    fn text_without_front_matter_is_untouched() {
        assert_eq!(strip_front_matter("Rain.\n---\n"), "Rain.\n---\n");
        assert_eq!(strip_front_matter(""), "");
    }

    #[test]
    fn parses_scalars_lists_and_blocks() {
        let text = "---\ntitle: \"The Gate of Rain\"\nword_count: 85000\naddress:\n  - 1 Temple Road\n  - Kyoto\nbio: |\n  First line\n  Second line\n---\nBody\n";
        let (meta, body) = parse_front_matter(text);
        let meta = meta.expect("front matter");
        assert_eq!(body, "Body\n");
        assert_eq!(meta.get_str("title").as_deref(), Some("The Gate of Rain"));
        assert_eq!(meta.get_str("word_count").as_deref(), Some("85000"));
        assert_eq!(meta.get_lines("address"), vec!["1 Temple Road", "Kyoto"]);
        assert_eq!(meta.get_str("bio").as_deref(), Some("First line\nSecond line"));
        assert_eq!(meta.get_lines("bio").len(), 1);
        assert_eq!(meta.get_str("missing"), None);
    }

    #[test]
    fn empty_or_non_mapping_yaml_reads_as_no_metadata() {
        let (meta, body) = parse_front_matter("---\n---\nBody");
        assert!(meta.is_none());
        assert_eq!(body, "Body");

        let (meta, body) = parse_front_matter("---\n- Hana\n- Kenji\n---\nBody");
        assert!(meta.is_none());
        assert_eq!(body, "Body");
    }

    #[test]
    fn invalid_yaml_is_read_line_by_line() {
        let text = "---\ntitle: The Gate: A Novel\nauthor: M. Sato\naddress:\n  - 1 Temple Road\n  - Kyoto\nbio: |\n  First line\n\n  Second line\n---\nBody\n";
        let (meta, body) = parse_front_matter(text);
        let meta = meta.expect("front matter");
        assert_eq!(body, "Body\n");
        assert_eq!(meta.get_str("title").as_deref(), Some("The Gate: A Novel"));
        assert_eq!(meta.get_str("author").as_deref(), Some("M. Sato"));
        assert_eq!(meta.get_lines("address"), vec!["1 Temple Road", "Kyoto"]);
        assert_eq!(meta.get_str("bio").as_deref(), Some("First line\n\nSecond line"));

        let (meta, _) = parse_front_matter("---\ntitle: [unclosed\n---\nBody");
        assert_eq!(meta.expect("front matter").get_str("title").as_deref(), Some("[unclosed"));
    }

    #[test]
    fn unquoted_hash_is_text() {
        let text = "---\nstreet: 1 Temple Road, Apt #3\nzip: 60601\naddress:\n  - Unit #4\n---\n";
        let meta = parse_front_matter(text).0.expect("front matter");
        assert_eq!(meta.get_str("street").as_deref(), Some("1 Temple Road, Apt #3"));
        assert_eq!(meta.get_str("zip").as_deref(), Some("60601"));
        assert_eq!(meta.get_lines("address"), vec!["Unit #4"]);
    }
}
