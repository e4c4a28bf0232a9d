//! Recognition of section, act and chapter headings from their plain text.

use crate::ordinal::parse_ordinal;

/// The kind of level-2 section a heading opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionKind {
    Characters,
    Themes,
    Approach,
}

/// Classify a non-act section heading by name.
pub(crate) fn section_kind(heading: &str) -> Option<SectionKind> {
    let lower = heading.to_lowercase();
    match lower.trim_end_matches(':') {
        "character arcs" | "characters" | "character arc" | "cast" => Some(SectionKind::Characters),
        "themes" | "theme" | "thematic threads" => Some(SectionKind::Themes),
        "writing approach" | "approach" | "writing notes" | "notes" | "craft notes" => {
            Some(SectionKind::Approach)
        }
        _ => None,
    }
}

/// A heading of the form `<keyword> <ordinal>[: <title>] [(<setting>)]`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NumberedHeading {
    /// The ordinal token as written.
    pub label: String,
    /// `None` when the token is not a readable ordinal.
    pub ordinal: Option<u32>,
    pub title: Option<String>,
    pub setting: Option<String>,
}

/// Parse `Act II: The Return` (or `Part Two`). Returns `None` when the heading
/// is not an act heading at all.
pub(crate) fn act_heading(heading: &str) -> Option<NumberedHeading> {
    numbered(heading, &["act", "part"]).map(|mut h| {
        // Acts carry no setting; keep the parenthetical in the title.
        if let Some(setting) = h.setting.take() {
            let title = h.title.take().unwrap_or_default();
            let joined = format!("{} ({})", title, setting);
            h.title = Some(joined.trim().to_string());
        }
        h
    })
}

/// Parse `Chapter 3: Rain (Kyoto, 1968)`. Returns `None` when the heading is
/// not a chapter heading at all.
pub(crate) fn chapter_heading(heading: &str) -> Option<NumberedHeading> {
    numbered(heading, &["chapter", "ch."])
}

fn numbered(heading: &str, keywords: &[&str]) -> Option<NumberedHeading> {
    let heading = heading.trim();
    let (keyword, rest) = split_first_word(heading)?;
    if !keywords.contains(&keyword.to_lowercase().as_str()) {
        return None;
    }

    let (body, setting) = split_setting(rest);
    let (token, remainder) = split_first_word(body).unwrap_or(("", ""));
    let label = token.trim_end_matches([':', '.', ',']).to_string();
    if label.is_empty() {
        return None;
    }

    // `Twenty-One` and `Twenty One` both read as one ordinal; try the longer
    // form first.
    let (ordinal, label, remainder) = match split_first_word(remainder) {
        Some((second, after)) if !token.ends_with([':', '.', ',']) => {
            let pair = format!("{} {}", label, second.trim_end_matches([':', '.', ',']));
            match parse_ordinal(&pair) {
                Some(n) => (Some(n), pair, after),
                _ => (parse_ordinal(&label), label, remainder),
            }
        }
        _ => (parse_ordinal(&label), label, remainder),
    };

    let title = remainder
        .trim()
        .trim_start_matches([':', '-', '\u{2013}', '\u{2014}', '.', ','])
        .trim();
    Some(NumberedHeading {
        label,
        ordinal,
        title: (!title.is_empty()).then(|| title.to_string()),
        setting,
    })
}

fn split_first_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(pos) => Some((&s[..pos], &s[pos..])),
        None => Some((s, "")),
    }
}

/// Split a trailing `(...)` off the heading, honoring nested parentheses.
fn split_setting(s: &str) -> (&str, Option<String>) {
    let trimmed = s.trim_end();
    if !trimmed.ends_with(')') {
        return (s, None);
    }
    let mut depth = 0i32;
    for (pos, c) in trimmed.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    let inner = trimmed[pos + 1..trimmed.len() - 1].trim();
                    let setting = (!inner.is_empty()).then(|| inner.to_string());
                    return (&trimmed[..pos], setting);
                }
            }
            _ => {}
        }
    }
    (s, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_with_title_and_setting() {
        let h = chapter_heading("Chapter 3: Rain on the Roof (Kyoto, 1968)").unwrap();
        assert_eq!(h.ordinal, Some(3));
        assert_eq!(h.label, "3");
        assert_eq!(h.title.as_deref(), Some("Rain on the Roof"));
        assert_eq!(h.setting.as_deref(), Some("Kyoto, 1968"));
    }

    #[test]
    fn chapter_with_nested_parentheses_in_setting() {
        let h = chapter_heading("Chapter 4 (Osaka (outskirts), winter)").unwrap();
        assert_eq!(h.title, None);
        assert_eq!(h.setting.as_deref(), Some("Osaka (outskirts), winter"));
    }

    #[test]
    fn chapter_with_word_ordinal() {
        let h = chapter_heading("Chapter Twenty One - Ash").unwrap();
        assert_eq!(h.ordinal, Some(21));
        assert_eq!(h.label, "Twenty One");
        assert_eq!(h.title.as_deref(), Some("Ash"));

        let h = chapter_heading("Chapter Two: Smoke").unwrap();
        assert_eq!(h.ordinal, Some(2));
        assert_eq!(h.title.as_deref(), Some("Smoke"));
    }

    #[test]
    fn chapter_with_unreadable_ordinal() {
        let h = chapter_heading("Chapter Prime: Dawn").unwrap();
        assert_eq!(h.ordinal, None);
        assert_eq!(h.label, "Prime");
    }

    #[test]
    fn not_a_chapter() {
        assert_eq!(chapter_heading("Chapters to cut"), None);
        assert_eq!(chapter_heading("Chapter"), None);
        assert_eq!(chapter_heading("Interlude"), None);
    }

    #[test]
    fn act_headings() {
        let h = act_heading("Act II: The Return").unwrap();
        assert_eq!(h.ordinal, Some(2));
        assert_eq!(h.title.as_deref(), Some("The Return"));

        let h = act_heading("Part One \u{2014} Leaving").unwrap();
        assert_eq!(h.ordinal, Some(1));
        assert_eq!(h.title.as_deref(), Some("Leaving"));

        assert_eq!(act_heading("Acting notes").map(|h| h.ordinal), None);
    }

    #[test]
    fn sections() {
        assert_eq!(section_kind("Character Arcs"), Some(SectionKind::Characters));
        assert_eq!(section_kind("Themes:"), Some(SectionKind::Themes));
        assert_eq!(section_kind("Writing Approach"), Some(SectionKind::Approach));
        assert_eq!(section_kind("Timeline"), None);
    }
}
