//! Formatting-convention checks over a parsed outline.
//!
//! Parsing accepts anything it can read. These checks report what an author
//! would want fixed: numbering mistakes, missing settings, dangling character
//! references.

use std::collections::HashMap;

use crate::Outline;
use crate::act::Act;
use crate::parser::ParseError;

#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Report a chapter without a setting as an error instead of a warning.
    pub require_setting: bool,
}

/// Run every check. Diagnostics come back in source order.
pub fn validate(outline: &Outline, options: &ValidationOptions) -> Vec<ParseError> {
    let mut diagnostics = Vec::new();

    check_act_order(outline, &mut diagnostics);
    for act in &outline.acts {
        check_act(outline, act, options, &mut diagnostics);
    }
    check_characters(outline, &mut diagnostics);

    diagnostics.sort_by_key(|d| d.span.start);
    diagnostics
}

fn check_act_order(outline: &Outline, out: &mut Vec<ParseError>) {
    for pair in outline.acts.windows(2) {
        let (prev, act) = (&pair[0], &pair[1]);
        let message = if act.ordinal == prev.ordinal {
            format!("act number {} is used twice", act.label)
        } else if act.ordinal < prev.ordinal {
            format!("act {} comes after act {}", act.label, prev.label)
        } else {
            continue;
        };
        out.push(
            ParseError::error(message, act.span.clone(), outline.source_id)
                .with_code("act-ordinal-order")
                .with_secondary(prev.span.clone(), "previous act"),
        );
    }
}

fn check_act(
    outline: &Outline,
    act: &Act,
    options: &ValidationOptions,
    out: &mut Vec<ParseError>,
) {
    let file_id = outline.source_id;

    if act.chapters.is_empty() {
        out.push(
            ParseError::warning(format!("act {} has no chapters", act.label), act.span.clone(), file_id)
                .with_code("act-empty"),
        );
    }

    let mut seen: HashMap<u32, usize> = HashMap::new();
    for (idx, chapter) in act.chapters.iter().enumerate() {
        if let Some(&first) = seen.get(&chapter.ordinal) {
            out.push(
                ParseError::error(
                    format!(
                        "chapter number {} is used twice in act {}",
                        chapter.label, act.label
                    ),
                    chapter.span.clone(),
                    file_id,
                )
                .with_code("chapter-ordinal-duplicate")
                .with_secondary(act.chapters[first].span.clone(), "first used here"),
            );
        } else if let Some(prev) = idx.checked_sub(1).map(|p| &act.chapters[p]) {
            if chapter.ordinal <= prev.ordinal {
                out.push(
                    ParseError::error(
                        format!(
                            "chapter {} comes after chapter {} in act {}",
                            chapter.label, prev.label, act.label
                        ),
                        chapter.span.clone(),
                        file_id,
                    )
                    .with_code("chapter-ordinal-order")
                    .with_secondary(prev.span.clone(), "previous chapter")
                    .with_note("chapter numbers must increase within an act"),
                );
            }
        }
        seen.entry(chapter.ordinal).or_insert(idx);

        if chapter.setting.is_none() {
            let message = format!("chapter {} has no setting", chapter.label);
            let diagnostic = if options.require_setting {
                ParseError::error(message, chapter.span.clone(), file_id)
            } else {
                ParseError::warning(message, chapter.span.clone(), file_id)
            };
            out.push(
                diagnostic
                    .with_code("chapter-missing-setting")
                    .with_note("give the time and place in parentheses, e.g. `Chapter 3: Rain (Kyoto, 1968)`"),
            );
        }

        if chapter.lesson.is_some() && chapter.fetter.is_some() {
            out.push(
                ParseError::warning(
                    format!("chapter {} has both a lesson and a fetter", chapter.label),
                    chapter.span.clone(),
                    file_id,
                )
                .with_code("chapter-tag-conflict")
                .with_note("the fetter is used as the chapter's tag"),
            );
        }

        // An outline without a character section can't be cross-checked.
        if !outline.characters.is_empty() {
            for name in &chapter.characters {
                if outline.character(name).is_none() {
                    out.push(
                        ParseError::warning(
                            format!("chapter {} mentions unknown character `{}`", chapter.label, name),
                            chapter.span.clone(),
                            file_id,
                        )
                        .with_code("unknown-character"),
                    );
                }
            }
        }
    }
}

fn check_characters(outline: &Outline, out: &mut Vec<ParseError>) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for (idx, character) in outline.characters.iter().enumerate() {
        let key = character.name.to_lowercase();
        if let Some(&first) = seen.get(&key) {
            out.push(
                ParseError::warning(
                    format!("character `{}` is defined twice", character.name),
                    character.span.clone(),
                    outline.source_id,
                )
                .with_code("character-duplicate")
                .with_secondary(outline.characters[first].span.clone(), "first defined here"),
            );
        } else {
            seen.insert(key, idx);
        }
    }
}
