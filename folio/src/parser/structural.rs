use std::ops::Range;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd};
use tracing::debug;

use crate::Outline;
use crate::act::{Act, Chapter};
use crate::character::{Character, Theme};
use crate::parser::error::ParseError;
use crate::parser::heading::{self, NumberedHeading, SectionKind};
use crate::text::{InlineNode, Text};

type Events<'e> = [(Event<'e>, Range<usize>)];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse outline source text into an `Outline`.
pub fn parse_outline(source: &str, file_id: usize) -> Result<Outline, Vec<ParseError>> {
    let parser = CmarkParser::new_ext(source, Options::ENABLE_STRIKETHROUGH);
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut state = ParseState::new(file_id);
    state.process_events(&events);
    state.finalize()
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    /// Before any level-2 heading, or after a level-1 heading.
    Preamble,
    Act,
    Named(SectionKind),
    /// A level-2 section the outline format doesn't know.
    Other,
}

/// A bullet with its nested bullets.
struct ListItem {
    text: Text,
    span: Range<usize>,
    children: Vec<ListItem>,
}

struct ParseState {
    file_id: usize,
    section: Section,
    title: Option<String>,
    acts: Vec<Act>,
    /// Chapter being filled; attached to the last act when closed.
    chapter: Option<Chapter>,
    characters: Vec<Character>,
    /// Character opened by a `###` heading; its bullets are all arc notes.
    character: Option<Character>,
    themes: Vec<Theme>,
    approach: Vec<Text>,
    errors: Vec<ParseError>,
}

impl ParseState {
    fn new(file_id: usize) -> Self {
        ParseState {
            file_id,
            section: Section::Preamble,
            title: None,
            acts: Vec::new(),
            chapter: None,
            characters: Vec::new(),
            character: None,
            themes: Vec::new(),
            approach: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn process_events(&mut self, events: &Events<'_>) {
        let mut i = 0;

        while i < events.len() {
            let (ref ev, ref range) = events[i];

            match ev {
                Event::Start(Tag::Heading { level, .. }) => {
                    let level = heading_level_to_u8(level);
                    let span = range.clone();
                    i += 1;
                    let text = normalize_heading(&collect_heading_text(events, &mut i));
                    self.open_heading(level, &text, span);
                }

                Event::Start(Tag::Paragraph) => {
                    let span = range.clone();
                    i += 1;
                    let inlines = collect_inlines(events, &mut i, &|e| {
                        matches!(e, TagEnd::Paragraph)
                    });
                    self.add_paragraph(Text::new(inlines).trimmed(), span);
                }

                Event::Start(Tag::List(_)) => {
                    i += 1;
                    for item in collect_list_items(events, &mut i) {
                        self.add_list_item(item);
                    }
                }

                _ => {
                    i += 1;
                }
            }
        }
    }

    fn open_heading(&mut self, level: u8, text: &str, span: Range<usize>) {
        // `####` and deeper inside a chapter subdivide it.
        if level > 3 && heading::chapter_heading(text).is_none() {
            if let Some(chapter) = self.chapter.as_mut() {
                debug!(heading = text, "sub-heading kept as a chapter note");
                chapter.notes.push(Text::plain(text));
                return;
            }
        }

        self.close_chapter();
        self.close_character();

        if level == 1 {
            if self.title.is_none() {
                self.title = Some(text.to_string());
            } else {
                debug!(heading = text, "ignoring second level-1 heading");
            }
            self.section = Section::Preamble;
            return;
        }

        if level == 2 {
            if let Some(act) = heading::act_heading(text) {
                self.open_act(act, span);
                return;
            }
        }

        if let Some(chapter) = heading::chapter_heading(text) {
            self.open_chapter(chapter, span);
            return;
        }

        if level == 2 {
            self.section = match heading::section_kind(text) {
                Some(kind) => Section::Named(kind),
                None => {
                    debug!(heading = text, "unknown section; its content is ignored");
                    Section::Other
                }
            };
            return;
        }

        if self.section == Section::Named(SectionKind::Characters) {
            self.character = Some(Character {
                name: text.to_string(),
                arc: Vec::new(),
                span,
            });
            return;
        }

        debug!(heading = text, level, "ignoring heading");
    }

    fn open_act(&mut self, heading: NumberedHeading, span: Range<usize>) {
        let ordinal = match heading.ordinal {
            Some(n) => n,
            None => {
                self.errors.push(
                    ParseError::error(
                        format!("cannot read act number `{}`", heading.label),
                        span.clone(),
                        self.file_id,
                    )
                    .with_code("act-ordinal")
                    .with_note("act headings read `Act <number>[: <title>]`, e.g. `Act II: The Return`"),
                );
                0
            }
        };
        debug!(ordinal, label = %heading.label, "act");
        self.acts.push(Act {
            ordinal,
            label: heading.label,
            title: heading.title,
            chapters: Vec::new(),
            span,
        });
        self.section = Section::Act;
    }

    fn open_chapter(&mut self, heading: NumberedHeading, span: Range<usize>) {
        if self.section != Section::Act || self.acts.is_empty() {
            self.errors.push(
                ParseError::error("chapter heading outside of an act", span, self.file_id)
                    .with_code("chapter-outside-act")
                    .with_note("chapters belong under an `## Act <number>` heading"),
            );
            return;
        }

        let ordinal = match heading.ordinal {
            Some(n) => n,
            None => {
                self.errors.push(
                    ParseError::error(
                        format!("cannot read chapter number `{}`", heading.label),
                        span.clone(),
                        self.file_id,
                    )
                    .with_code("chapter-ordinal")
                    .with_note("chapter headings read `Chapter <number>[: <title>] [(<setting>)]`"),
                );
                0
            }
        };

        let mut chapter = Chapter::new(ordinal, heading.label, span);
        chapter.title = heading.title;
        chapter.setting = heading.setting;
        self.chapter = Some(chapter);
    }

    fn close_chapter(&mut self) {
        if let Some(chapter) = self.chapter.take() {
            if let Some(act) = self.acts.last_mut() {
                act.chapters.push(chapter);
            }
        }
    }

    fn close_character(&mut self) {
        if let Some(character) = self.character.take() {
            self.characters.push(character);
        }
    }

    /// A bold line is a chapter title only inside an act and only with a
    /// readable ordinal. Anything else (`**Chapter arc:** ...`) is prose.
    fn bold_chapter(&self, line: &str) -> Option<NumberedHeading> {
        if self.section != Section::Act || self.acts.is_empty() {
            return None;
        }
        heading::chapter_heading(line).filter(|h| h.ordinal.is_some())
    }

    fn add_paragraph(&mut self, text: Text, span: Range<usize>) {
        if text.is_empty() {
            return;
        }

        // Bold act and chapter titles stand in for headings.
        if let Some((line, rest)) = strong_heading_line(&text) {
            if let Some(act) = heading::act_heading(&line).filter(|h| h.ordinal.is_some()) {
                self.close_chapter();
                self.close_character();
                self.open_act(act, span);
                return;
            }
            if let Some(chapter) = self.bold_chapter(&line) {
                self.close_chapter();
                self.open_chapter(chapter, span);
                if !rest.is_empty() {
                    if let Some(open) = self.chapter.as_mut() {
                        open.notes.push(rest);
                    }
                }
                return;
            }
        }

        match self.section {
            Section::Act => match self.chapter.as_mut() {
                Some(chapter) => chapter.notes.push(text),
                None => debug!("ignoring act prose outside a chapter"),
            },
            Section::Named(SectionKind::Approach) => self.approach.push(text),
            Section::Named(SectionKind::Characters) => {
                // `**Name**: ...` prose starts a new character even after a
                // `### Name` heading.
                if leading_strong(&text).is_some() {
                    self.close_character();
                }
                match self.character.as_mut() {
                    Some(character) => character.arc.push(text),
                    None => self.add_list_item(ListItem {
                        text,
                        span,
                        children: Vec::new(),
                    }),
                }
            }
            Section::Named(SectionKind::Themes) | Section::Preamble | Section::Other => {
                debug!(section = ?self.section, "ignoring paragraph");
            }
        }
    }

    fn add_list_item(&mut self, item: ListItem) {
        match self.section {
            Section::Act => {
                if let Some((line, rest)) = strong_heading_line(&item.text) {
                    if let Some(chapter) = self.bold_chapter(&line) {
                        self.close_chapter();
                        self.open_chapter(chapter, item.span.clone());
                        if !rest.is_empty() {
                            self.add_chapter_bullet(rest);
                        }
                        for note in flatten(item.children) {
                            self.add_chapter_bullet(note);
                        }
                        return;
                    }
                }
                if self.chapter.is_some() {
                    for note in flatten(vec![item]) {
                        self.add_chapter_bullet(note);
                    }
                } else {
                    debug!("ignoring act bullet outside a chapter");
                }
            }
            Section::Named(SectionKind::Characters) => self.add_character_item(item),
            Section::Named(SectionKind::Themes) => {
                if !item.children.is_empty() {
                    debug!(theme = %item.text, "ignoring nested bullets under a theme");
                }
                if !item.text.is_empty() {
                    self.themes.push(Theme {
                        label: item.text,
                        span: item.span,
                    });
                }
            }
            Section::Named(SectionKind::Approach) => {
                self.approach.extend(flatten(vec![item]));
            }
            Section::Preamble | Section::Other => {
                debug!(section = ?self.section, "ignoring bullet");
            }
        }
    }

    fn add_chapter_bullet(&mut self, text: Text) {
        let Some(chapter) = self.chapter.as_mut() else {
            return;
        };

        let Some((key, value)) = split_key(&text) else {
            chapter.notes.push(text);
            return;
        };
        let value = value.plain_text().trim().to_string();
        if value.is_empty() {
            chapter.notes.push(text);
            return;
        }

        match key.to_lowercase().as_str() {
            "setting" | "time/place" | "time and place" | "place" => {
                if chapter.setting.is_none() {
                    chapter.setting = Some(value);
                } else {
                    debug!(setting = %value, "heading already gives a setting; keeping as a note");
                    chapter.notes.push(text);
                }
            }
            "genre" => chapter.genre = Some(value),
            "pov" | "point of view" | "point-of-view" | "narration" => chapter.pov = Some(value),
            "lesson" => chapter.lesson = Some(value),
            "fetter" => chapter.fetter = Some(value),
            "characters" | "character" | "cast" => {
                chapter.characters.extend(split_names(&value));
            }
            _ => chapter.notes.push(text),
        }
    }

    fn add_character_item(&mut self, item: ListItem) {
        if let Some(character) = self.character.as_mut() {
            character.arc.extend(flatten(vec![item]));
            return;
        }

        let named = leading_strong(&item.text)
            .or_else(|| split_key(&item.text).map(|(k, v)| (k, v.trimmed())))
            .or_else(|| {
                // `- Hana` with nested arc bullets.
                let name = item.text.plain_text();
                (!item.children.is_empty() && !name.trim().is_empty())
                    .then(|| (name.trim().to_string(), Text::default()))
            });

        match named {
            Some((name, rest)) => {
                let mut character = Character {
                    name,
                    arc: Vec::new(),
                    span: item.span,
                };
                if !rest.is_empty() {
                    character.arc.push(rest);
                }
                character.arc.extend(flatten(item.children));
                self.characters.push(character);
            }
            None => match self.characters.last_mut() {
                Some(last) => last.arc.extend(flatten(vec![item])),
                None => debug!(text = %item.text, "ignoring bullet before any character"),
            },
        }
    }

    fn finalize(mut self) -> Result<Outline, Vec<ParseError>> {
        self.close_chapter();
        self.close_character();

        if self.errors.is_empty() {
            Ok(Outline {
                title: self.title,
                acts: self.acts,
                characters: self.characters,
                themes: self.themes,
                approach: self.approach,
                source_id: self.file_id,
            })
        } else {
            Err(self.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Event collection
// ---------------------------------------------------------------------------

/// Collect list items until the list's End tag.
fn collect_list_items(events: &Events<'_>, i: &mut usize) -> Vec<ListItem> {
    let mut items = Vec::new();

    while *i < events.len() {
        let (ref ev, ref range) = events[*i];
        match ev {
            Event::End(TagEnd::List(_)) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Item) => {
                let span = range.clone();
                *i += 1;
                items.push(collect_item(events, i, span));
            }
            _ => {
                *i += 1;
            }
        }
    }

    items
}

/// Collect one list item. Loose items wrap their text in paragraphs; tight
/// items don't. Both end up as one inline run.
fn collect_item(events: &Events<'_>, i: &mut usize, span: Range<usize>) -> ListItem {
    let mut inlines = Vec::new();
    let mut children = Vec::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::Item) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::List(_)) => {
                *i += 1;
                children.extend(collect_list_items(events, i));
            }
            Event::Start(Tag::Paragraph) => {
                if !inlines.is_empty() {
                    inlines.push(InlineNode::SoftBreak);
                }
                *i += 1;
            }
            Event::End(TagEnd::Paragraph) => {
                *i += 1;
            }
            _ => {
                if let Some(node) = collect_inline(events, i) {
                    push_inline(&mut inlines, node);
                }
            }
        }
    }

    ListItem {
        text: Text::new(inlines).trimmed(),
        span,
        children,
    }
}

/// Collect inline nodes until a matching End tag.
fn collect_inlines(
    events: &Events<'_>,
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<InlineNode> {
    let mut inlines = Vec::new();

    while *i < events.len() {
        if let Event::End(tag_end) = &events[*i].0 {
            if is_end(tag_end) {
                *i += 1;
                break;
            }
        }
        if let Some(node) = collect_inline(events, i) {
            push_inline(&mut inlines, node);
        }
    }

    inlines
}

/// Consume one event (and, for containers, everything up to its End).
fn collect_inline(events: &Events<'_>, i: &mut usize) -> Option<InlineNode> {
    let (ref ev, _) = events[*i];
    *i += 1;

    match ev {
        Event::Text(s) => Some(InlineNode::Text(s.to_string())),
        Event::Code(s) => Some(InlineNode::CodeSpan(s.to_string())),
        Event::SoftBreak => Some(InlineNode::SoftBreak),
        Event::HardBreak => Some(InlineNode::HardBreak),
        Event::Start(Tag::Strong) => Some(InlineNode::Strong(collect_inlines(events, i, &|e| {
            matches!(e, TagEnd::Strong)
        }))),
        Event::Start(Tag::Emphasis) => Some(InlineNode::Emphasis(collect_inlines(
            events,
            i,
            &|e| matches!(e, TagEnd::Emphasis),
        ))),
        Event::Start(Tag::Strikethrough) => Some(InlineNode::Strikethrough(collect_inlines(
            events,
            i,
            &|e| matches!(e, TagEnd::Strikethrough),
        ))),
        Event::Start(Tag::Link { dest_url, .. }) => {
            let dest = dest_url.to_string();
            let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Link));
            Some(InlineNode::Link { dest, content })
        }
        _ => None,
    }
}

/// pulldown-cmark splits text runs at inline delimiters; merge them back.
fn push_inline(inlines: &mut Vec<InlineNode>, node: InlineNode) {
    if let (Some(InlineNode::Text(last)), InlineNode::Text(next)) = (inlines.last_mut(), &node) {
        last.push_str(next);
        return;
    }
    inlines.push(node);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collect heading text (all Text events until End(Heading)).
fn collect_heading_text(events: &Events<'_>, i: &mut usize) -> String {
    let mut text = String::new();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::Heading(_)) => {
                *i += 1;
                break;
            }
            Event::Text(s) | Event::Code(s) => {
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    text
}

/// Strip leading/trailing whitespace, collapse interior whitespace.
fn normalize_heading(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_blank(node: &InlineNode) -> bool {
    matches!(node, InlineNode::Text(s) if s.trim().is_empty())
}

fn plain(inlines: &[InlineNode]) -> String {
    Text::new(inlines.to_vec()).plain_text()
}

/// For text that opens with bold, the first line as plain text (bold part
/// plus whatever follows it up to the first line break) and the remainder.
fn strong_heading_line(text: &Text) -> Option<(String, Text)> {
    let inlines = &text.inlines;
    let start = inlines.iter().position(|n| !is_blank(n))?;
    let InlineNode::Strong(children) = &inlines[start] else {
        return None;
    };

    let mut line = plain(children);
    let mut idx = start + 1;
    while idx < inlines.len() {
        let node = &inlines[idx];
        idx += 1;
        if matches!(node, InlineNode::SoftBreak | InlineNode::HardBreak) {
            break;
        }
        line.push_str(&plain(std::slice::from_ref(node)));
    }

    Some((
        normalize_heading(&line),
        Text::new(inlines[idx..].to_vec()).trimmed(),
    ))
}

/// `**Name**: rest` or `**Name** - rest`.
fn leading_strong(text: &Text) -> Option<(String, Text)> {
    let inlines = &text.inlines;
    let start = inlines.iter().position(|n| !is_blank(n))?;
    let InlineNode::Strong(children) = &inlines[start] else {
        return None;
    };
    let name = plain(children);
    let name = name.trim().trim_end_matches(':').trim();
    if name.is_empty() {
        return None;
    }

    let mut rest = inlines[start + 1..].to_vec();
    if let Some(InlineNode::Text(s)) = rest.first_mut() {
        *s = s
            .trim_start()
            .trim_start_matches([':', '-', '\u{2013}', '\u{2014}'])
            .to_string();
    }
    Some((name.to_string(), Text::new(rest).trimmed()))
}

/// Split `Key: value` (or `**Key**: value`, `**Key:** value`). The key keeps its
/// original case. Long or punctuated prefixes are prose, not keys.
fn split_key(text: &Text) -> Option<(String, Text)> {
    let inlines = &text.inlines;
    match inlines.first()? {
        InlineNode::Strong(children) => {
            let key = plain(children);
            let key = key.trim();
            if let Some(key) = key.strip_suffix(':') {
                return is_key(key.trim()).then(|| {
                    (key.trim().to_string(), Text::new(inlines[1..].to_vec()).trimmed())
                });
            }
            let InlineNode::Text(next) = inlines.get(1)? else {
                return None;
            };
            let after = next.trim_start().strip_prefix(':')?;
            if !is_key(key) {
                return None;
            }
            let mut value = vec![InlineNode::Text(after.to_string())];
            value.extend_from_slice(&inlines[2..]);
            Some((key.to_string(), Text::new(value).trimmed()))
        }
        InlineNode::Text(s) => {
            let pos = s.find(':')?;
            let key = s[..pos].trim();
            if !is_key(key) {
                return None;
            }
            let mut value = vec![InlineNode::Text(s[pos + 1..].to_string())];
            value.extend_from_slice(&inlines[1..]);
            Some((key.to_string(), Text::new(value).trimmed()))
        }
        _ => None,
    }
}

fn is_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 24
        && key
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '/' | '\'' | '.'))
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split([',', ';', '&'])
        .flat_map(|part| part.split(" and "))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Depth-first list of item texts: each item, then its nested items.
fn flatten(items: Vec<ListItem>) -> Vec<Text> {
    let mut out = Vec::new();
    for item in items {
        if !item.text.is_empty() {
            out.push(item.text);
        }
        out.extend(flatten(item.children));
    }
    out
}
