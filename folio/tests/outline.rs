use folio::Outline;
use folio::act::ChapterTag;
use folio::parser::ParseError;
use folio::validate::{ValidationOptions, validate};
use pretty_assertions::assert_eq;

const SAMPLE: &str = "\
# The Gate of Rain

## Act I: Leaving

### Chapter 1: The Monastery Gate (Kyoto, 1968)

- Genre: literary realism
- POV: first person, Hana
- Fetter: self-view
- Characters: Hana, the Abbot
- Hana mistakes stillness for emptiness

**Chapter 2: Rain on the Roof** (Kyoto, autumn 1968)

- Lesson: impermanence
- Characters: Hana and Kenji
- The first *real* argument

## Act II: Return

- **Chapter 3: The Ferry** (Inland Sea, 1971)
  - Genre: road novel
  - Kenji's letters arrive late

## Character Arcs

### Hana

- Clings to a fixed self
- Learns that grief moves

**Kenji**: from certainty to doubt

- **The Abbot**
  - Remains a mirror, never a guide

## Themes

- Impermanence
- Stream-entry as an ordinary event

## Writing Approach

- Present tense for Act II
- Short chapters, long silences
";

fn parse(source: &str) -> Result<Outline, Vec<ParseError>> {
    folio::parser::Parser::new(source.to_string(), 0).parse()
}

fn codes(diagnostics: &[ParseError]) -> Vec<&'static str> {
    diagnostics.iter().filter_map(|d| d.code).collect()
}

#[test]
fn parses_acts_and_chapters() {
    let outline = parse(SAMPLE).expect("parse failed");
    assert_eq!(outline.title.as_deref(), Some("The Gate of Rain"));
    assert_eq!(outline.acts.len(), 2);

    let act = &outline.acts[0];
    assert_eq!(act.ordinal, 1);
    assert_eq!(act.label, "I");
    assert_eq!(act.title.as_deref(), Some("Leaving"));
    assert_eq!(act.chapters.len(), 2);

    let first = &act.chapters[0];
    assert_eq!(first.ordinal, 1);
    assert_eq!(first.title.as_deref(), Some("The Monastery Gate"));
    assert_eq!(first.setting.as_deref(), Some("Kyoto, 1968"));
    assert_eq!(first.genre.as_deref(), Some("literary realism"));
    assert_eq!(first.pov.as_deref(), Some("first person, Hana"));
    assert_eq!(first.tag(), Some(ChapterTag::Fetter("self-view")));
    assert_eq!(first.characters, vec!["Hana", "the Abbot"]);
    assert_eq!(first.notes.len(), 1);
    assert_eq!(first.notes[0].plain_text(), "Hana mistakes stillness for emptiness");
}

#[test]
fn bold_paragraph_and_bullet_chapters() {
    let outline = parse(SAMPLE).expect("parse failed");

    let second = &outline.acts[0].chapters[1];
    assert_eq!(second.ordinal, 2);
    assert_eq!(second.title.as_deref(), Some("Rain on the Roof"));
    assert_eq!(second.setting.as_deref(), Some("Kyoto, autumn 1968"));
    assert_eq!(second.tag(), Some(ChapterTag::Lesson("impermanence")));
    assert_eq!(second.characters, vec!["Hana", "Kenji"]);
    assert_eq!(second.notes[0].to_string(), "The first *real* argument");

    let third = &outline.acts[1].chapters[0];
    assert_eq!(third.ordinal, 3);
    assert_eq!(third.setting.as_deref(), Some("Inland Sea, 1971"));
    assert_eq!(third.genre.as_deref(), Some("road novel"));
    assert_eq!(third.notes.len(), 1);
}

#[test]
fn parses_characters_themes_and_approach() {
    let outline = parse(SAMPLE).expect("parse failed");

    let names: Vec<&str> = outline.characters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Hana", "Kenji", "The Abbot"]);
    assert_eq!(outline.characters[0].arc.len(), 2);
    assert_eq!(outline.characters[1].arc[0].plain_text(), "from certainty to doubt");
    assert_eq!(
        outline.characters[2].arc[0].plain_text(),
        "Remains a mirror, never a guide"
    );

    let themes: Vec<String> = outline.themes.iter().map(|t| t.label.plain_text()).collect();
    assert_eq!(themes, vec!["Impermanence", "Stream-entry as an ordinary event"]);
    assert_eq!(outline.approach.len(), 2);
}

#[test]
fn sample_outline_is_clean() {
    let outline = parse(SAMPLE).expect("parse failed");
    let diagnostics = validate(&outline, &ValidationOptions::default());
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics);
}

#[test]
fn canonical_rendering_parses_back_to_the_same_outline() {
    let outline = parse(SAMPLE).expect("parse failed");
    let rendered = outline.to_string();
    let reparsed = parse(&rendered).expect("rendered outline failed to parse");
    assert_eq!(reparsed.to_string(), rendered);
    assert_eq!(
        chapter_summaries(&reparsed),
        chapter_summaries(&outline),
    );
}

/// Compare outlines without spans: the canonical text moves things around.
fn chapter_summaries(outline: &Outline) -> Vec<String> {
    outline
        .chapters()
        .map(|c| {
            format!(
                "{}|{:?}|{:?}|{:?}|{:?}|{:?}|{:?}|{}",
                c.ordinal, c.title, c.setting, c.genre, c.pov, c.lesson, c.fetter,
                c.characters.join(",")
            )
        })
        .collect()
}

#[test]
fn chapter_outside_act_is_an_error() {
    let errors = parse("# T\n\n### Chapter 1: Lost (Nowhere)\n").unwrap_err();
    assert_eq!(codes(&errors), vec!["chapter-outside-act"]);
}

#[test]
fn unreadable_ordinals_are_all_reported() {
    let errors = parse("## Act Zero\n\n### Chapter Prime (x)\n\n### Chapter Omega (y)\n").unwrap_err();
    assert_eq!(
        codes(&errors),
        vec!["act-ordinal", "chapter-ordinal", "chapter-ordinal"]
    );
    assert!(errors[1].message.contains("`Prime`"));
}

#[test]
fn chapter_zero_is_not_an_ordinal() {
    let errors = parse("## Act I\n\n### Chapter 0: Prologue (Kyoto)\n").unwrap_err();
    assert_eq!(codes(&errors), vec!["chapter-ordinal"]);
}

#[test]
fn chapter_ordinals_must_increase_within_an_act() {
    let source = "\
## Act I

### Chapter 2 (a)

### Chapter 1 (b)

### Chapter 2 (c)

## Act II

### Chapter 1 (d)
";
    let outline = parse(source).expect("parse failed");
    let diagnostics = validate(&outline, &ValidationOptions::default());
    assert_eq!(
        codes(&diagnostics),
        vec!["chapter-ordinal-order", "chapter-ordinal-duplicate"]
    );
    let duplicate = &diagnostics[1];
    assert_eq!(duplicate.secondary.len(), 1);
    assert_eq!(source[duplicate.secondary[0].0.clone()].trim_end(), "### Chapter 2 (a)");
}

#[test]
fn missing_setting_severity_follows_options() {
    let outline = parse("## Act I\n\n### Chapter 1: Bare\n").expect("parse failed");

    let lenient = validate(&outline, &ValidationOptions::default());
    assert_eq!(codes(&lenient), vec!["chapter-missing-setting"]);
    assert!(!lenient[0].is_error());

    let strict = validate(&outline, &ValidationOptions { require_setting: true });
    assert!(strict[0].is_error());
}

#[test]
fn setting_bullet_satisfies_the_setting_check() {
    let outline = parse("## Act I\n\n### Chapter 1\n\n- Setting: a ferry, 1971\n").expect("parse failed");
    assert_eq!(outline.acts[0].chapters[0].setting.as_deref(), Some("a ferry, 1971"));
    assert!(validate(&outline, &ValidationOptions::default()).is_empty());
}

#[test]
fn second_setting_bullet_is_kept_as_a_note() {
    let outline = parse("## Act I\n\n### Chapter 1 (Kyoto)\n\n- Setting: the temple gate at dusk\n")
        .expect("parse failed");
    let chapter = &outline.acts[0].chapters[0];
    assert_eq!(chapter.setting.as_deref(), Some("Kyoto"));
    assert_eq!(chapter.notes.len(), 1);
    assert_eq!(chapter.notes[0].plain_text(), "Setting: the temple gate at dusk");
}

#[test]
fn bold_chapter_words_in_prose_are_not_headings() {
    let outline = parse("## Act I\n\n### Chapter 1 (Kyoto)\n\n- **Chapter arc:** Hana learns to stay\n")
        .expect("bold bullet inside a chapter should parse");
    let chapter = &outline.acts[0].chapters[0];
    assert_eq!(outline.acts[0].chapters.len(), 1);
    assert_eq!(chapter.notes.len(), 1);
    assert_eq!(chapter.notes[0].plain_text(), "Chapter arc: Hana learns to stay");

    let outline = parse("## Act I\n\n### Chapter 1 (x)\n\n## Writing Approach\n\n**Chapter length**: keep them short.\n")
        .expect("bold paragraph in the approach section should parse");
    assert_eq!(outline.approach.len(), 1);
    assert_eq!(outline.approach[0].plain_text(), "Chapter length: keep them short.");
}

#[test]
fn sub_headings_stay_inside_the_chapter() {
    let source = "\
## Act I

### Chapter 1: Gate (Kyoto)

#### Beats

- Hana waits at the gate
- POV: Hana

### Chapter 2: Rain (Kyoto)
";
    let outline = parse(source).expect("parse failed");
    let chapters = &outline.acts[0].chapters;
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[0].pov.as_deref(), Some("Hana"));
    let notes: Vec<_> = chapters[0].notes.iter().map(|n| n.plain_text()).collect();
    assert_eq!(notes, vec!["Beats", "Hana waits at the gate"]);
    assert!(chapters[1].notes.is_empty());
}

#[test]
fn reports_unknown_characters_tag_conflicts_and_empty_acts() {
    let source = "\
## Act I

### Chapter 1 (x)

- Lesson: patience
- Fetter: doubt
- Characters: Hana, Ghost

## Act II

## Characters

- **Hana**: lead
- **hana**: again
";
    let outline = parse(source).expect("parse failed");
    let diagnostics = validate(&outline, &ValidationOptions::default());
    assert_eq!(
        codes(&diagnostics),
        vec![
            "chapter-tag-conflict",
            "unknown-character",
            "act-empty",
            "character-duplicate",
        ]
    );
    assert!(diagnostics.iter().all(|d| !d.is_error()));
    assert!(diagnostics[1].message.contains("`Ghost`"));
}

#[test]
fn acts_out_of_order() {
    let outline = parse("## Act II\n\n### Chapter 1 (x)\n\n## Act I\n\n### Chapter 1 (y)\n")
        .expect("parse failed");
    let diagnostics = validate(&outline, &ValidationOptions::default());
    assert_eq!(codes(&diagnostics), vec!["act-ordinal-order"]);
}
