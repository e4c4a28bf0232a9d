use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use folio::parser::ParseError;
use folio::validate::{ValidationOptions, validate};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedDiagnostic {
    /// Substring that must appear in the diagnostic message.
    pub contains: String,

    /// If set, the diagnostic's span must start on this 1-based source line.
    #[serde(default)]
    pub line: Option<usize>,

    /// If set, the diagnostic must carry this rule code.
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    pub description: Option<String>,

    /// The outline must fail to parse. `expect_errors`, if present, is checked
    /// against the parse errors.
    pub expect_parse_error: bool,

    /// Expected errors in source order. If present (even empty), the error
    /// count and content are checked.
    pub expect_errors: Option<Vec<ExpectedDiagnostic>>,

    /// Expected warnings in source order, checked like `expect_errors`.
    pub expect_warnings: Option<Vec<ExpectedDiagnostic>>,

    /// Validate with missing settings reported as errors.
    pub require_setting: bool,
}

/// Split a `.test.md` file into its TOML config and outline source.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + 4..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: TestConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(".test.md"))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description, reason| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };
    let description = config.description.clone();

    let outcome = match check_outline(&config, source) {
        None => TestOutcome::Pass,
        Some(reason) => TestOutcome::Fail(reason),
    };
    debug!(test = %path.display(), passed = matches!(outcome, TestOutcome::Pass), "ran test");
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Parse and validate `source` against the expectations. Returns `Some(reason)`
/// on mismatch.
fn check_outline(config: &TestConfig, source: &str) -> Option<String> {
    let parse_result = folio::parser::Parser::new(source.to_string(), 0).parse();

    if config.expect_parse_error {
        return match parse_result {
            Ok(_) => Some("expected parse error, but parsing succeeded".into()),
            Err(errors) => config
                .expect_errors
                .as_ref()
                .and_then(|expected| check_diagnostics("error", source, &errors, expected)),
        };
    }

    let outline = match parse_result {
        Ok(outline) => outline,
        Err(errors) => {
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Some(format!("unexpected parse error: {}", msgs.join("; ")));
        }
    };

    let options = ValidationOptions {
        require_setting: config.require_setting,
    };
    let (errors, warnings): (Vec<ParseError>, Vec<ParseError>) = validate(&outline, &options)
        .into_iter()
        .partition(ParseError::is_error);

    match &config.expect_errors {
        Some(expected) => {
            if let Some(reason) = check_diagnostics("error", source, &errors, expected) {
                return Some(reason);
            }
        }
        None if !errors.is_empty() => {
            let msgs: Vec<String> = errors.iter().map(|e| format!("  - {}", e)).collect();
            return Some(format!("unexpected errors:\n{}", msgs.join("\n")));
        }
        None => {}
    }

    config
        .expect_warnings
        .as_ref()
        .and_then(|expected| check_diagnostics("warning", source, &warnings, expected))
}

/// Convert a byte offset in `source` to a 1-based line number.
fn byte_offset_to_line(source: &str, offset: usize) -> usize {
    source[..offset.min(source.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Check that actual diagnostics match expectations one to one.
fn check_diagnostics(
    kind: &str,
    source: &str,
    actual: &[ParseError],
    expected: &[ExpectedDiagnostic],
) -> Option<String> {
    if actual.len() != expected.len() {
        let actual_msgs: Vec<String> = actual.iter().map(|d| format!("  - {}", d)).collect();
        return Some(format!(
            "expected {} {}(s), got {}\n  actual {}s:\n{}",
            expected.len(),
            kind,
            actual.len(),
            kind,
            if actual_msgs.is_empty() {
                "    (none)".to_string()
            } else {
                actual_msgs.join("\n")
            }
        ));
    }

    for (i, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        if !actual.message.contains(&expected.contains) {
            return Some(format!(
                "{}[{}]: expected message containing \"{}\", got: {}",
                kind, i, expected.contains, actual.message
            ));
        }

        if let Some(code) = &expected.code {
            if actual.code != Some(code.as_str()) {
                return Some(format!(
                    "{}[{}]: expected code {}, got {}",
                    kind,
                    i,
                    code,
                    actual.code.unwrap_or("(none)")
                ));
            }
        }

        if let Some(expected_line) = expected.line {
            let actual_line = byte_offset_to_line(source, actual.span.start);
            if actual_line != expected_line {
                return Some(format!(
                    "{}[{}]: expected on line {}, but span is on line {}",
                    kind, i, expected_line, actual_line
                ));
            }
        }
    }

    None
}

/// `.test.md` files under a directory, keyed by their folder relative to it.
/// Files directly in the directory have the empty category.
struct Suite {
    categories: BTreeMap<String, Vec<PathBuf>>,
}

impl Suite {
    fn discover(root: &Path) -> Suite {
        let mut suite = Suite {
            categories: BTreeMap::new(),
        };
        suite.walk(root, root);
        suite.categories.values_mut().for_each(|files| files.sort());
        suite
    }

    fn walk(&mut self, dir: &Path, root: &Path) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            debug!(dir = %dir.display(), "cannot list test directory");
            return;
        };
        for path in entries.filter_map(Result::ok).map(|e| e.path()) {
            if path.is_dir() {
                self.walk(&path, root);
                continue;
            }
            let is_test = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.ends_with(".test.md"));
            if is_test {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                self.categories.entry(category).or_default().push(path);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Categories matching `requested` by name or parent folder; all of them
    /// when nothing is requested. Unknown names are reported and skipped.
    fn select(&self, requested: &[String]) -> Vec<(&str, &[PathBuf])> {
        let mut selected: BTreeMap<&str, &[PathBuf]> = BTreeMap::new();
        if requested.is_empty() {
            selected.extend(self.categories.iter().map(|(k, v)| (k.as_str(), v.as_slice())));
        }
        for name in requested {
            let name = name.trim_matches('/');
            let prefix = format!("{}/", name);
            let matches: Vec<(&str, &[PathBuf])> = self
                .categories
                .iter()
                .filter(|(cat, _)| *cat == name || cat.starts_with(&prefix))
                .map(|(k, v)| (k.as_str(), v.as_slice()))
                .collect();
            if matches.is_empty() {
                let known: Vec<&str> = self.categories.keys().map(|k| category_label(k)).collect();
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    name,
                    known.join(", ")
                );
            }
            selected.extend(matches);
        }
        selected.into_iter().collect()
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// Print the categories under `path` with their test counts.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let suite = Suite::discover(path);
    if suite.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &suite.categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

fn paint(s: &str, code: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[{}m{}\x1b[0m", code, s)
    }
}

/// Run every fixture under `path` (or the single file it names), limited to
/// `categories` when given. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let single = path.is_file();
    let suite = if single {
        Suite {
            categories: BTreeMap::from([(String::new(), vec![path.to_path_buf()])]),
        }
    } else {
        Suite::discover(path)
    };
    if suite.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return 1;
    }
    let groups = if single {
        suite.select(&[])
    } else {
        suite.select(categories)
    };
    if groups.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in groups {
        if !single {
            eprintln!();
            eprintln!("{}", paint(category_label(category), "1", no_color));
        }

        for file in files {
            let result = run_single_test(file);
            let mark = match result.outcome {
                TestOutcome::Pass => paint("PASS", "32", no_color),
                TestOutcome::Fail(_) => paint("FAIL", "31", no_color),
            };
            eprintln!("  {}  {}", mark, result.label());
            match result.outcome {
                TestOutcome::Pass => passed += 1,
                TestOutcome::Fail(_) => failures.push(result),
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!("test result: {}. {} passed, 0 failed", paint("ok", "32", no_color), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            paint("FAILED", "31", no_color),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = "# Book\n\n## Act I\n\n### Chapter 1: Gate (Kyoto, 1968)\n";

    fn run(config: &str, source: &str) -> Option<String> {
        let file = format!("---\n{}\n---\n{}", config, source);
        let (config, source) = parse_test_file(&file).expect("front matter");
        check_outline(&config, source)
    }

    #[test]
    fn splits_front_matter() {
        let (config, source) =
            parse_test_file("\u{feff}---\r\ndescription = \"x\"\r\n---\r\n# Book\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(source, "# Book\n");

        assert!(parse_test_file("# Book\n").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
        assert!(parse_test_file("---\nexpect_output = \"x\"\n---\n").is_err());
    }

    #[test]
    fn clean_outline_passes_with_empty_expectations() {
        assert_eq!(run("expect_errors = []\nexpect_warnings = []", CLEAN), None);
    }

    #[test]
    fn warnings_are_matched_by_line_and_code() {
        let source = "# Book\n\n## Act I\n\n### Chapter 1: Gate\n";
        let expected = "expect_warnings = [{ contains = \"setting\", line = 5, code = \"chapter-missing-setting\" }]";
        assert_eq!(run(expected, source), None);

        let wrong_line = "expect_warnings = [{ contains = \"setting\", line = 4 }]";
        let reason = run(wrong_line, source).unwrap();
        assert!(reason.contains("expected on line 4"), "{reason}");

        let reason = run("require_setting = true", source).unwrap();
        assert!(reason.starts_with("unexpected errors"), "{reason}");
    }

    #[test]
    fn parse_errors() {
        let source = "# Book\n\n### Chapter 1: Gate (Kyoto)\n";
        assert_eq!(
            run(
                "expect_parse_error = true\nexpect_errors = [{ contains = \"act\", code = \"chapter-outside-act\" }]",
                source
            ),
            None
        );
        let reason = run("", source).unwrap();
        assert!(reason.starts_with("unexpected parse error"), "{reason}");

        let reason = run("expect_parse_error = true", CLEAN).unwrap();
        assert!(reason.contains("parsing succeeded"), "{reason}");
    }
}
