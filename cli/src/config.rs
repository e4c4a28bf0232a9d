//! `folio.toml` project settings. Command-line flags override these.

use std::fs;
use std::path::{Path, PathBuf};

use manuscript::{ChapterBreak, CompileOptions, HeadingStyle, SceneSeparator};
use serde::Deserialize;
use tracing::debug;

/// Looked up in the working directory when `--config` isn't given.
pub const DEFAULT_CONFIG_FILE: &str = "folio.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub outline: OutlineConfig,
    pub manuscript: ManuscriptConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutlineConfig {
    /// Used when a command's outline argument is omitted.
    pub path: Option<PathBuf>,
    /// Report chapters without a setting as errors instead of warnings.
    pub require_setting: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManuscriptConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub include_header: bool,
    pub title_page: bool,
    pub chapter_heading: HeadingStyle,
    pub scene_separator: SceneSeparator,
    pub chapter_break: ChapterBreak,
}

impl Default for ManuscriptConfig {
    fn default() -> Self {
        let options = CompileOptions::default();
        ManuscriptConfig {
            root: PathBuf::from("manuscript"),
            output: PathBuf::from("output/full_manuscript.md"),
            include_header: options.include_header,
            title_page: options.title_page,
            chapter_heading: options.chapter_heading,
            scene_separator: options.scene_separator,
            chapter_break: options.chapter_break,
        }
    }
}

impl ManuscriptConfig {
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            include_header: self.include_header,
            title_page: self.title_page,
            chapter_heading: self.chapter_heading,
            scene_separator: self.scene_separator.clone(),
            chapter_break: self.chapter_break,
        }
    }
}

impl Config {
    /// Load `explicit`, or `folio.toml` from the working directory if present.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    debug!("no {} found; using defaults", DEFAULT_CONFIG_FILE);
                    return Ok(Config::default());
                }
                path
            }
        };

        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = Config::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.manuscript.root, PathBuf::from("manuscript"));
        assert_eq!(config.manuscript.compile_options(), CompileOptions::default());
    }

    #[test]
    fn reads_both_sections() {
        let config = Config::parse(
            r#"
[outline]
path = "plan/outline.md"
require_setting = true

[manuscript]
root = "draft"
title_page = false
chapter_heading = "none"
scene_separator = "~ ~ ~"
chapter_break = "page"
"#,
        )
        .unwrap();

        assert_eq!(config.outline.path, Some(PathBuf::from("plan/outline.md")));
        assert!(config.outline.require_setting);
        assert_eq!(config.manuscript.root, PathBuf::from("draft"));
        assert_eq!(
            config.manuscript.output,
            PathBuf::from("output/full_manuscript.md")
        );

        let options = config.manuscript.compile_options();
        assert!(options.include_header);
        assert!(!options.title_page);
        assert_eq!(options.chapter_heading, HeadingStyle::Omit);
        assert_eq!(
            options.scene_separator,
            SceneSeparator::Literal("~ ~ ~".into())
        );
        assert_eq!(options.chapter_break, ChapterBreak::Page);
    }

    #[test]
    fn rejects_unknown_keys_and_values() {
        assert!(Config::parse("[manuscript]\nchapter_break = \"dots\"\n").is_err());
        assert!(Config::parse("[outline]\nstrict = true\n").is_err());
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("folio.toml");
        assert!(matches!(
            Config::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));

        std::fs::write(&missing, "[manuscript]\nroot = \"book\"\n").unwrap();
        let config = Config::load(Some(&missing)).unwrap();
        assert_eq!(config.manuscript.root, PathBuf::from("book"));
    }
}
