use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use folio::Outline;
use serde::Serialize;
use tracing::debug;

use crate::error::ManuscriptError;
use crate::front_matter::strip_front_matter;
use crate::layout::{self, Naming};
use crate::words::count_words;

#[derive(Debug, Clone, Serialize)]
pub struct SceneCount {
    pub chapter: u32,
    pub scene: u32,
    pub path: PathBuf,
    pub words: usize,
}

/// Scene, chapter and manuscript word totals.
#[derive(Debug, Clone, Serialize)]
pub struct WordCountReport {
    /// Sorted by (chapter, scene, file name).
    pub scenes: Vec<SceneCount>,
    /// Print scene file paths in the `Display` output.
    #[serde(skip)]
    pub show_paths: bool,
}

impl WordCountReport {
    /// Count every scene under `root`. Front matter is not counted.
    pub fn collect(root: &Path) -> Result<Self, ManuscriptError> {
        let chapters = layout::discover(root, Naming::Lenient)?;

        let mut scenes = Vec::new();
        for scene in chapters.into_iter().flat_map(|c| c.scenes) {
            let text = layout::read_lossy(&scene.path)?;
            let words = count_words(strip_front_matter(&text));
            debug!(scene = %scene.path.display(), words, "counted");
            scenes.push(SceneCount {
                chapter: scene.chapter,
                scene: scene.number,
                path: scene.path,
                words,
            });
        }
        if scenes.is_empty() {
            return Err(ManuscriptError::NoScenes(root.to_path_buf()));
        }

        scenes.sort_by(|a, b| {
            (a.chapter, a.scene, a.path.file_name()).cmp(&(b.chapter, b.scene, b.path.file_name()))
        });
        Ok(WordCountReport {
            scenes,
            show_paths: false,
        })
    }

    pub fn with_paths(mut self, show_paths: bool) -> Self {
        self.show_paths = show_paths;
        self
    }

    /// Scenes grouped by the chapter number in their file names.
    pub fn chapters(&self) -> BTreeMap<u32, Vec<&SceneCount>> {
        let mut chapters: BTreeMap<u32, Vec<&SceneCount>> = BTreeMap::new();
        for scene in &self.scenes {
            chapters.entry(scene.chapter).or_default().push(scene);
        }
        chapters
    }

    /// Word totals per chapter number.
    pub fn chapter_totals(&self) -> BTreeMap<u32, usize> {
        let mut totals = BTreeMap::new();
        for scene in &self.scenes {
            *totals.entry(scene.chapter).or_insert(0) += scene.words;
        }
        totals
    }

    pub fn total(&self) -> usize {
        self.scenes.iter().map(|s| s.words).sum()
    }
}

impl fmt::Display for WordCountReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scene counts:")?;
        for (chapter, scenes) in self.chapters() {
            for scene in &scenes {
                write!(
                    f,
                    "Chapter {:02} / Scene {:02}: {}",
                    scene.chapter, scene.scene, scene.words
                )?;
                if self.show_paths {
                    write!(f, "  -  {}", scene.path.to_string_lossy().replace('\\', "/"))?;
                }
                writeln!(f)?;
            }
            let total: usize = scenes.iter().map(|s| s.words).sum();
            writeln!(f, "Chapter {:02} total: {}", chapter, total)?;
            writeln!(f)?;
        }
        writeln!(f, "Manuscript total: {}", self.total())
    }
}

/// One outline chapter and what has been drafted for it.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterProgress {
    /// 1-based position across all acts; matched to the manuscript's chapter
    /// numbers.
    pub position: u32,
    pub act: String,
    pub heading: String,
    /// `None` when no scene of this chapter exists yet.
    pub words: Option<usize>,
}

/// Outline chapters lined up against the drafted manuscript.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub chapters: Vec<ChapterProgress>,
    /// Drafted chapter numbers beyond the outline, with their word totals.
    pub unplanned: Vec<(u32, usize)>,
    pub total_words: usize,
}

impl ProgressReport {
    pub fn build(outline: &Outline, counts: &WordCountReport) -> Self {
        let totals = counts.chapter_totals();

        let mut chapters = Vec::new();
        let mut position = 0u32;
        for act in &outline.acts {
            for chapter in &act.chapters {
                position += 1;
                chapters.push(ChapterProgress {
                    position,
                    act: act.label.clone(),
                    heading: chapter.heading(),
                    words: totals.get(&position).copied(),
                });
            }
        }

        let unplanned = totals
            .iter()
            .filter(|(number, _)| **number == 0 || **number > position)
            .map(|(number, words)| (*number, *words))
            .collect();

        ProgressReport {
            chapters,
            unplanned,
            total_words: counts.total(),
        }
    }

    pub fn drafted(&self) -> usize {
        self.chapters.iter().filter(|c| c.words.is_some()).count()
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chapter in &self.chapters {
            write!(f, "{:>3}. Act {} / {}: ", chapter.position, chapter.act, chapter.heading)?;
            match chapter.words {
                Some(words) => writeln!(f, "{} words", words)?,
                None => writeln!(f, "not drafted")?,
            }
        }
        for (number, words) in &self.unplanned {
            writeln!(f, "Chapter {:02} is drafted ({} words) but not in the outline", number, words)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Drafted chapters: {} of {}",
            self.drafted(),
            self.chapters.len()
        )?;
        writeln!(f, "Manuscript total: {}", self.total_words)
    }
}
