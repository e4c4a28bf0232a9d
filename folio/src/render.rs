use std::fmt;

use crate::Outline;
use crate::act::{Act, Chapter};

// Canonical outline text. Parsing the rendered text yields the same outline.

impl fmt::Display for Outline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sections: Vec<String> = Vec::new();

        if let Some(title) = &self.title {
            sections.push(format!("# {}\n", title));
        }
        for act in &self.acts {
            sections.push(act.to_string());
        }
        if !self.characters.is_empty() {
            let mut s = String::from("## Character Arcs\n");
            for character in &self.characters {
                s.push_str(&format!("\n### {}\n", character.name));
                if !character.arc.is_empty() {
                    s.push('\n');
                    for note in &character.arc {
                        s.push_str(&format!("- {}\n", note));
                    }
                }
            }
            sections.push(s);
        }
        if !self.themes.is_empty() {
            let mut s = String::from("## Themes\n\n");
            for theme in &self.themes {
                s.push_str(&format!("- {}\n", theme.label));
            }
            sections.push(s);
        }
        if !self.approach.is_empty() {
            let mut s = String::from("## Writing Approach\n\n");
            for note in &self.approach {
                s.push_str(&format!("- {}\n", note));
            }
            sections.push(s);
        }

        write!(f, "{}", sections.join("\n"))
    }
}

impl fmt::Display for Act {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## {}", self.heading())?;
        for chapter in &self.chapters {
            writeln!(f)?;
            write!(f, "{}", chapter)?;
        }
        Ok(())
    }
}

impl fmt::Display for Chapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "### {}", self.heading())?;

        let mut bullets: Vec<String> = Vec::new();
        if let Some(genre) = &self.genre {
            bullets.push(format!("Genre: {}", genre));
        }
        if let Some(pov) = &self.pov {
            bullets.push(format!("POV: {}", pov));
        }
        if let Some(lesson) = &self.lesson {
            bullets.push(format!("Lesson: {}", lesson));
        }
        if let Some(fetter) = &self.fetter {
            bullets.push(format!("Fetter: {}", fetter));
        }
        if !self.characters.is_empty() {
            bullets.push(format!("Characters: {}", self.characters.join(", ")));
        }
        bullets.extend(self.notes.iter().map(|n| n.to_string()));

        if !bullets.is_empty() {
            writeln!(f)?;
            for bullet in bullets {
                writeln!(f, "- {}", bullet)?;
            }
        }
        Ok(())
    }
}
