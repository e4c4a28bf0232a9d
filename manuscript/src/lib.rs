pub mod compile;
pub mod error;
pub mod front_matter;
pub mod layout;
pub mod report;
pub mod title_page;
pub mod words;

pub use compile::{ChapterBreak, CompileOptions, Compiled, HeadingStyle, SceneSeparator, compile, write_output};
pub use error::ManuscriptError;
pub use report::{ProgressReport, WordCountReport};
