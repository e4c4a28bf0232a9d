use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ManuscriptError {
    #[error("root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("no chapters found in {}; chapter folders are named `NN-Chapter Title`", .0.display())]
    NoChapters(PathBuf),

    #[error("no scenes found in {} (expecting chNN-scMM.md under NN-... folders)", .0.display())]
    NoScenes(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ManuscriptError {
    /// Process exit code for the command-line tools: 2 when the manuscript
    /// root is missing, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            ManuscriptError::RootNotFound(_) => 2,
            _ => 1,
        }
    }
}
