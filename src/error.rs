use std::path::PathBuf;

use thiserror::Error;

use crate::edit::EditError;
use crate::file::FileError;

/// Errors that abort a run
///
/// Nothing below the binary catches these; `main` prints them prefixed with
/// `Error: ` and exits with status 1.
#[derive(Debug, Error)]
pub enum FixError {
    /// The configuration path does not exist on disk
    #[error("tsconfig not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration failed to parse or to produce a file set.
    /// Carries the formatted compiler diagnostics.
    #[error("{0}")]
    ConfigInvalid(String),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Edit(#[from] EditError),

    /// A file changed on disk after it was compiled
    #[error("{} changed on disk since it was checked; rerun to pick up the new content", .path.display())]
    StaleFile { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_includes_path() {
        let err = FixError::ConfigNotFound(PathBuf::from("/work/tsconfig.json"));
        assert_eq!(err.to_string(), "tsconfig not found: /work/tsconfig.json");
    }

    #[test]
    fn config_invalid_is_the_diagnostic_text() {
        let err = FixError::ConfigInvalid("error TS18003: No inputs were found.\n".to_string());
        assert!(err.to_string().starts_with("error TS18003"));
    }

    #[test]
    fn file_errors_pass_through() {
        let err = FixError::from(FileError::NotFound(PathBuf::from("/x.ts")));
        assert_eq!(err.to_string(), "File not found: /x.ts");
    }
}
