use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Content of a file read into memory
#[derive(Debug, Clone)]
pub struct FileContent {
    /// Path the file was read from
    pub path: PathBuf,
    /// File content as valid UTF-8 string
    pub content: String,
    /// BLAKE3 hash of the content (hex-encoded)
    pub checksum: String,
}

/// Error types for file operations
#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid UTF-8 in file: {}", .0.display())]
    InvalidUtf8(PathBuf),
}

/// Hex-encoded BLAKE3 checksum of some text
pub fn checksum(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Read a file from disk with UTF-8 validation
///
/// # Arguments
/// * `path` - Path to the file to read
///
/// # Returns
/// * `Ok(FileContent)` - File content with checksum
/// * `Err(FileError)` - File not found, I/O error, or invalid UTF-8
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<FileContent, FileError> {
    let path_ref = path.as_ref();

    let bytes = fs::read(path_ref).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            FileError::NotFound(path_ref.to_path_buf())
        } else {
            FileError::Io {
                path: path_ref.to_path_buf(),
                source,
            }
        }
    })?;

    let content =
        String::from_utf8(bytes).map_err(|_| FileError::InvalidUtf8(path_ref.to_path_buf()))?;
    let checksum = checksum(&content);

    Ok(FileContent {
        path: path_ref.to_path_buf(),
        content,
        checksum,
    })
}

/// Replace a file's contents atomically
///
/// Writes to a uniquely named sibling and renames it over the target, so a
/// reader never observes a half-written file. Permissions of an existing
/// target are carried over.
pub fn write_file_atomic(path: &Path, content: &str) -> Result<(), FileError> {
    let io_err = |source: io::Error| FileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = dir.join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

    let result = (|| {
        let mut temp = fs::File::create(&temp_path)?;
        temp.write_all(content.as_bytes())?;
        temp.sync_all()?;
        if let Ok(metadata) = fs::metadata(path) {
            fs::set_permissions(&temp_path, metadata.permissions())?;
        }
        fs::rename(&temp_path, path)
    })();

    if let Err(err) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(err));
    }

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(())
}
