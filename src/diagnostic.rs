//! Compiler diagnostics and their text rendering.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::paths::{relative_to, to_slash};
use crate::position::byte_to_position;

/// `'{0}' is a type and must be imported using a type-only import when 'verbatimModuleSyntax' is enabled.`
pub const TYPE_ONLY_IMPORT: u32 = 1484;
/// `'{0}' resolves to a type-only declaration and must be imported using a type-only import ...`
pub const TYPE_ONLY_ALIAS_IMPORT: u32 = 1485;
/// `Re-exporting a type when 'verbatimModuleSyntax' is enabled requires using 'export type'.`
pub const TYPE_ONLY_REEXPORT: u32 = 1205;
/// `'{0}' resolves to a type-only declaration and must be re-exported using a type-only re-export ...`
pub const TYPE_ONLY_ALIAS_REEXPORT: u32 = 1448;
/// Generic syntax error.
pub const SYNTAX_ERROR: u32 = 1005;
/// `Module '{0}' has no default export.`
pub const NO_DEFAULT_EXPORT: u32 = 1192;
/// `Cannot find name '{0}'.`
pub const CANNOT_FIND_NAME: u32 = 2304;
/// `Module '{0}' has no exported member '{1}'.`
pub const NO_EXPORTED_MEMBER: u32 = 2305;
/// `Cannot find module '{0}' or its corresponding type declarations.`
pub const CANNOT_FIND_MODULE: u32 = 2307;
/// `Compiler option '{0}' requires a value of type {1}.`
pub const OPTION_TYPE_MISMATCH: u32 = 5024;
/// `The root value of a '{0}' file must be an object.`
pub const ROOT_NOT_OBJECT: u32 = 5092;
/// `File '{0}' not found.`
pub const FILE_NOT_FOUND: u32 = 6053;
/// `Circularity detected while resolving configuration: {0}`
pub const CIRCULAR_EXTENDS: u32 = 18000;
/// `The 'files' list in config file '{0}' is empty.`
pub const EMPTY_FILES_LIST: u32 = 18002;
/// `No inputs were found in config file '{0}'. ...`
pub const NO_INPUTS: u32 = 18003;

/// A file loaded into the compilation, shared by every diagnostic in it
#[derive(Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute, normalized path
    pub path: PathBuf,
    /// Full file contents
    pub text: String,
}

impl SourceFile {
    pub fn new(path: PathBuf, text: String) -> Arc<Self> {
        Arc::new(Self { path, text })
    }
}

/// A structured finding emitted by the compiler
///
/// `start` and `length` are byte offsets into `file.text`, and
/// `start + length <= file.text.len()` always holds.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Classification code (the `TS` number)
    pub code: u32,
    /// File the diagnostic points into, `None` for global diagnostics
    pub file: Option<Arc<SourceFile>>,
    /// Starting byte offset
    pub start: usize,
    /// Length in bytes
    pub length: usize,
    /// Rendered message
    pub message: String,
}

impl Diagnostic {
    /// Diagnostic attached to a span of a file
    pub fn in_file(
        code: u32,
        file: &Arc<SourceFile>,
        start: usize,
        length: usize,
        message: impl Into<String>,
    ) -> Self {
        debug_assert!(start + length <= file.text.len());
        Self {
            code,
            file: Some(Arc::clone(file)),
            start,
            length,
            message: message.into(),
        }
    }

    /// Diagnostic not tied to any file
    pub fn global(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            file: None,
            start: 0,
            length: 0,
            message: message.into(),
        }
    }

    /// Path of the owning file, if any
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref().map(|file| file.path.as_path())
    }

    /// Source text covered by the diagnostic's span
    pub fn span_text(&self) -> &str {
        match &self.file {
            Some(file) => &file.text[self.start..self.start + self.length],
            None => "",
        }
    }
}

/// Sort diagnostics into a stable order and drop exact duplicates
///
/// Global diagnostics come first, then by file name, start, length, code and
/// message. File names compare as slash-separated strings, so `src/foo.ts`
/// sorts before `src/foo/bar.ts`.
pub fn sort_and_dedup(diagnostics: &mut Vec<Diagnostic>) {
    fn key(d: &Diagnostic) -> (Option<String>, usize, usize, u32, String) {
        (d.path().map(to_slash), d.start, d.length, d.code, d.message.clone())
    }
    diagnostics.sort_by_cached_key(key);
    diagnostics.dedup_by(|a, b| {
        a.path() == b.path()
            && (a.start, a.length, a.code) == (b.start, b.length, b.code)
            && a.message == b.message
    });
}

/// Render a diagnostic the way `tsc` prints it
///
/// `path(line,col): error TS1234: message`, with the path made relative to
/// `cwd`. Global diagnostics drop the location prefix.
pub fn format_diagnostic(diagnostic: &Diagnostic, cwd: &Path) -> String {
    let mut out = String::new();
    if let Some(file) = &diagnostic.file {
        let position = byte_to_position(&file.text, diagnostic.start);
        let _ = write!(
            out,
            "{}({},{}): ",
            relative_to(&file.path, cwd).display(),
            position.line,
            position.column
        );
    }
    let _ = writeln!(out, "error TS{}: {}", diagnostic.code, diagnostic.message);
    out
}

/// Render several diagnostics, one per line
pub fn format_diagnostics(diagnostics: &[Diagnostic], cwd: &Path) -> String {
    diagnostics
        .iter()
        .map(|diagnostic| format_diagnostic(diagnostic, cwd))
        .collect()
}
