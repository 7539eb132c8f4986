// Source file classification
pub mod language;

// Byte offsets and line/column positions
pub mod position;

// Lexical path helpers
pub mod paths;

// File I/O
pub mod file;

// Errors
pub mod error;

// Compiler diagnostics
pub mod diagnostic;

// tsconfig.json loading
pub mod jsonc;
pub mod config;

// Compilation: parsing, module resolution, checking
pub mod parse;
pub mod resolve;
pub mod program;
pub mod checker;
pub mod compiler;

// Fixing
pub mod filter;
pub mod edit;
pub mod report;
pub mod pipeline;

// Re-exports
pub use language::{SourceKind, detect_kind};
pub use position::{Position, Span, byte_to_position};
pub use file::{FileContent, FileError, read_file, write_file_atomic};
pub use error::{FixError, Result};
pub use diagnostic::{Diagnostic, SourceFile, format_diagnostic, format_diagnostics};
pub use config::{CompilerOptions, ResolvedConfig};
pub use compiler::{Compiler, NativeCompiler, forced_options};
pub use filter::{FindingKind, filter};
pub use edit::{
    EditError, FileEditSet, Insertion, TYPE_KEYWORD,
    accumulate, apply_insertions, sort_insertions,
};
pub use report::{FileOutcome, Finding, ReportOptions, apply};
pub use pipeline::{RunOptions, run};
