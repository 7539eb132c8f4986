use std::path::Path;

use swc_core::ecma::parser::Syntax;

/// Kind of source file, decided by its extension
///
/// Declaration files (`.d.ts`, `.d.mts`, `.d.cts`) are their own kind
/// because they are loaded for module resolution but never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// TypeScript (.ts, .mts, .cts)
    TypeScript,
    /// TypeScript with JSX (.tsx)
    Tsx,
    /// TypeScript declarations (.d.ts, .d.mts, .d.cts)
    Declaration,
    /// JavaScript (.js, .mjs, .cjs)
    JavaScript,
    /// JavaScript with JSX (.jsx)
    Jsx,
}

/// TypeScript extensions in resolution priority order
pub const TS_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".d.ts"];

/// ESM/CJS flavoured TypeScript extensions
pub const TS_MODULE_EXTENSIONS: &[&str] = &[".mts", ".cts", ".d.mts", ".d.cts"];

/// JavaScript extensions, only used with `allowJs`
pub const JS_EXTENSIONS: &[&str] = &[".js", ".jsx", ".mjs", ".cjs"];

const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts"];

impl SourceKind {
    /// Whether this file is a declaration file
    pub fn is_declaration(&self) -> bool {
        matches!(self, SourceKind::Declaration)
    }

    /// Whether this file is JavaScript
    pub fn is_javascript(&self) -> bool {
        matches!(self, SourceKind::JavaScript | SourceKind::Jsx)
    }

    /// Parser syntax for this kind of file
    pub fn syntax(&self) -> Syntax {
        match self {
            SourceKind::TypeScript | SourceKind::Tsx | SourceKind::Declaration => {
                let mut syntax = Syntax::Typescript(Default::default());
                if let Syntax::Typescript(ts) = &mut syntax {
                    ts.tsx = matches!(self, SourceKind::Tsx);
                    ts.dts = self.is_declaration();
                    ts.decorators = true;
                }
                syntax
            }
            SourceKind::JavaScript | SourceKind::Jsx => {
                let mut syntax = Syntax::Es(Default::default());
                if let Syntax::Es(es) = &mut syntax {
                    es.jsx = true;
                    es.decorators = true;
                }
                syntax
            }
        }
    }
}

/// Detect the source kind from a file path
///
/// Returns `None` for anything the compiler would not load.
///
/// # Examples
/// ```
/// use fix_verbatim_module_syntax::{SourceKind, detect_kind};
/// assert_eq!(detect_kind("index.ts"), Some(SourceKind::TypeScript));
/// assert_eq!(detect_kind("types.d.ts"), Some(SourceKind::Declaration));
/// assert_eq!(detect_kind("README.md"), None);
/// ```
pub fn detect_kind<P: AsRef<Path>>(path: P) -> Option<SourceKind> {
    let name = path.as_ref().file_name()?.to_str()?;

    if DECLARATION_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
        return Some(SourceKind::Declaration);
    }

    let extension = path.as_ref().extension()?.to_str()?;
    match extension {
        "ts" | "mts" | "cts" => Some(SourceKind::TypeScript),
        "tsx" => Some(SourceKind::Tsx),
        "js" | "mjs" | "cjs" => Some(SourceKind::JavaScript),
        "jsx" => Some(SourceKind::Jsx),
        _ => None,
    }
}

/// Extensions a project may include, honouring `allowJs`
pub fn supported_extensions(allow_js: bool) -> Vec<&'static str> {
    let mut extensions: Vec<&'static str> = TS_EXTENSIONS
        .iter()
        .chain(TS_MODULE_EXTENSIONS)
        .copied()
        .collect();
    if allow_js {
        extensions.extend_from_slice(JS_EXTENSIONS);
    }
    extensions
}

/// Whether the path ends in one of the given extensions
///
/// Compares whole suffixes so `.d.ts` is recognised as such.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| extensions.iter().any(|ext| name.ends_with(ext)))
}

/// File name with its (possibly compound) source extension removed
pub fn strip_source_extension(name: &str) -> &str {
    for suffix in DECLARATION_SUFFIXES {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem;
        }
    }
    for suffix in [".ts", ".tsx", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs"] {
        if let Some(stem) = name.strip_suffix(suffix) {
            return stem;
        }
    }
    name
}
