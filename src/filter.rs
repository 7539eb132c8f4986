//! Selecting the diagnostics the tool can fix.

use serde::Serialize;

use crate::diagnostic::{Diagnostic, TYPE_ONLY_IMPORT, TYPE_ONLY_REEXPORT};

/// The two fixable findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A value-style import of a type
    Import,
    /// A value-style re-export of a type
    ReExport,
}

impl FindingKind {
    /// Map a diagnostic code to the finding it represents
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            TYPE_ONLY_IMPORT => Some(FindingKind::Import),
            TYPE_ONLY_REEXPORT => Some(FindingKind::ReExport),
            _ => None,
        }
    }
}

/// Keep only fixable diagnostics, in input order
pub fn filter(diagnostics: impl IntoIterator<Item = Diagnostic>) -> Vec<Diagnostic> {
    diagnostics
        .into_iter()
        .filter(|diagnostic| FindingKind::from_code(diagnostic.code).is_some())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{
        CANNOT_FIND_MODULE, SourceFile, TYPE_ONLY_ALIAS_IMPORT, TYPE_ONLY_ALIAS_REEXPORT,
    };
    use std::path::PathBuf;

    fn sample() -> Vec<Diagnostic> {
        let file = SourceFile::new(PathBuf::from("/p/index.ts"), "x".repeat(40));
        vec![
            Diagnostic::in_file(CANNOT_FIND_MODULE, &file, 0, 1, "m"),
            Diagnostic::in_file(TYPE_ONLY_REEXPORT, &file, 30, 1, "m"),
            Diagnostic::in_file(TYPE_ONLY_ALIAS_IMPORT, &file, 5, 1, "m"),
            Diagnostic::in_file(TYPE_ONLY_IMPORT, &file, 9, 1, "m"),
            Diagnostic::in_file(TYPE_ONLY_ALIAS_REEXPORT, &file, 12, 1, "m"),
            Diagnostic::global(6053, "m"),
        ]
    }

    #[test]
    fn keeps_only_watched_codes_in_order() {
        let codes: Vec<u32> = filter(sample()).iter().map(|d| d.code).collect();
        assert_eq!(codes, vec![TYPE_ONLY_REEXPORT, TYPE_ONLY_IMPORT]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let once = filter(sample());
        let twice = filter(once.clone());
        let starts = |ds: &[Diagnostic]| ds.iter().map(|d| (d.code, d.start)).collect::<Vec<_>>();
        assert_eq!(starts(&once), starts(&twice));
    }

    #[test]
    fn finding_kinds() {
        assert_eq!(FindingKind::from_code(1484), Some(FindingKind::Import));
        assert_eq!(FindingKind::from_code(1205), Some(FindingKind::ReExport));
        assert_eq!(FindingKind::from_code(1485), None);
    }
}
