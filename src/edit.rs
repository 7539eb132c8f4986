use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::diagnostic::{Diagnostic, SourceFile};
use crate::file::checksum;
use crate::filter::FindingKind;

/// Literal inserted in front of every flagged specifier
pub const TYPE_KEYWORD: &str = "type ";

/// A literal to insert at a byte offset of the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Byte offset in the original text
    pub offset: usize,
    /// Text to insert
    pub literal: String,
    /// Finding that produced this insertion
    pub kind: FindingKind,
}

/// All pending insertions for one file
#[derive(Debug, Clone)]
pub struct FileEditSet {
    /// Path of the file
    pub path: PathBuf,
    /// Text the diagnostics were computed against
    pub original: Arc<SourceFile>,
    /// BLAKE3 checksum of `original.text`
    pub checksum: String,
    /// Insertions in the order the diagnostics were encountered
    pub insertions: Vec<Insertion>,
    /// Source text of each flagged span, parallel to `insertions`
    pub matched_names: Vec<String>,
}

impl FileEditSet {
    fn new(original: Arc<SourceFile>) -> Self {
        Self {
            path: original.path.clone(),
            checksum: checksum(&original.text),
            original,
            insertions: Vec::new(),
            matched_names: Vec::new(),
        }
    }

    /// The file text with every insertion applied
    pub fn patched_text(&self) -> Result<String, EditError> {
        apply_insertions(&self.original.text, &self.insertions)
    }
}

/// Error types for edit operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    /// Offset past the end of the text
    #[error("Insertion offset {offset} out of bounds (content length: {content_len})")]
    OutOfBounds { offset: usize, content_len: usize },
    /// Offset inside a multi-byte character
    #[error("Insertion offset {offset} is not on a character boundary")]
    NotCharBoundary { offset: usize },
}

/// Group fixable diagnostics into one edit set per file
///
/// Sets come out in the order their file was first seen. Each diagnostic
/// contributes one `type ` insertion at its start offset and its span text
/// as a matched name; nothing is deduplicated. Diagnostics without a file, or
/// with a code that is not a fixable finding, are skipped.
///
/// # Arguments
/// * `filtered` - Diagnostics that passed [`crate::filter::filter`]
///
/// # Returns
/// * `Vec<FileEditSet>` - One set per distinct file
pub fn accumulate(filtered: impl IntoIterator<Item = Diagnostic>) -> Vec<FileEditSet> {
    let mut sets: Vec<FileEditSet> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for diagnostic in filtered {
        let Some(kind) = FindingKind::from_code(diagnostic.code) else {
            continue;
        };
        let Some(file) = &diagnostic.file else {
            continue;
        };

        let slot = *index.entry(file.path.clone()).or_insert_with(|| {
            sets.push(FileEditSet::new(Arc::clone(file)));
            sets.len() - 1
        });
        let set = &mut sets[slot];

        set.matched_names.push(diagnostic.span_text().to_string());
        set.insertions.push(Insertion {
            offset: diagnostic.start,
            literal: TYPE_KEYWORD.to_string(),
            kind,
        });
    }

    sets
}

/// Sort insertions by offset, keeping encounter order for equal offsets
///
/// # Example
/// ```
/// use fix_verbatim_module_syntax::{FindingKind, Insertion, sort_insertions};
/// let at = |offset, literal: &str| Insertion { offset, literal: literal.to_string(), kind: FindingKind::Import };
/// let sorted = sort_insertions(&[at(9, "x"), at(2, "y"), at(9, "z")]);
/// let order: Vec<&str> = sorted.iter().map(|i| i.literal.as_str()).collect();
/// assert_eq!(order, vec!["y", "x", "z"]);
/// ```
pub fn sort_insertions(insertions: &[Insertion]) -> Vec<Insertion> {
    let mut sorted = insertions.to_vec();
    sorted.sort_by_key(|insertion| insertion.offset);
    sorted
}

/// Build the patched text in a single pass over the original
///
/// Every offset refers to the untouched original, so insertions never shift
/// each other.
///
/// # Arguments
/// * `original` - Text the offsets were computed against
/// * `insertions` - Insertions in any order
///
/// # Returns
/// * `Ok(String)` - Original text with every literal spliced in
/// * `Err(EditError)` - An offset is past the end or inside a character
pub fn apply_insertions(original: &str, insertions: &[Insertion]) -> Result<String, EditError> {
    let sorted = sort_insertions(insertions);
    let extra: usize = sorted.iter().map(|insertion| insertion.literal.len()).sum();
    let mut patched = String::with_capacity(original.len() + extra);
    let mut cursor = 0;

    for insertion in &sorted {
        if insertion.offset > original.len() {
            return Err(EditError::OutOfBounds {
                offset: insertion.offset,
                content_len: original.len(),
            });
        }
        if !original.is_char_boundary(insertion.offset) {
            return Err(EditError::NotCharBoundary {
                offset: insertion.offset,
            });
        }
        patched.push_str(&original[cursor..insertion.offset]);
        patched.push_str(&insertion.literal);
        cursor = insertion.offset;
    }
    patched.push_str(&original[cursor..]);

    Ok(patched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{CANNOT_FIND_MODULE, TYPE_ONLY_IMPORT, TYPE_ONLY_REEXPORT};
    use pretty_assertions::assert_eq;

    const INDEX: &str =
        "import { a, b } from './file'; export { a }; export { b } from './file';";

    fn index_file() -> Arc<SourceFile> {
        SourceFile::new(PathBuf::from("/p/index.ts"), INDEX.to_string())
    }

    fn at(file: &Arc<SourceFile>, code: u32, needle: &str, nth: usize) -> Diagnostic {
        let start = file
            .text
            .match_indices(needle)
            .nth(nth)
            .map(|(start, _)| start)
            .unwrap();
        Diagnostic::in_file(code, file, start, needle.len(), "m")
    }

    fn insertion(offset: usize, literal: &str) -> Insertion {
        Insertion {
            offset,
            literal: literal.to_string(),
            kind: FindingKind::Import,
        }
    }

    #[test]
    fn test_accumulate_groups_by_file_in_first_touch_order() {
        let index = index_file();
        let other = SourceFile::new(PathBuf::from("/p/a.ts"), "import { T } from './t';".to_string());
        let diagnostics = vec![
            at(&index, TYPE_ONLY_IMPORT, "a", 0),
            at(&other, TYPE_ONLY_IMPORT, "T", 0),
            at(&index, TYPE_ONLY_REEXPORT, "b", 1),
        ];

        let sets = accumulate(diagnostics);
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].path, PathBuf::from("/p/index.ts"));
        assert_eq!(sets[0].matched_names, vec!["a", "b"]);
        assert_eq!(sets[0].insertions[1].kind, FindingKind::ReExport);
        assert_eq!(sets[0].checksum, checksum(INDEX));
        assert_eq!(sets[1].matched_names, vec!["T"]);
    }

    #[test]
    fn test_accumulate_skips_global_and_unfixable() {
        let index = index_file();
        let diagnostics = vec![
            Diagnostic::global(TYPE_ONLY_IMPORT, "m"),
            at(&index, CANNOT_FIND_MODULE, "'./file'", 0),
        ];
        assert!(accumulate(diagnostics).is_empty());
    }

    #[test]
    fn test_scenario_patch() {
        let index = index_file();
        let diagnostics = vec![
            at(&index, TYPE_ONLY_IMPORT, "a", 0),
            at(&index, TYPE_ONLY_IMPORT, "b", 0),
            at(&index, TYPE_ONLY_REEXPORT, "a", 1),
            at(&index, TYPE_ONLY_REEXPORT, "b", 1),
        ];
        let sets = accumulate(diagnostics);
        assert_eq!(
            sets[0].patched_text().unwrap(),
            "import { type a, type b } from './file'; export { type a }; export { type b } from './file';"
        );
    }

    #[test]
    fn test_removing_literals_restores_original() {
        let original = "import { a, b as c } from './x';\nexport { d };";
        let offsets = [9, 12, 42];
        let insertions: Vec<Insertion> = offsets
            .iter()
            .rev()
            .map(|&offset| insertion(offset, TYPE_KEYWORD))
            .collect();

        let patched = apply_insertions(original, &insertions).unwrap();
        assert_eq!(patched.len(), original.len() + 3 * TYPE_KEYWORD.len());

        // Each literal lands at its offset shifted by the literals before it
        let mut restored = patched.clone();
        for (shift, &offset) in offsets.iter().enumerate().rev() {
            let at = offset + shift * TYPE_KEYWORD.len();
            assert_eq!(&restored[at..at + TYPE_KEYWORD.len()], TYPE_KEYWORD);
            restored.replace_range(at..at + TYPE_KEYWORD.len(), "");
        }
        assert_eq!(restored, original);
    }

    #[test]
    fn test_same_offset_keeps_encounter_order() {
        let patched = apply_insertions("xy", &[insertion(1, "A"), insertion(1, "B")]).unwrap();
        assert_eq!(patched, "xABy");
    }

    #[test]
    fn test_no_insertions_is_identity() {
        assert_eq!(apply_insertions("unchanged", &[]).unwrap(), "unchanged");
    }

    #[test]
    fn test_insertion_at_end() {
        assert_eq!(apply_insertions("ab", &[insertion(2, "!")]).unwrap(), "ab!");
    }

    #[test]
    fn test_out_of_bounds() {
        assert_eq!(
            apply_insertions("ab", &[insertion(3, "!")]),
            Err(EditError::OutOfBounds { offset: 3, content_len: 2 })
        );
    }

    #[test]
    fn test_not_char_boundary() {
        assert_eq!(
            apply_insertions("é", &[insertion(1, "!")]),
            Err(EditError::NotCharBoundary { offset: 1 })
        );
    }
}
