//! Writing patched files and reporting what changed.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Serialize;
use tracing::{debug, info};

use crate::edit::FileEditSet;
use crate::error::{FixError, Result};
use crate::file::{read_file, write_file_atomic};
use crate::filter::FindingKind;
use crate::paths::{relative_to, to_slash};

/// How results are presented
///
/// The working directory and color decision are passed in rather than read
/// from the process, so reporting is deterministic under test.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Paths are printed relative to this directory
    pub cwd: PathBuf,
    /// Emit ANSI colors in the text report
    pub color: bool,
    /// Emit one JSON document instead of the text report
    pub json: bool,
}

/// One flagged specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub name: String,
    pub kind: FindingKind,
    /// Byte offset of the insertion in the original text
    pub offset: usize,
}

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub matched_names: Vec<String>,
    pub findings: Vec<Finding>,
    /// Whether the patched text was written to disk
    pub written: bool,
}

#[derive(Serialize)]
struct JsonFile<'a> {
    path: String,
    matched_names: &'a [String],
    findings: &'a [Finding],
    written: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dry_run: bool,
    files: Vec<JsonFile<'a>>,
}

/// Patch every file, write it unless previewing, and report
///
/// Files are processed in the order given. In text mode each file is
/// reported right after it is handled; in JSON mode one document is written
/// at the end. No sets means no text output.
///
/// # Arguments
/// * `sets` - Edit sets from [`crate::edit::accumulate`]
/// * `write` - `false` for a dry run
/// * `options` - Presentation settings
/// * `out` - Where the report goes
///
/// # Returns
/// * `Ok(Vec<FileOutcome>)` - One outcome per set
/// * `Err(FixError::StaleFile)` - A file changed on disk after compilation;
///   files handled before it stay written
pub fn apply(
    sets: &[FileEditSet],
    write: bool,
    options: &ReportOptions,
    out: &mut impl Write,
) -> Result<Vec<FileOutcome>> {
    let mut outcomes = Vec::with_capacity(sets.len());

    for set in sets {
        let patched = set.patched_text()?;

        if write {
            let current = read_file(&set.path)?;
            if current.checksum != set.checksum {
                return Err(FixError::StaleFile {
                    path: set.path.clone(),
                });
            }
            write_file_atomic(&set.path, &patched)?;
            info!(path = %set.path.display(), insertions = set.insertions.len(), "patched");
        } else {
            debug!(path = %set.path.display(), insertions = set.insertions.len(), "dry run");
        }

        let outcome = FileOutcome {
            path: set.path.clone(),
            matched_names: set.matched_names.clone(),
            findings: set
                .insertions
                .iter()
                .zip(&set.matched_names)
                .map(|(insertion, name)| Finding {
                    name: name.clone(),
                    kind: insertion.kind,
                    offset: insertion.offset,
                })
                .collect(),
            written: write,
        };

        if !options.json {
            print_file(out, &outcome, write, options)?;
        }
        outcomes.push(outcome);
    }

    if options.json {
        print_json(out, &outcomes, write, &options.cwd)?;
    }

    Ok(outcomes)
}

/// Print the text report for one file
///
/// ```text
/// src/index.ts
///    Adding type to: a, b
///
/// ```
pub fn print_file(
    writer: &mut impl Write,
    outcome: &FileOutcome,
    written: bool,
    options: &ReportOptions,
) -> std::io::Result<()> {
    let path = relative_to(&outcome.path, &options.cwd).display().to_string();
    let label = if written {
        "Adding type to:"
    } else {
        "Should add type to:"
    };
    let names: Vec<String> = outcome
        .matched_names
        .iter()
        .map(|name| {
            if options.color {
                name.magenta().to_string()
            } else {
                name.clone()
            }
        })
        .collect();

    if options.color {
        writeln!(writer, "{}", path.cyan())?;
    } else {
        writeln!(writer, "{}", path)?;
    }
    writeln!(writer, "   {} {}", label, names.join(", "))?;
    writeln!(writer)?;
    Ok(())
}

fn print_json(
    writer: &mut impl Write,
    outcomes: &[FileOutcome],
    written: bool,
    cwd: &Path,
) -> Result<()> {
    let report = JsonReport {
        dry_run: !written,
        files: outcomes
            .iter()
            .map(|outcome| JsonFile {
                path: to_slash(&relative_to(&outcome.path, cwd)),
                matched_names: &outcome.matched_names,
                findings: &outcome.findings,
                written: outcome.written,
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *writer, &report)?;
    writeln!(writer)?;
    Ok(())
}
