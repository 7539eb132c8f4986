//! One run of the tool, start to finish.

use std::io::Write;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::compiler::Compiler;
use crate::config;
use crate::diagnostic::format_diagnostic;
use crate::edit::accumulate;
use crate::error::Result;
use crate::filter::filter;
use crate::report::{self, FileOutcome, ReportOptions};

/// Inputs for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Configuration file, relative to `report.cwd` unless absolute
    pub tsconfig: PathBuf,
    /// Preview only, do not write
    pub dry_run: bool,
    pub report: ReportOptions,
}

/// Resolve, compile, filter, accumulate, then patch or preview
///
/// # Returns
/// * `Ok(Vec<FileOutcome>)` - One outcome per file that needed changes
/// * `Err(FixError)` - The first failure; earlier writes are kept
pub fn run(options: &RunOptions, compiler: &impl Compiler, out: &mut impl Write) -> Result<Vec<FileOutcome>> {
    let config = config::resolve(&options.tsconfig, &options.report.cwd)?;
    info!(
        config = %config.config_path.display(),
        roots = config.root_file_names.len(),
        "resolved configuration"
    );

    let diagnostics = compiler.compile(&config)?;
    for diagnostic in &diagnostics {
        debug!("{}", format_diagnostic(diagnostic, &options.report.cwd).trim_end());
    }

    let filtered = filter(diagnostics);
    let sets = accumulate(filtered);
    info!(files = sets.len(), dry_run = options.dry_run, "collected fixes");

    report::apply(&sets, !options.dry_run, &options.report, out)
}
