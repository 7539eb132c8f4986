use std::env;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use fix_verbatim_module_syntax::{NativeCompiler, ReportOptions, RunOptions, run};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `FIX_VMS_LOG=debug`
const LOG_ENV: &str = "FIX_VMS_LOG";

/// Add `type` to imports and re-exports that only carry types
#[derive(Parser, Debug)]
#[command(name = "fix-verbatim-module-syntax")]
#[command(version)]
#[command(about = "Mark type-only imports and exports for verbatimModuleSyntax", long_about = None)]
struct Args {
    /// Path to the tsconfig.json to fix
    #[arg(default_value = "tsconfig.json")]
    tsconfig_path: PathBuf,

    /// Print changes without writing to disk
    #[arg(long)]
    dry: bool,

    /// Output a JSON report instead of human-readable text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env(LOG_ENV))
        .with_writer(io::stderr)
        .init();

    match real_main(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_line(&e));
            ExitCode::from(1)
        }
    }
}

/// Top-level message only; the messages already embed their causes
fn error_line(err: &anyhow::Error) -> String {
    format!("Error: {}", err)
}

fn real_main(args: Args) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;
    let color = env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
    colored::control::set_override(color);

    let options = RunOptions {
        tsconfig: args.tsconfig_path,
        dry_run: args.dry,
        report: ReportOptions {
            cwd,
            color,
            json: args.json,
        },
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&options, &NativeCompiler, &mut out)?;
    Ok(())
}
