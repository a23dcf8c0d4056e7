//! `jspc` command line: precompile every page of a web application once.
//!
//! Exit codes: 0 when every page compiled, 1 when any page produced
//! diagnostics, 2 when the run itself could not be carried out.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use jspc::tracing_setup::{init_tracing, Verbosity};
use jspc::{load_config, ConfigOverrides, DirectiveCompiler, JspcError, Precompiler};

const EXIT_BUILD_FAILED: i32 = 1;
const EXIT_FATAL: i32 = 2;

/// Parallel page precompiler.
#[derive(Parser, Debug)]
#[command(name = "jspc", version, about = "Precompile JSP pages in parallel")]
struct Cli {
    /// Project directory; relative configuration paths resolve against it.
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Configuration file to use instead of `<project-dir>/jspc.toml`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of workers (0 uses every available core).
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Keep compiling a worker's remaining pages after an error.
    #[arg(long)]
    no_stop_at_first_error: bool,

    /// Only compile pages that changed since the last successful build.
    #[arg(long)]
    incremental: bool,

    /// Write the fragments but do not merge them into the descriptor.
    #[arg(long)]
    no_merge: bool,

    /// Line marker the fragments are inserted at.
    #[arg(long)]
    insertion_marker: Option<String>,

    /// Enable debug-level output.
    #[arg(short, long)]
    verbose: bool,

    /// Only report warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            threads: self.threads,
            stop_at_first_error: self.no_stop_at_first_error.then_some(false),
            incremental: self.incremental.then_some(true),
            merge_fragment: self.no_merge.then_some(false),
            insertion_marker: self.insertion_marker.clone(),
            verbose: self.verbose.then_some(true),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_BUILD_FAILED),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(EXIT_FATAL);
        }
    }
}

/// Run the precompiler; `Ok(false)` means pages failed to compile.
fn run(cli: &Cli) -> Result<bool, JspcError> {
    let mut config = load_config(&cli.project_dir, cli.config.as_deref())?;
    config.apply(&cli.overrides());
    init_tracing(Verbosity::from_flags(cli.quiet, config.verbose));

    let resolved = config.resolve(&cli.project_dir)?;
    let summary = Precompiler::new(resolved, Arc::new(DirectiveCompiler::new())).run()?;
    Ok(summary.is_success())
}
