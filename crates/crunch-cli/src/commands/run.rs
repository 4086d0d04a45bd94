//! Run command - load test libraries and execute their suites

use anyhow::{Context, Result};
use crunch_core::{
    fault, HarnessContext, LibraryProvider, Orchestrator, OutputMode, SuiteProvider,
};
use std::path::PathBuf;
use tracing::debug;

/// Arguments for the run command
#[derive(Debug, Default)]
pub struct RunArgs {
    /// Library identifiers, in the order they run
    pub libraries: Vec<String>,
    /// Directory the identifiers are resolved against
    pub lib_dir: Option<PathBuf>,
    /// Capture test output into this file
    pub log: Option<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
}

/// Run every library and return the process exit code
pub fn run(args: RunArgs) -> Result<i32> {
    let lib_dir = match args.lib_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine working directory")?,
    };

    let mode = OutputMode::detect();
    colored::control::set_override(mode.is_terminal() && !args.no_color);
    fault::install();
    debug!(?mode, lib_dir = %lib_dir.display(), libraries = args.libraries.len(), "starting run");

    let providers: Vec<Box<dyn SuiteProvider>> = args
        .libraries
        .into_iter()
        .map(|name| Box::new(LibraryProvider::new(&lib_dir, name)) as Box<dyn SuiteProvider>)
        .collect();

    let orchestrator = Orchestrator::new(HarnessContext::new(mode)).with_log(args.log);
    let summary = orchestrator.run(providers);
    Ok(summary.exit_code())
}
