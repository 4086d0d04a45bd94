use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Exit code when there is nothing to run
const EXIT_NO_TESTS: i32 = 2;

/// crunch native unit-test runner.
///
/// Loads each named test library, runs its suites one test at a time and
/// prints a line per test followed by a summary. Each test runs on its own
/// thread; a failed assertion ends only that test.
///
/// LIBRARIES are resolved against --lib-dir, trying NAME.so then libNAME.so
/// (.dylib on macOS, .dll on Windows). A library must export its suites with
/// crunch_core::export_suites! and be built with the same crunch-core version
/// and the same rustc as this runner; any other library is skipped.
///
/// EXIT STATUS:
///     0    Every test passed or was skipped
///     1    At least one test failed
///     2    The run was aborted, or no test library could be loaded
///
/// EXAMPLES:
///     crunch testMath                         Run libtestMath.so from here
///     crunch testMath testIO --lib-dir build  Run two libraries from build/
///     crunch testIO --log io.log              Also capture test output
///
/// ENVIRONMENT VARIABLES:
///     CRUNCH_LOG        Default for --log
///     CRUNCH_LIB_DIR    Default for --lib-dir
///     CRUNCH_TRACE      Harness diagnostics filter (e.g. 'debug'), to stderr
///     NO_COLOR          Set to disable colored output
#[derive(Parser)]
#[command(name = "crunch")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Test libraries to run, in order
    libraries: Vec<String>,

    /// Capture everything tests write to stdout into this file
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,

    /// Directory to load test libraries from (defaults to the working directory)
    #[arg(long, value_name = "DIR")]
    lib_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Print version information
    #[arg(short = 'v', long)]
    version: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cli_config = config::Config::from_env();

    if cli.version {
        print_version();
        return Ok(());
    }

    init_tracing(&cli_config.trace);

    if cli.libraries.is_empty() {
        let message = "Fatal error: There are no tests to run given on the command line!";
        println!("{}", message.red().bold());
        std::process::exit(EXIT_NO_TESTS);
    }

    // Command-line flags override environment variables
    let args = commands::run::RunArgs {
        libraries: cli.libraries,
        lib_dir: cli.lib_dir.or(cli_config.lib_dir),
        log: cli.log.or(cli_config.log_file),
        no_color: cli.no_color || cli_config.no_color,
    };
    let code = commands::run::run(args)?;
    std::process::exit(code);
}

fn print_version() {
    println!(
        "crunch {} (crunch-core {}, {}/{})",
        env!("CARGO_PKG_VERSION"),
        crunch_core::VERSION,
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_TRACE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
