//! Outcome reporter - live per-test feedback on the console
//!
//! In terminal mode a test's name is printed when it starts and its result tag
//! is later drawn at a fixed right-hand column on the same line. In plain mode
//! (pipes, files, CI logs) the tag is appended inline with no escape codes.

use crate::logging::LogSlot;
use crate::outcome::Outcome;
use crate::stats::{RunStats, StatsSummary};
use colored::*;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::Command;
use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Width assumed when the terminal cannot be queried
pub const DEFAULT_WIDTH: u16 = 80;

/// Columns reserved for a `[ FAIL ]` style tag
const TAG_WIDTH: u16 = 8;

/// How results are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Interactive terminal; tags are placed at `columns` with cursor movement
    Terminal { columns: u16 },
    /// Anything else; tags are appended inline
    Plain,
}

impl OutputMode {
    /// Pick the mode for the process's stdout
    pub fn detect() -> Self {
        if io::stdout().is_terminal() {
            OutputMode::Terminal {
                columns: result_column(),
            }
        } else {
            OutputMode::Plain
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OutputMode::Terminal { .. })
    }
}

/// Column where result tags start, derived from the terminal width
pub fn result_column() -> u16 {
    column_for_width(crossterm::terminal::size().ok().map(|(width, _)| width))
}

fn column_for_width(width: Option<u16>) -> u16 {
    let width = match width {
        Some(width) if width > 0 => width,
        _ => DEFAULT_WIDTH,
    };
    width.saturating_sub(TAG_WIDTH)
}

/// In-memory sink, mostly for inspecting rendered output
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn append(&self, bytes: &[u8]) {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(bytes);
    }
}

enum Sink {
    Console(Arc<LogSlot>),
    Buffer(SharedBuffer),
}

/// Renders outcomes and keeps the pass/failure tallies
pub struct Reporter {
    mode: OutputMode,
    sink: Sink,
    stats: Arc<RunStats>,
    /// A `name...` line is waiting for its tag
    line_open: AtomicBool,
}

impl Reporter {
    /// Reporter writing to the console (through `logs` while a log is active)
    pub fn console(mode: OutputMode, logs: Arc<LogSlot>, stats: Arc<RunStats>) -> Self {
        Self::with_sink(mode, Sink::Console(logs), stats)
    }

    /// Reporter writing into `buffer`
    pub fn buffered(mode: OutputMode, buffer: SharedBuffer, stats: Arc<RunStats>) -> Self {
        Self::with_sink(mode, Sink::Buffer(buffer), stats)
    }

    fn with_sink(mode: OutputMode, sink: Sink, stats: Arc<RunStats>) -> Self {
        Self {
            mode,
            sink,
            stats,
            line_open: AtomicBool::new(false),
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    fn emit(&self, text: &str) {
        match &self.sink {
            Sink::Console(logs) => {
                let _ = logs.write_console(text.as_bytes());
            }
            Sink::Buffer(buffer) => buffer.append(text.as_bytes()),
        }
    }

    /// Announce that a test is starting
    pub fn report_running(&self, name: &str) {
        let line = match self.mode {
            OutputMode::Terminal { .. } => {
                format!("{}\n", format!("{}...", name).cyan().bold())
            }
            OutputMode::Plain => format!("{}... ", name),
        };
        self.emit(&line);
        self.line_open.store(true, Ordering::Relaxed);
    }

    /// Print the outcome's message and tag, and tally it.
    ///
    /// Success and Skip count as passes; Failure (and a stray Abort) count as
    /// failures.
    pub fn report_result(&self, outcome: &Outcome) {
        let resumed = self.line_open.swap(false, Ordering::Relaxed);
        let mut text = outcome.message().to_string();

        match self.mode {
            OutputMode::Terminal { columns } => {
                match outcome {
                    Outcome::Success if resumed => push_ansi(&mut text, MoveUp(1)),
                    _ => text.push(' '),
                }
                push_ansi(&mut text, MoveToColumn(columns));
                text.push_str(&terminal_tag(outcome));
            }
            OutputMode::Plain => {
                text.push(' ');
                text.push_str(plain_tag(outcome));
            }
        }
        text.push('\n');
        self.emit(&text);

        if outcome.is_pass() {
            self.stats.record_pass();
        } else {
            self.stats.record_failure();
        }
    }

    /// Print the run-fatal abort banner. The caller unwinds the run afterwards.
    pub fn report_aborted(&self) {
        self.line_open.store(false, Ordering::Relaxed);
        let text = match self.mode {
            OutputMode::Terminal { .. } => format!(
                "\n{}{}{}\n",
                "[".blue().bold(),
                " **** ABORTED **** ".red().bold(),
                "]".blue().bold()
            ),
            OutputMode::Plain => "[ **** ABORTED **** ]\n".to_string(),
        };
        self.emit(&text);
    }

    /// Header printed before a library's suites run
    pub fn report_library(&self, name: &str) {
        self.notice(&format!("Running test suite {}...", name));
    }

    /// Header printed before one suite's tests run
    pub fn report_suite(&self, name: &str) {
        self.notice(&format!("Running tests in suite {}...", name));
    }

    fn notice(&self, text: &str) {
        let line = match self.mode {
            OutputMode::Terminal { .. } => format!("{}\n", text.magenta().bold()),
            OutputMode::Plain => format!("{}\n", text),
        };
        self.emit(&line);
    }

    /// Problem that skips a library or suite without ending the run
    pub fn report_error(&self, text: &str) {
        let line = match self.mode {
            OutputMode::Terminal { .. } => format!("{}\n", text.red().bold()),
            OutputMode::Plain => format!("{}\n", text),
        };
        self.emit(&line);
    }

    /// End-of-run statistics line
    pub fn report_summary(&self) -> StatsSummary {
        let summary = self.stats.summary();
        self.emit(&format!("{}\n", summary));
        summary
    }
}

fn push_ansi(text: &mut String, command: impl Command) {
    let _ = command.write_ansi(text);
}

fn plain_tag(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Success => "[  OK  ]",
        Outcome::Skip(_) => "[ SKIP ]",
        Outcome::Failure(_) | Outcome::Abort(_) => "[ FAIL ]",
    }
}

fn terminal_tag(outcome: &Outcome) -> String {
    let label = match outcome {
        Outcome::Success => "  OK  ".green().bold(),
        Outcome::Skip(_) => " SKIP ".yellow().bold(),
        Outcome::Failure(_) | Outcome::Abort(_) => " FAIL ".red().bold(),
    };
    format!("{}{}{}", "[".blue().bold(), label, "]".blue().bold())
}
