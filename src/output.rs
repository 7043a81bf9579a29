// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Normal, quiet (CI) and JSON-lines modes for progress, notices, warnings and results.

use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (results, warnings and errors only)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    /// Pick a mode from the global flags; `--json` wins over `--quiet`.
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        match (quiet, json) {
            (_, true) => OutputMode::Json,
            (true, false) => OutputMode::Quiet,
            (false, false) => OutputMode::Normal,
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn elapsed_secs(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Something the operator must read even in quiet mode, such as the
    /// instance that would be affected by an unconfirmed request.
    pub fn notice(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_stdout("notice", message),
        }
    }

    /// A tolerated failure, reported after the fact.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Warning: {message}"),
            OutputMode::Json => self.emit_stdout("warning", message),
        }
    }

    /// Print a success message with timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => match self.elapsed_secs() {
                Some(elapsed) => println!("{message} ({elapsed:.1}s)"),
                None => println!("{message}"),
            },
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_stdout("success", message),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => {
                if let Some(json) = self.event("error", message) {
                    eprintln!("{json}");
                }
            }
        }
    }

    fn emit_stdout(&self, event: &str, message: &str) {
        if let Some(json) = self.event(event, message) {
            println!("{json}");
        }
    }

    fn event(&self, event: &str, message: &str) -> Option<String> {
        serde_json::to_string(&JsonEvent {
            event,
            message,
            duration_secs: self.elapsed_secs(),
        })
        .ok()
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}
