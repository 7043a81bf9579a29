// ABOUTME: Error types for the process-backed adapters, SNAFU style.
// ABOUTME: Spawn, timeout, exit-status and output-parsing failures with a kind() accessor.

use snafu::Snafu;
use std::time::Duration;

/// Failure running an external command.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ExecError {
    #[snafu(display("failed to start {program}: {source}"))]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[snafu(display("{program} did not finish within {}", humantime::format_duration(*timeout)))]
    Timeout { program: String, timeout: Duration },

    #[snafu(display("{program} exited with status {}: {}", code.map_or_else(|| "signal".to_string(), |c| c.to_string()), stderr.trim()))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[snafu(display("{program} printed output that could not be parsed: {source}"))]
    Output {
        program: String,
        source: serde_json::Error,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecErrorKind {
    /// The program could not be started at all.
    NotStarted,
    /// The program ran past its deadline and was killed.
    TimedOut,
    /// The program exited unsuccessfully.
    Failed,
    /// The program succeeded but its output was not understood.
    BadOutput,
}

impl ExecError {
    pub fn kind(&self) -> ExecErrorKind {
        match self {
            ExecError::Spawn { .. } => ExecErrorKind::NotStarted,
            ExecError::Timeout { .. } => ExecErrorKind::TimedOut,
            ExecError::Exit { .. } => ExecErrorKind::Failed,
            ExecError::Output { .. } => ExecErrorKind::BadOutput,
        }
    }

    /// Standard error of a failed program, if it got that far.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecError::Exit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_error_shows_code_and_trimmed_stderr() {
        let err = ExecError::Exit {
            program: "kubectl".to_string(),
            code: Some(1),
            stderr: "error: nodes \"x\" not found\n".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "kubectl exited with status 1: error: nodes \"x\" not found"
        );
        assert_eq!(err.kind(), ExecErrorKind::Failed);
    }

    #[test]
    fn killed_by_signal() {
        let err = ExecError::Exit {
            program: "sh".to_string(),
            code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("status signal"));
    }

    #[test]
    fn timeout_is_human_readable() {
        let err = ExecError::Timeout {
            program: "kubectl".to_string(),
            timeout: Duration::from_secs(90),
        };
        assert_eq!(err.to_string(), "kubectl did not finish within 1m 30s");
        assert_eq!(err.kind(), ExecErrorKind::TimedOut);
    }
}
