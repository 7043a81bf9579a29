// ABOUTME: Diagnostics accumulator for non-fatal failures during a replacement.
// ABOUTME: Collects tolerated failures that shouldn't abort the workflow but should be shown to users.

/// Collects non-fatal warnings during a replacement.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A non-fatal warning collected during a replacement.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// Surge was requested but the instance's group cannot be surged.
    pub fn surge_skipped(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::SurgeSkipped,
            message: message.into(),
        }
    }

    /// Cordoning failed and the drain policy tolerated it.
    pub fn detach_tolerated(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DetachTolerated,
            message: message.into(),
        }
    }

    /// Draining failed and the drain policy tolerated it.
    pub fn drain_tolerated(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::DrainTolerated,
            message: message.into(),
        }
    }

    /// Validation failed and the validation policy tolerated it.
    pub fn validation_tolerated(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::ValidationTolerated,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Control-plane instances are replaced in place.
    SurgeSkipped,
    /// Node could not be cordoned.
    DetachTolerated,
    /// Node could not be fully drained.
    DrainTolerated,
    /// Cluster did not validate before termination.
    ValidationTolerated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(diag.into_warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::drain_tolerated("pod eviction blocked"));
        diag.warn(Warning::validation_tolerated("node not ready"));

        let warnings = diag.into_warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::DrainTolerated);
    }

    #[test]
    fn warning_constructors_set_correct_kind() {
        assert_eq!(Warning::surge_skipped("x").kind, WarningKind::SurgeSkipped);
        assert_eq!(Warning::detach_tolerated("x").kind, WarningKind::DetachTolerated);
        assert_eq!(Warning::drain_tolerated("x").kind, WarningKind::DrainTolerated);
        assert_eq!(
            Warning::validation_tolerated("x").kind,
            WarningKind::ValidationTolerated
        );
    }
}
