//! The central error/warning sink.
//!
//! A single sink accepts `(SourceLocation, Severity, message)` triples and
//! formats them as `path:line:col error: msg` / `path:line:col warning: msg`.
//! It is thread-safe (a locked append-only buffer) because cross-module
//! parallelism is permitted: every module's phase functions receive the same
//! `Diagnostics` handle and append to it concurrently. Within one module,
//! diagnostics preserve source order; across modules order is unspecified.

use std::fmt;
use std::sync::Mutex;

use crate::source::SourceLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub severity: Severity,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.location, self.severity, self.message)
    }
}

/// Thread-safe, append-only diagnostic sink shared across every phase of the
/// pipeline and across concurrently-analysed modules.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self, location: SourceLocation, message: impl Into<String>) {
        self.push(location, Severity::Error, message);
    }

    pub fn warning(&self, location: SourceLocation, message: impl Into<String>) {
        self.push(location, Severity::Warning, message);
    }

    fn push(&self, location: SourceLocation, severity: Severity, message: impl Into<String>) {
        let diagnostic = Diagnostic {
            location,
            severity,
            message: message.into(),
        };
        self.entries
            .lock()
            .expect("diagnostics mutex poisoned")
            .push(diagnostic);
    }

    /// Whether any diagnostic so far is an error; the driver uses this to
    /// decide the process exit code.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.entries
            .lock()
            .expect("diagnostics mutex poisoned")
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("diagnostics mutex poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A snapshot of diagnostics recorded so far, in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries.lock().expect("diagnostics mutex poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::{Diagnostics, Severity};
    use crate::source::SourceFile;

    #[test]
    fn formats_error_and_warning_lines() {
        let file = SourceFile::new("a.sl", "");
        let diags = Diagnostics::new();
        diags.error(file.location_at(1, 1, 0), "redeclaration of 'foo'.");
        diags.warning(file.location_at(2, 1, 0), "unreachable statement.");
        let snap = diags.snapshot();
        assert_eq!(snap[0].to_string(), "a.sl:1:1 error: redeclaration of 'foo'.");
        assert_eq!(snap[1].to_string(), "a.sl:2:1 warning: unreachable statement.");
        assert!(diags.has_errors());
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Error.to_string(), "error");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
