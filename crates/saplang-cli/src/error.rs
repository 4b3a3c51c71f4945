//! The driver's top-level error type.
//!
//! Separates option-parsing, IO, dump-serialization, backend and linker
//! failures into distinct variants, the same way the teacher's own
//! `ReplError`/`ResourceError` enums keep failures distinct by pipeline
//! stage instead of collapsing everything into one string: callers (here,
//! just `main`) get to match on what actually went wrong rather than
//! string-sniffing a message.

use std::fmt;
use std::path::PathBuf;

use saplang::BackendError;

#[derive(Debug)]
pub enum CliError {
    /// A malformed or unrecognised command-line argument.
    InvalidArgs(String),
    /// No source file was given on the command line.
    NoSourceFile,
    /// Reading the source file, or writing/removing a temporary IR file,
    /// failed.
    Io { path: PathBuf, source: std::io::Error },
    /// Rendering a `-ast-dump`/`-res-dump`/`-cfg-dump` JSON payload failed.
    DumpSerialization(serde_json::Error),
    /// The `IrBackend` implementation reported a failure.
    Backend(BackendError),
    /// Invoking the linker driver (`cc`) failed to even start.
    Link(std::io::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgs(msg) => write!(f, "{msg}"),
            Self::NoSourceFile => write!(f, "no source file specified."),
            Self::Io { path, source } => write!(f, "failed to access '{}': {source}", path.display()),
            Self::DumpSerialization(err) => write!(f, "failed to render dump: {err}"),
            Self::Backend(err) => write!(f, "backend failed: {err}"),
            Self::Link(err) => write!(f, "failed to invoke linker driver: {err}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<BackendError> for CliError {
    fn from(err: BackendError) -> Self {
        Self::Backend(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::DumpSerialization(err)
    }
}
