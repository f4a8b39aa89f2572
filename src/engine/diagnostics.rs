//! Diagnostic and error types for manifest generation.
//!
//! Each diagnostic is self-contained with all information needed by:
//! - Reporter: to display the problem to users (CLI, watch output)
//! - Callers: to decide whether a best-effort manifest is acceptable

use std::path::PathBuf;

use thiserror::Error;

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// What went wrong inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// tree-sitter reported ERROR nodes; the module is partial.
    SyntaxError,
    /// The file could not be read.
    Io,
    /// Extracted metadata contradicts itself (e.g. an attribute naming a
    /// missing field).
    Inconsistency,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::SyntaxError => write!(f, "syntax-error"),
            DiagnosticKind::Io => write!(f, "io"),
            DiagnosticKind::Inconsistency => write!(f, "inconsistency"),
        }
    }
}

/// A per-file problem. Non-fatal: the file contributes an empty or partial
/// module and generation continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDiagnostic {
    pub path: PathBuf,
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
}

impl SourceDiagnostic {
    pub fn syntax_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: DiagnosticKind::SyntaxError,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: DiagnosticKind::Io,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn inconsistency(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: DiagnosticKind::Inconsistency,
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SourceDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}]: {}",
            self.severity,
            self.path.display(),
            self.kind,
            self.message
        )
    }
}

/// Fatal engine failures. Per-file problems are [`SourceDiagnostic`]s, never
/// errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Grammar load, query compilation, or workspace setup failed. No
    /// manifest is produced.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The cancellation token fired. Session state is unchanged.
    #[error("generation cancelled")]
    Cancelled,

    /// A worker panicked; the generation attempt was abandoned and the
    /// previous manifest is still current.
    #[error("worker panicked during generation")]
    WorkerPanic,
}
