//! Report formatting and printing utilities.
//!
//! Displays generation diagnostics in cargo-style format on stderr, and
//! short status lines for watch mode. Separate from core logic so cemgen can
//! be used as a library.

use std::io::{self, Write};

use colored::Colorize;

use crate::engine::{BuildMode, GenerateResult, Severity, SourceDiagnostic};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Print diagnostics in cargo-style format to stderr.
///
/// Returns the number of error-severity diagnostics so callers can pick an
/// exit status.
pub fn report_diagnostics(diagnostics: &[SourceDiagnostic]) -> usize {
    report_diagnostics_to(diagnostics, &mut io::stderr().lock())
}

/// Print diagnostics to a custom writer. Useful for testing.
pub fn report_diagnostics_to<W: Write>(
    diagnostics: &[SourceDiagnostic],
    writer: &mut W,
) -> usize {
    let mut errors = 0;
    for diagnostic in diagnostics {
        let label = match diagnostic.severity {
            Severity::Error => {
                errors += 1;
                "error:".bold().red()
            }
            Severity::Warning => "warning:".bold().yellow(),
        };
        let _ = writeln!(
            writer,
            "{} {} [{}]: {}",
            label,
            diagnostic.path.display(),
            diagnostic.kind,
            diagnostic.message
        );
    }

    if !diagnostics.is_empty() {
        let _ = writeln!(
            writer,
            "{} diagnostic(s), {} error(s)",
            diagnostics.len(),
            errors
        );
    }

    errors
}

/// One status line per generation, shown in watch mode.
pub fn report_generation(result: &GenerateResult, destination: &str) {
    let mode = match result.mode {
        BuildMode::Full => "full",
        BuildMode::Incremental => "incremental",
    };
    eprintln!(
        "{} {} rebuild: {} module(s) -> {}",
        SUCCESS_MARK.green(),
        mode,
        result.manifest.modules.len(),
        destination
    );
}
