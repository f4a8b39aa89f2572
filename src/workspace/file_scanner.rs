use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use colored::Colorize;
use glob::Pattern;
use walkdir::WalkDir;

/// Result of scanning files.
pub struct ScanResult {
    /// Matched source files, absolute paths, sorted for determinism.
    pub files: BTreeSet<PathBuf>,
    pub skipped_count: usize,
}

/// Scan the workspace for input source files.
///
/// `files` globs select inputs relative to `root`; `exclude` globs subtract
/// from them. `node_modules` and hidden directories are never descended into.
pub fn scan_files(root: &Path, files: &[String], exclude: &[String], verbose: bool) -> ScanResult {
    let mut matched: BTreeSet<PathBuf> = BTreeSet::new();
    let mut skipped_count = 0;

    let include_patterns = compile_patterns(files, "files", verbose);
    let exclude_patterns = compile_patterns(exclude, "exclude", verbose);

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| {
        let name = e.file_name().to_string_lossy();
        !(e.file_type().is_dir() && (name == "node_modules" || name.starts_with('.')))
    }) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                skipped_count += 1;
                if verbose {
                    eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), e);
                }
                continue;
            }
        };

        let path = entry.path();
        if !path.is_file() || !is_scannable_file(path) {
            continue;
        }

        let relative = relative_posix(root, path);

        if !include_patterns.iter().any(|p| p.matches(&relative)) {
            continue;
        }
        if exclude_patterns.iter().any(|p| p.matches(&relative)) {
            continue;
        }

        matched.insert(path.to_path_buf());
    }

    ScanResult {
        files: matched,
        skipped_count,
    }
}

/// Does an absolute path fall inside the configured input set? Used by the
/// watcher to drop events on files outside the globs.
pub fn path_matches(root: &Path, path: &Path, files: &[String], exclude: &[String]) -> bool {
    if !is_scannable_file(path) {
        return false;
    }
    let relative = relative_posix(root, path);
    let matches_include = files
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|p| p.matches(&relative));
    let matches_exclude = exclude
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|p| p.matches(&relative));
    matches_include && !matches_exclude
}

fn compile_patterns(patterns: &[String], section: &str, verbose: bool) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                if verbose {
                    eprintln!(
                        "{} Invalid glob pattern '{}' in '{}': {}",
                        "warning:".bold().yellow(),
                        p,
                        section,
                        e
                    );
                }
                None
            }
        })
        .collect()
}

fn relative_posix(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_scannable_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("ts" | "tsx" | "mts" | "cts" | "js" | "jsx" | "mjs")
    )
}
