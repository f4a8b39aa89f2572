//! Generate command - produce the Custom Elements Manifest.
//!
//! Loads configuration (CLI args > config file > defaults), runs the engine,
//! writes the manifest to the configured output (`-` = stdout), and in
//! `--watch` mode keeps rewriting it as the manifest stream publishes
//! updates.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::super::args::GenerateCommand;
use super::super::exit_status::ExitStatus;
use super::super::report;
use crate::config::{Config, load_config};
use crate::engine::{CancelToken, GenerateResult, Session, WatchSession};

pub fn generate(cmd: GenerateCommand) -> Result<ExitStatus> {
    let verbose = cmd.common.verbose;
    let source_root = cmd
        .common
        .source_root
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));

    let config_result = load_config(&source_root)?;
    if verbose && !config_result.from_file {
        eprintln!("Note: No .cemgenrc.json found, using default configuration");
    }

    let config = apply_overrides(config_result.config, &cmd);
    config.validate()?;

    let output = config.output.clone();
    let session = Arc::new(
        Session::new(config, source_root)
            .map_err(|e| anyhow::anyhow!("Failed to initialize engine: {}", e))?,
    );

    let result = session
        .generate(&CancelToken::new())
        .map_err(|e| anyhow::anyhow!("Generation failed: {}", e))?;

    let errors = report::report_diagnostics(&result.diagnostics);
    write_manifest(session.root(), &output, &result)?;
    if verbose {
        report::report_generation(&result, &output);
    }

    if cmd.watch {
        return watch(session, &output);
    }

    Ok(if errors > 0 {
        ExitStatus::Failure
    } else {
        ExitStatus::Success
    })
}

/// Keep rewriting the manifest as the watch session publishes updates. Runs
/// until the process is interrupted.
fn watch(session: Arc<Session>, output: &str) -> Result<ExitStatus> {
    let root = session.root().to_path_buf();
    let watcher = WatchSession::start(Arc::clone(&session))
        .map_err(|e| anyhow::anyhow!("Failed to start watcher: {}", e))?;

    eprintln!("Watching {} for changes...", root.display());

    for update in watcher.updates().iter() {
        report::report_diagnostics(&update.diagnostics);
        write_manifest(&root, output, &update)?;
        report::report_generation(&update, output);
    }

    Ok(ExitStatus::Success)
}

fn apply_overrides(mut config: Config, cmd: &GenerateCommand) -> Config {
    if let Some(output) = &cmd.output {
        config.output = output.clone();
    }
    if !cmd.files.is_empty() {
        config.files = cmd.files.clone();
    }
    if !cmd.exclude.is_empty() {
        config.exclude = cmd.exclude.clone();
    }
    config
}

/// Write the manifest JSON to its destination; `-` means stdout.
fn write_manifest(root: &Path, output: &str, result: &GenerateResult) -> Result<()> {
    let json = result
        .manifest
        .to_json()
        .context("Failed to serialize manifest")?;

    if output == "-" {
        print!("{}", json);
        return Ok(());
    }

    let destination = if Path::new(output).is_absolute() {
        PathBuf::from(output)
    } else {
        root.join(output)
    };
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(&destination, json)
        .with_context(|| format!("Failed to write manifest: {}", destination.display()))?;

    Ok(())
}
