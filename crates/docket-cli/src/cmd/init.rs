use std::path::Path;

use anyhow::{Context as _, Result};
use clap::Args;
use docket_core::config::{self, DOCKET_DIR};
use serde::Serialize;

use crate::output::{OutputMode, render};

#[derive(Args, Debug)]
pub struct InitArgs {}

#[derive(Debug, Serialize)]
struct InitReport {
    root: String,
    created: bool,
    config_written: bool,
}

/// Execute `dk init`. Creates the project skeleton:
///
/// ```text
/// .docket/
///   config.toml   (default project config)
/// ```
///
/// Collections (`tickets.json`, `comments.json`, ...) are created on first
/// write. Running `init` again leaves an existing project untouched.
///
/// # Errors
///
/// Returns an error if the directory or config file cannot be written.
pub fn run_init(_args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let docket_dir = project_root.join(DOCKET_DIR);
    let created = !docket_dir.is_dir();

    std::fs::create_dir_all(&docket_dir)
        .with_context(|| format!("Failed to create {}", docket_dir.display()))?;
    let config_written = config::write_default_project_config(project_root)?;

    let report = InitReport {
        root: project_root.display().to_string(),
        created,
        config_written,
    };

    render(output, &report, |r, w| {
        if r.created {
            writeln!(w, "✓ Initialized {DOCKET_DIR}/ in {}", r.root)?;
            if !output.is_pretty() {
                return Ok(());
            }
            writeln!(w)?;
            writeln!(w, "Next steps:")?;
            writeln!(w, "  dk login --id 1 --username alice")?;
            writeln!(w, "  dk create --title \"Fix bug\" --description \"Crash on startup\"")?;
        } else {
            writeln!(w, "{DOCKET_DIR}/ already exists in {}", r.root)?;
        }
        Ok(())
    })
}
