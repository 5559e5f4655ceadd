//! Command handlers. Each module owns one `dk` subcommand (or group).

pub mod board;
pub mod comment;
pub mod completions;
pub mod create;
pub mod delete;
pub mod init;
pub mod list;
pub mod login;
pub mod report;
pub mod show;
pub mod update;

use std::io::{IsTerminal, Write};
use std::path::Path;

use docket_core::config::{self, DOCKET_DIR, ProjectConfig};
use docket_core::{
    CurrentUser, DocketError, ErrorCode, FileStore, SystemClock, TicketId, Tracker,
};
use tracing::debug;

use crate::output::{CliError, OutputMode, fail, render_error};
use crate::session;

/// An opened `.docket/` project: its store, config, and clock.
pub struct Project {
    pub store: FileStore,
    pub config: ProjectConfig,
    clock: SystemClock,
}

impl Project {
    /// Locate `.docket/` at or above `start` and load its config.
    ///
    /// # Errors
    ///
    /// Renders and returns an error if no project is found or the config
    /// does not parse.
    pub fn open(start: &Path, output: OutputMode) -> anyhow::Result<Self> {
        let Some(root) = config::find_project_root(start) else {
            let code = ErrorCode::NotInitialized;
            let msg = format!("Not a docket project: {DOCKET_DIR} directory not found");
            render_error(
                output,
                &CliError::with_details(&msg, code.hint().unwrap_or_default(), code.code()),
            )?;
            anyhow::bail!(msg);
        };

        let config = match config::load_project_config(&root) {
            Ok(config) => config,
            Err(e) => {
                let code = ErrorCode::ConfigParseError;
                render_error(
                    output,
                    &CliError::with_details(
                        format!("{e:#}"),
                        code.hint().unwrap_or_default(),
                        code.code(),
                    ),
                )?;
                return Err(e);
            }
        };

        debug!(root = %root.display(), "opened project");
        Ok(Self {
            store: FileStore::new(root.join(DOCKET_DIR)),
            config,
            clock: SystemClock,
        })
    }

    pub fn tracker(&self) -> Tracker<'_> {
        Tracker::new(&self.store, &self.clock).with_config(self.config.clone())
    }

    /// The acting user, or anonymous.
    ///
    /// # Errors
    ///
    /// Renders and returns an error if the session record is unreadable.
    pub fn current_user(&self, output: OutputMode) -> anyhow::Result<Option<CurrentUser>> {
        session::resolve_user(&self.store).map_err(|e| fail(output, e))
    }
}

/// Parse a ticket id argument, rendering a validation error on failure.
pub fn parse_ticket_id(raw: &str, output: OutputMode) -> anyhow::Result<TicketId> {
    raw.parse::<TicketId>()
        .map_err(|e| fail(output, DocketError::from(e)))
}

/// Parse a free-text value into a domain type, rendering a validation error
/// on failure.
pub fn parse_field<T>(raw: &str, output: OutputMode) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    DocketError: From<T::Err>,
{
    raw.parse::<T>().map_err(|e| fail(output, DocketError::from(e)))
}

/// Ask before a destructive action. Non-interactive sessions are treated as
/// declined; pass `--yes` to skip the prompt.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    if !std::io::stdin().is_terminal() {
        return Ok(false);
    }

    eprint!("{prompt} [y/N] ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    let answer = input.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}
