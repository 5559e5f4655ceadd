//! `dk create` — create a new ticket.

use std::path::Path;

use clap::Args;
use docket_core::{Priority, Status, TicketDraft};

use crate::cmd::show::{write_ticket_detail, write_ticket_line};
use crate::cmd::{Project, parse_field};
use crate::output::{OutputMode, fail, render_mode};

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Short summary (at least 3 characters by default).
    #[arg(short, long)]
    pub title: String,

    /// Full description (at least 10 characters by default).
    #[arg(short, long)]
    pub description: String,

    /// Priority: High, Medium, or Low.
    #[arg(short, long, default_value = "Medium")]
    pub priority: String,

    /// Status: Open, "In Progress", or Resolved.
    #[arg(short, long, default_value = "Open")]
    pub status: String,
}

pub fn run_create(
    args: &CreateArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let priority: Priority = parse_field(&args.priority, output)?;
    let status: Status = parse_field(&args.status, output)?;
    let author = project.current_user(output)?;

    let draft = TicketDraft::new(&args.title, &args.description)
        .priority(priority)
        .status(status);
    let ticket = project
        .tracker()
        .tickets()
        .create(draft, author.as_ref())
        .map_err(|e| fail(output, e))?;

    render_mode(output, &ticket, |t, w| write_ticket_line(w, t), |t, w| {
        writeln!(w, "✓ Created ticket {}", t.ticket_id)?;
        writeln!(w)?;
        write_ticket_detail(w, t)
    })
}
