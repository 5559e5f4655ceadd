//! `dk update` — patch fields of an existing ticket.

use std::path::Path;

use clap::Args;
use docket_core::{Priority, Status, TicketPatch};

use crate::cmd::show::{write_ticket_detail, write_ticket_line};
use crate::cmd::{Project, parse_field, parse_ticket_id};
use crate::output::{OutputMode, fail, render_mode};

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Ticket ID.
    pub id: String,

    /// New title.
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New priority: High, Medium, or Low.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// New status: Open, "In Progress", or Resolved.
    #[arg(short, long)]
    pub status: Option<String>,
}

impl UpdateArgs {
    fn patch(&self, output: OutputMode) -> anyhow::Result<TicketPatch> {
        let mut patch = TicketPatch::default();
        if let Some(title) = &self.title {
            patch = patch.title(title);
        }
        if let Some(description) = &self.description {
            patch = patch.description(description);
        }
        if let Some(raw) = &self.priority {
            patch = patch.priority(parse_field::<Priority>(raw, output)?);
        }
        if let Some(raw) = &self.status {
            patch = patch.status(parse_field::<Status>(raw, output)?);
        }
        Ok(patch)
    }
}

pub fn run_update(
    args: &UpdateArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let id = parse_ticket_id(&args.id, output)?;
    let patch = args.patch(output)?;

    let ticket = project
        .tracker()
        .tickets()
        .update(id, patch)
        .map_err(|e| fail(output, e))?;

    render_mode(output, &ticket, |t, w| write_ticket_line(w, t), |t, w| {
        writeln!(w, "✓ Updated ticket {}", t.ticket_id)?;
        writeln!(w)?;
        write_ticket_detail(w, t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: UpdateArgs,
    }

    #[test]
    fn only_given_fields_are_patched() {
        let w = Wrapper::parse_from(["test", "42", "--status", "in progress"]);
        let patch = w.args.patch(OutputMode::Text).unwrap();
        assert_eq!(patch.status, Some(Status::InProgress));
        assert_eq!(patch.title, None);
        assert_eq!(patch.priority, None);
    }

    #[test]
    fn bad_priority_is_rejected() {
        let w = Wrapper::parse_from(["test", "42", "--priority", "urgent"]);
        assert!(w.args.patch(OutputMode::Json).is_err());
    }
}
