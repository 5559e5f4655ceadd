//! `dk delete` — remove a ticket.

use std::path::Path;

use clap::Args;
use docket_core::{TicketDeletion, TicketId};
use serde::Serialize;

use crate::cmd::{Project, confirm, parse_ticket_id};
use crate::output::{OutputMode, fail, render};

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Ticket ID.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteReport {
    ticket_id: TicketId,
    confirmed: bool,
    #[serde(flatten)]
    deletion: TicketDeletion,
}

pub fn run_delete(
    args: &DeleteArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let id = parse_ticket_id(&args.id, output)?;

    let confirmed = args.yes || confirm(&format!("Delete ticket {id}?"))?;
    let deletion = if confirmed {
        project
            .tracker()
            .delete_ticket(id)
            .map_err(|e| fail(output, e))?
    } else {
        TicketDeletion::default()
    };

    let report = DeleteReport {
        ticket_id: id,
        confirmed,
        deletion,
    };
    render(output, &report, describe)
}

fn describe(r: &DeleteReport, w: &mut dyn std::io::Write) -> std::io::Result<()> {
    if !r.confirmed {
        return writeln!(
            w,
            "Cancelled; ticket {} kept (pass --yes to skip the prompt)",
            r.ticket_id
        );
    }
    if !r.deletion.removed {
        return writeln!(w, "No ticket {}; nothing to delete", r.ticket_id);
    }
    writeln!(w, "✓ Deleted ticket {}", r.ticket_id)?;
    if r.deletion.comments_removed > 0 {
        writeln!(w, "  removed {} comment(s)", r.deletion.comments_removed)?;
    }
    if r.deletion.comments_orphaned > 0 {
        writeln!(w, "  {} comment(s) left orphaned", r.deletion.comments_orphaned)?;
    }
    Ok(())
}
