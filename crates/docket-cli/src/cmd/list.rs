//! `dk list` — list tickets with filtering.

use std::path::Path;

use clap::Args;
use docket_core::filter::{self, SortOrder, TicketFilter};

use crate::cmd::show::write_ticket_line;
use crate::cmd::{Project, parse_field};
use crate::output::{OutputMode, fail, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by priority: High, Medium, Low, or All.
    #[arg(short, long)]
    pub priority: Option<String>,

    /// Filter by status: Open, "In Progress", Resolved, or All.
    #[arg(short, long)]
    pub status: Option<String>,

    /// Sort order: stored, created, newest, updated.
    #[arg(long, default_value = "stored")]
    pub sort: String,
}

pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let criteria = TicketFilter::parse(args.priority.as_deref(), args.status.as_deref())
        .map_err(|e| fail(output, e))?;
    let order: SortOrder = parse_field(&args.sort, output)?;

    let mut tickets = project
        .tracker()
        .tickets()
        .list()
        .map_err(|e| fail(output, e))?;
    order.apply(&mut tickets);
    let shown = filter::filter_by(&tickets, &criteria);

    render_mode(
        output,
        &shown,
        |rows, w| {
            for ticket in rows {
                write_ticket_line(w, ticket)?;
            }
            Ok(())
        },
        |rows, w| {
            pretty_section(w, &format!("Tickets ({} of {})", rows.len(), tickets.len()))?;
            if rows.is_empty() {
                writeln!(w, "No tickets match.")?;
            }
            for ticket in rows {
                writeln!(
                    w,
                    "{:<15} {:<7} {:<12} {}",
                    ticket.ticket_id.to_string(),
                    ticket.priority.as_str(),
                    ticket.status.as_str(),
                    ticket.title
                )?;
            }
            Ok(())
        },
    )
}
