//! `dk board` — the Kanban view, one column per priority.
//!
//! `board move` and `board trash` replay a single drag/drop through
//! [`BoardSession`] so the CLI follows the same transitions as the board.

use std::io::{self, Write};
use std::path::Path;

use clap::{Args, Subcommand};
use docket_core::filter;
use docket_core::{BoardSession, BoardUpdate, DropOutcome, Priority, Ticket};
use serde::Serialize;

use crate::cmd::{Project, confirm, parse_field, parse_ticket_id};
use crate::output::{OutputMode, fail, pretty_rule, render_mode};

#[derive(Args, Debug)]
pub struct BoardArgs {
    #[command(subcommand)]
    pub command: Option<BoardCommand>,
}

#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    /// Drop a ticket on a priority column.
    Move(MoveArgs),
    /// Drop a ticket on the trash (deletes it after confirmation).
    Trash(TrashArgs),
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Ticket ID.
    pub id: String,
    /// Target column: High, Medium, or Low.
    pub column: String,
}

#[derive(Args, Debug)]
pub struct TrashArgs {
    /// Ticket ID.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct Column<'t> {
    priority: Priority,
    tickets: Vec<&'t Ticket>,
}

pub fn run_board(args: &BoardArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let tracker = project.tracker();
    let mut session = BoardSession::new();

    let update = match &args.command {
        None => {
            let tickets = tracker.tickets().list().map_err(|e| fail(output, e))?;
            return show_columns(&tickets, output);
        }
        Some(BoardCommand::Move(m)) => {
            let id = parse_ticket_id(&m.id, output)?;
            let column: Priority = parse_field(&m.column, output)?;
            session.drag_start(id);
            session.drop_on_column(&tracker, column)
        }
        Some(BoardCommand::Trash(t)) => {
            let id = parse_ticket_id(&t.id, output)?;
            session.drag_start(id);
            session.drop_on_trash(&tracker, |held| {
                t.yes || confirm(&format!("Delete ticket {held}?")).unwrap_or(false)
            })
        }
    }
    .map_err(|e| fail(output, e))?;

    render_mode(output, &update, write_outcome, |u, w| {
        write_outcome(u, w)?;
        writeln!(w)?;
        write_columns(&group(&u.tickets), w)
    })
}

fn group(tickets: &[Ticket]) -> Vec<Column<'_>> {
    filter::group_by_priority(tickets)
        .into_iter()
        .map(|(priority, tickets)| Column { priority, tickets })
        .collect()
}

fn show_columns(tickets: &[Ticket], output: OutputMode) -> anyhow::Result<()> {
    let columns = group(tickets);
    render_mode(
        output,
        &columns,
        |cols, w| {
            for col in cols {
                for ticket in &col.tickets {
                    writeln!(w, "{}\t{}\t{}", col.priority, ticket.ticket_id, ticket.title)?;
                }
            }
            Ok(())
        },
        |cols, w| write_columns(cols, w),
    )
}

fn write_columns(columns: &[Column<'_>], w: &mut dyn Write) -> io::Result<()> {
    for col in columns {
        writeln!(w, "{} ({})", col.priority, col.tickets.len())?;
        pretty_rule(w)?;
        if col.tickets.is_empty() {
            writeln!(w, "  (empty)")?;
        }
        for ticket in &col.tickets {
            writeln!(w, "  {}  [{}]  {}", ticket.ticket_id, ticket.status, ticket.title)?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_outcome(update: &BoardUpdate, w: &mut dyn Write) -> io::Result<()> {
    match &update.outcome {
        DropOutcome::NoSession => writeln!(w, "Nothing held; board unchanged"),
        DropOutcome::Moved { ticket } => {
            writeln!(w, "✓ Moved ticket {} to {}", ticket.ticket_id, ticket.priority)
        }
        DropOutcome::Deleted { ticket_id, deletion } if deletion.removed => {
            writeln!(w, "✓ Deleted ticket {ticket_id}")
        }
        DropOutcome::Deleted { ticket_id, .. } => {
            writeln!(w, "No ticket {ticket_id}; nothing to delete")
        }
        DropOutcome::Cancelled { ticket_id } => {
            writeln!(w, "Cancelled; ticket {ticket_id} kept")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use clap::Parser;
    use docket_core::{Status, TicketId};

    fn ticket(id: i64, priority: Priority) -> Ticket {
        Ticket {
            ticket_id: TicketId::new(id),
            title: format!("Ticket {id}"),
            description: "Something to do".to_string(),
            priority,
            status: Status::Open,
            owner_id: None,
            owner_username: None,
            created_at: Utc.timestamp_millis_opt(id).unwrap(),
            updated_at: None,
        }
    }

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: BoardArgs,
    }

    #[test]
    fn bare_board_shows_columns() {
        let w = Wrapper::parse_from(["test"]);
        assert!(w.args.command.is_none());
    }

    #[test]
    fn move_parses_id_and_column() {
        let w = Wrapper::parse_from(["test", "move", "42", "low"]);
        let Some(BoardCommand::Move(m)) = w.args.command else {
            panic!("expected move");
        };
        assert_eq!(m.id, "42");
        assert_eq!(m.column, "low");
    }

    #[test]
    fn columns_follow_board_order() {
        let tickets = vec![ticket(1, Priority::Low), ticket(2, Priority::High)];
        let mut buf = Vec::new();
        write_columns(&group(&tickets), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        let high = text.find("High (1)").unwrap();
        let medium = text.find("Medium (0)").unwrap();
        let low = text.find("Low (1)").unwrap();
        assert!(high < medium && medium < low);
    }

    #[test]
    fn cancelled_outcome_is_described() {
        let update = BoardUpdate {
            outcome: DropOutcome::Cancelled {
                ticket_id: TicketId::new(7),
            },
            tickets: Vec::new(),
        };
        let mut buf = Vec::new();
        write_outcome(&update, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Cancelled; ticket 7 kept\n");
    }
}
