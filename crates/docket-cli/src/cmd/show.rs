//! `dk show` — one ticket with its comment thread.
//!
//! Also home to the ticket/comment line formats the other commands reuse.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Args;
use docket_core::{Comment, Ticket, TicketThread};

use crate::cmd::{Project, parse_ticket_id};
use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket ID.
    pub id: String,
}

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let id = parse_ticket_id(&args.id, output)?;

    let mut thread = project
        .tracker()
        .ticket_with_comments(id)
        .map_err(|e| fail(output, e))?;
    thread.comments.sort_by_key(|c| c.created_at);

    render_mode(output, &thread, write_thread_text, write_thread_pretty)
}

fn write_thread_text(thread: &TicketThread, w: &mut dyn Write) -> io::Result<()> {
    write_ticket_line(w, &thread.ticket)?;
    for comment in &thread.comments {
        write!(w, "  ")?;
        write_comment_line(w, comment)?;
    }
    Ok(())
}

fn write_thread_pretty(thread: &TicketThread, w: &mut dyn Write) -> io::Result<()> {
    write_ticket_detail(w, &thread.ticket)?;
    writeln!(w)?;
    pretty_section(w, &format!("Comments ({})", thread.comments.len()))?;
    if thread.comments.is_empty() {
        writeln!(w, "(none)")?;
    }
    for comment in &thread.comments {
        writeln!(
            w,
            "{} {} · {}",
            comment_author(comment),
            stamp(comment.created_at),
            comment.id
        )?;
        for line in comment.text.lines() {
            writeln!(w, "  {line}")?;
        }
    }
    Ok(())
}

/// `id \t priority \t status \t title`
pub fn write_ticket_line(w: &mut dyn Write, ticket: &Ticket) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        ticket.ticket_id, ticket.priority, ticket.status, ticket.title
    )
}

/// `id \t author \t createdAt \t text` (first line of the text only).
pub fn write_comment_line(w: &mut dyn Write, comment: &Comment) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}",
        comment.id,
        comment_author(comment),
        stamp(comment.created_at),
        comment.text.lines().next().unwrap_or_default()
    )
}

/// Key/value block for a single ticket.
pub fn write_ticket_detail(w: &mut dyn Write, ticket: &Ticket) -> io::Result<()> {
    pretty_section(w, &format!("Ticket {}", ticket.ticket_id))?;
    pretty_kv(w, "Title", &ticket.title)?;
    pretty_kv(w, "Priority", ticket.priority.as_str())?;
    pretty_kv(w, "Status", ticket.status.as_str())?;
    pretty_kv(
        w,
        "Owner",
        ticket.owner_username.as_deref().unwrap_or("anonymous"),
    )?;
    pretty_kv(w, "Created", stamp(ticket.created_at))?;
    if let Some(updated) = ticket.updated_at {
        pretty_kv(w, "Updated", stamp(updated))?;
    }
    writeln!(w)?;
    writeln!(w, "{}", ticket.description)
}

fn comment_author(comment: &Comment) -> &str {
    comment.username.as_deref().unwrap_or("anonymous")
}

fn stamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}
