//! `dk comment` and `dk comments` — add, edit, remove, and list comments on
//! a ticket.
//!
//! Edits and removals are restricted to the comment's author; the acting
//! user comes from `DOCKET_USER_ID` or the stored session.

use std::path::Path;

use clap::{Args, Subcommand};
use docket_core::{Comment, CommentId};
use serde::Serialize;

use crate::cmd::show::write_comment_line;
use crate::cmd::{Project, confirm, parse_field, parse_ticket_id};
use crate::output::{OutputMode, fail, pretty_section, render, render_mode};

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    /// Add a comment to a ticket.
    Add(AddArgs),
    /// Replace the text of one of your comments.
    Edit(EditArgs),
    /// Delete one of your comments.
    Rm(RmArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Ticket ID.
    pub ticket: String,
    /// Comment text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Comment ID.
    pub id: String,
    /// Replacement text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct RmArgs {
    /// Comment ID.
    pub id: String,

    /// Skip the confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Args, Debug)]
pub struct ListCommentsArgs {
    /// Ticket ID.
    pub ticket: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RemovalReport {
    comment_id: CommentId,
    removed: Option<Comment>,
}

pub fn run_comment(
    command: &CommentCommand,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match command {
        CommentCommand::Add(args) => run_add(args, output, project_root),
        CommentCommand::Edit(args) => run_edit(args, output, project_root),
        CommentCommand::Rm(args) => run_rm(args, output, project_root),
    }
}

fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let ticket_id = parse_ticket_id(&args.ticket, output)?;
    let author = project.current_user(output)?;

    let comment = project
        .tracker()
        .add_comment(ticket_id, &args.text, author.as_ref())
        .map_err(|e| fail(output, e))?;

    render(output, &comment, |c, w| {
        writeln!(w, "✓ Added comment {} to ticket {}", c.id, c.ticket_id)
    })
}

fn run_edit(args: &EditArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let id: CommentId = parse_field(&args.id, output)?;
    let actor = project.current_user(output)?;

    let comment = project
        .tracker()
        .comments()
        .edit_by_id(id, &args.text, actor.as_ref())
        .map_err(|e| fail(output, e))?;

    render(output, &comment, |c, w| writeln!(w, "✓ Edited comment {}", c.id))
}

fn run_rm(args: &RmArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let id: CommentId = parse_field(&args.id, output)?;
    let actor = project.current_user(output)?;

    let removed = if args.yes || confirm(&format!("Delete comment {id}?"))? {
        let comment = project
            .tracker()
            .comments()
            .delete_by_id(id, actor.as_ref())
            .map_err(|e| fail(output, e))?;
        Some(comment)
    } else {
        None
    };

    let report = RemovalReport {
        comment_id: id,
        removed,
    };
    render(output, &report, |r, w| match &r.removed {
        Some(_) => writeln!(w, "✓ Deleted comment {}", r.comment_id),
        None => writeln!(w, "Cancelled; comment {} kept", r.comment_id),
    })
}

/// Execute `dk comments`: a ticket's comments in stored order.
pub fn run_list_comments(
    args: &ListCommentsArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let ticket_id = parse_ticket_id(&args.ticket, output)?;

    let comments = project
        .tracker()
        .comments()
        .list_by_ticket(ticket_id)
        .map_err(|e| fail(output, e))?;

    render_mode(
        output,
        &comments,
        |rows, w| {
            for comment in rows {
                write_comment_line(w, comment)?;
            }
            Ok(())
        },
        |rows, w| {
            pretty_section(w, &format!("Comments on {ticket_id} ({})", rows.len()))?;
            for comment in rows {
                write_comment_line(w, comment)?;
            }
            Ok(())
        },
    )
}
