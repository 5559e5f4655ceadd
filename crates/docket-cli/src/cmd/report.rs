//! `dk report` — ticket totals, priority/status histograms, and orphaned
//! comments.

use std::io::{self, Write};
use std::path::Path;

use clap::Args;
use docket_core::{Priority, Status, TicketReport};
use serde::Serialize;

use crate::cmd::Project;
use crate::output::{OutputMode, fail, pretty_kv, pretty_section, render_mode};

/// Arguments for `dk report`.
#[derive(Args, Debug, Default)]
pub struct ReportArgs {
    /// Delete comments whose ticket no longer exists before reporting.
    #[arg(long)]
    pub prune_orphans: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportView {
    #[serde(flatten)]
    report: TicketReport,
    orphaned_comments: usize,
    pruned_comments: usize,
}

/// Execute `dk report`.
pub fn run_report(
    args: &ReportArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let project = Project::open(project_root, output)?;
    let tracker = project.tracker();

    let pruned_comments = if args.prune_orphans {
        tracker.prune_orphans().map_err(|e| fail(output, e))?
    } else {
        0
    };
    let report = tracker.report().map_err(|e| fail(output, e))?;
    let orphaned_comments = tracker
        .orphaned_comments()
        .map_err(|e| fail(output, e))?
        .len();

    let view = ReportView {
        report,
        orphaned_comments,
        pruned_comments,
    };
    render_mode(output, &view, write_text, write_pretty)
}

fn write_text(v: &ReportView, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "total\t{}", v.report.total)?;
    writeln!(w, "users\t{}", v.report.users)?;
    for p in Priority::ALL {
        writeln!(w, "priority\t{p}\t{}", v.report.priority.count(p))?;
    }
    for s in Status::ALL {
        writeln!(w, "status\t{s}\t{}", v.report.status.count(s))?;
    }
    writeln!(w, "orphaned_comments\t{}", v.orphaned_comments)?;
    if v.pruned_comments > 0 {
        writeln!(w, "pruned_comments\t{}", v.pruned_comments)?;
    }
    Ok(())
}

fn write_pretty(v: &ReportView, w: &mut dyn Write) -> io::Result<()> {
    let r = &v.report;
    pretty_section(w, "Report")?;
    pretty_kv(w, "Tickets", r.total.to_string())?;
    pretty_kv(w, "Users", r.users.to_string())?;
    writeln!(w)?;

    pretty_section(w, "By priority")?;
    for p in Priority::ALL {
        write_bar(w, p.as_str(), r.priority.count(p), r.priority.total())?;
    }
    writeln!(w)?;

    pretty_section(w, "By status")?;
    for s in Status::ALL {
        write_bar(w, s.as_str(), r.status.count(s), r.status.total())?;
    }

    if v.orphaned_comments > 0 || v.pruned_comments > 0 {
        writeln!(w)?;
        pretty_kv(w, "Orphans", v.orphaned_comments.to_string())?;
        if v.pruned_comments > 0 {
            pretty_kv(w, "Pruned", v.pruned_comments.to_string())?;
        }
    }
    Ok(())
}

/// `label  count  ####` scaled to 30 columns.
fn write_bar(w: &mut dyn Write, label: &str, count: usize, total: usize) -> io::Result<()> {
    const BAR_WIDTH: usize = 30;
    let filled = if total == 0 {
        0
    } else {
        count * BAR_WIDTH / total
    };
    writeln!(w, "{label:<12} {count:>5}  {}", "#".repeat(filled))
}
