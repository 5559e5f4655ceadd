//! Kanban board transitions.
//!
//! A drag session holds at most one ticket. Dropping it on a priority column
//! moves the ticket there; dropping it on the trash deletes it after
//! confirmation. Every drop ends the session, whatever the result.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::model::ticket::{Priority, Ticket, TicketId, TicketPatch};
use crate::tracker::{TicketDeletion, Tracker};

/// Result of a drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DropOutcome {
    /// Nothing was held; nothing changed.
    NoSession,
    Moved { ticket: Ticket },
    Deleted { ticket_id: TicketId, deletion: TicketDeletion },
    /// The trash drop was declined at confirmation.
    Cancelled { ticket_id: TicketId },
}

/// A drop outcome plus the ticket collection as re-read after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardUpdate {
    pub outcome: DropOutcome,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoardSession {
    held: Option<TicketId>,
}

impl BoardSession {
    #[must_use]
    pub const fn new() -> Self {
        Self { held: None }
    }

    /// Pick up `id`, replacing anything already held.
    pub fn drag_start(&mut self, id: TicketId) {
        if let Some(previous) = self.held.replace(id) {
            debug!(previous = %previous, ticket = %id, "drag replaced held ticket");
        }
    }

    /// Abandon the drag without dropping.
    pub fn drag_cancel(&mut self) {
        self.held = None;
    }

    #[must_use]
    pub const fn held(&self) -> Option<TicketId> {
        self.held
    }

    /// Move the held ticket to the `target` column. Only `priority` changes;
    /// dropping on the current column still counts as an edit.
    ///
    /// # Errors
    ///
    /// Returns any error of [`crate::repo::TicketRepository::update`], e.g.
    /// `NotFound` if the held ticket was deleted meanwhile. The session is
    /// cleared either way.
    pub fn drop_on_column(
        &mut self,
        tracker: &Tracker<'_>,
        target: Priority,
    ) -> Result<BoardUpdate> {
        let Some(id) = self.held.take() else {
            warn!(column = %target, "drop with no held ticket ignored");
            return settle(tracker, DropOutcome::NoSession);
        };

        let ticket = tracker
            .tickets()
            .update(id, TicketPatch::default().priority(target))?;
        info!(ticket = %id, column = %target, "moved ticket on board");
        settle(tracker, DropOutcome::Moved { ticket })
    }

    /// Delete the held ticket if `confirm` agrees.
    ///
    /// # Errors
    ///
    /// Returns any error of [`Tracker::delete_ticket`]. The session is
    /// cleared either way.
    pub fn drop_on_trash(
        &mut self,
        tracker: &Tracker<'_>,
        confirm: impl FnOnce(TicketId) -> bool,
    ) -> Result<BoardUpdate> {
        let Some(id) = self.held.take() else {
            warn!("trash drop with no held ticket ignored");
            return settle(tracker, DropOutcome::NoSession);
        };

        if !confirm(id) {
            debug!(ticket = %id, "trash drop declined");
            return settle(tracker, DropOutcome::Cancelled { ticket_id: id });
        }

        let deletion = tracker.delete_ticket(id)?;
        settle(
            tracker,
            DropOutcome::Deleted {
                ticket_id: id,
                deletion,
            },
        )
    }
}

fn settle(tracker: &Tracker<'_>, outcome: DropOutcome) -> Result<BoardUpdate> {
    Ok(BoardUpdate {
        outcome,
        tickets: tracker.tickets().list()?,
    })
}
