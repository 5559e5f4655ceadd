//! Facade over the repositories that applies project configuration and the
//! policies spanning both collections.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::ProjectConfig;
use crate::error::{DocketError, Result, Target};
use crate::filter::{self, TicketReport};
use crate::identity::{KnownUsers, StoredSession};
use crate::model::comment::Comment;
use crate::model::ticket::{Ticket, TicketId};
use crate::model::user::CurrentUser;
use crate::repo::{CommentRepository, TicketRepository};
use crate::store::Store;

/// A ticket together with its comments, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketThread {
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
}

/// What a ticket deletion did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDeletion {
    /// Whether a ticket record was removed.
    pub removed: bool,
    /// Comments deleted with it (cascade policy).
    pub comments_removed: usize,
    /// Comments left referencing the deleted id (orphan policy).
    pub comments_orphaned: usize,
}

pub struct Tracker<'a> {
    store: &'a dyn Store,
    clock: &'a dyn Clock,
    config: ProjectConfig,
}

impl<'a> Tracker<'a> {
    pub fn new(store: &'a dyn Store, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            config: ProjectConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ProjectConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &'a dyn Store {
        self.store
    }

    #[must_use]
    pub fn tickets(&self) -> TicketRepository<'a> {
        TicketRepository::new(self.store, self.clock).with_rules(self.config.tickets.rules())
    }

    #[must_use]
    pub fn comments(&self) -> CommentRepository<'a> {
        CommentRepository::new(self.store, self.clock).with_rules(self.config.comments.rules())
    }

    #[must_use]
    pub fn session(&self) -> StoredSession<'a> {
        StoredSession::new(self.store)
    }

    #[must_use]
    pub fn users(&self) -> KnownUsers<'a> {
        KnownUsers::new(self.store)
    }

    /// Delete a ticket, then cascade or orphan its comments according to
    /// `tickets.cascade_comments`. Deleting a missing ticket is a no-op for
    /// the ticket collection and orphans nothing; a cascade still clears any
    /// stale comments.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read/write failure. A failure
    /// after the ticket was removed leaves its comments orphaned.
    pub fn delete_ticket(&self, id: TicketId) -> Result<TicketDeletion> {
        let removed = self.tickets().delete(id)?;

        let mut outcome = TicketDeletion {
            removed,
            ..TicketDeletion::default()
        };
        if self.config.tickets.cascade_comments {
            outcome.comments_removed = self.comments().purge_ticket(id)?;
        } else if removed {
            outcome.comments_orphaned = self.comments().list_by_ticket(id)?.len();
            if outcome.comments_orphaned > 0 {
                warn!(
                    ticket = %id,
                    count = outcome.comments_orphaned,
                    "ticket deleted, comments left orphaned"
                );
            }
        }
        Ok(outcome)
    }

    /// Add a comment after checking that the ticket exists.
    ///
    /// # Errors
    ///
    /// - [`DocketError::NotFound`] if the ticket does not exist.
    /// - Any error of [`CommentRepository::add`].
    pub fn add_comment(
        &self,
        ticket_id: TicketId,
        text: &str,
        author: Option<&CurrentUser>,
    ) -> Result<Comment> {
        if self.tickets().get_by_id(ticket_id)?.is_none() {
            return Err(DocketError::NotFound(Target::Ticket(ticket_id)));
        }
        self.comments().add(ticket_id, text, author)
    }

    /// # Errors
    ///
    /// Returns [`DocketError::NotFound`] if the ticket does not exist.
    pub fn ticket_with_comments(&self, id: TicketId) -> Result<TicketThread> {
        let ticket = self.tickets().require(id)?;
        let comments = self.comments().list_by_ticket(id)?;
        Ok(TicketThread { ticket, comments })
    }

    /// Report over the raw `tickets` collection, tolerant of malformed
    /// priority/status values.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] if a collection is unreadable.
    pub fn report(&self) -> Result<TicketReport> {
        let tickets = filter::load_loose(self.store)?;
        let users = self.users().list()?.len();
        Ok(TicketReport::from_tickets(&tickets, users))
    }

    /// Comments whose ticket no longer exists.
    ///
    /// Ticket ids come from the loose read, so a hand-edited ticket with an
    /// unrecognized priority or status still counts as existing.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] if a collection is unreadable.
    pub fn orphaned_comments(&self) -> Result<Vec<Comment>> {
        let known: HashSet<TicketId> = filter::load_loose(self.store)?
            .into_iter()
            .filter_map(|t| t.ticket_id)
            .collect();
        self.comments().orphans(&known)
    }

    /// Delete every orphaned comment. Returns the count removed.
    ///
    /// Unlike [`Tracker::orphaned_comments`] this reads tickets strictly:
    /// nothing is deleted while the ticket collection does not parse.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read/write failure.
    pub fn prune_orphans(&self) -> Result<usize> {
        let known: HashSet<TicketId> = self
            .tickets()
            .list()?
            .into_iter()
            .map(|t| t.ticket_id)
            .collect();
        let orphaned: HashSet<TicketId> = self
            .comments()
            .orphans(&known)?
            .into_iter()
            .map(|c| c.ticket_id)
            .collect();

        let mut removed = 0;
        for ticket_id in orphaned {
            removed += self.comments().purge_ticket(ticket_id)?;
        }
        if removed > 0 {
            info!(removed, "pruned orphaned comments");
        }
        Ok(removed)
    }
}
