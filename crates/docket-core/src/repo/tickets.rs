//! Ticket repository: owner of the `tickets` collection.

use tracing::{debug, info};

use crate::clock::{Clock, next_monotonic_millis};
use crate::error::{DocketError, Result, Target};
use crate::model::ticket::{Ticket, TicketDraft, TicketId, TicketPatch, TicketRules};
use crate::model::user::{Author, CurrentUser};
use crate::store::{self, Store};

/// Every call re-reads the collection, so there is no cached state to go
/// stale between screens.
pub struct TicketRepository<'a> {
    store: &'a dyn Store,
    clock: &'a dyn Clock,
    rules: TicketRules,
}

impl<'a> TicketRepository<'a> {
    pub fn new(store: &'a dyn Store, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            rules: TicketRules::default(),
        }
    }

    #[must_use]
    pub const fn with_rules(mut self, rules: TicketRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub const fn rules(&self) -> &TicketRules {
        &self.rules
    }

    fn load(&self) -> Result<Vec<Ticket>> {
        Ok(store::load_collection(self.store, store::TICKETS)?)
    }

    fn save(&self, tickets: &[Ticket]) -> Result<()> {
        Ok(store::save_collection(self.store, store::TICKETS, tickets)?)
    }

    /// Validate `draft`, stamp identity and ownership, and append it.
    ///
    /// # Errors
    ///
    /// - [`DocketError::Validation`] naming the first invalid field.
    /// - [`DocketError::Storage`] if the collection cannot be read or written;
    ///   nothing is persisted in that case.
    pub fn create(&self, draft: TicketDraft, author: Option<&CurrentUser>) -> Result<Ticket> {
        draft.validate(&self.rules)?;

        let mut tickets = self.load()?;
        let now = self.clock.now();
        let last = tickets.iter().map(|t| t.ticket_id.get()).max();
        let author = Author::from(author);

        let ticket = Ticket {
            ticket_id: TicketId::new(next_monotonic_millis(now, last)),
            title: draft.title,
            description: draft.description,
            priority: draft.priority,
            status: draft.status,
            owner_id: author.id,
            owner_username: author.username,
            created_at: now,
            updated_at: None,
        };

        tickets.push(ticket.clone());
        self.save(&tickets)?;
        info!(
            ticket = %ticket.ticket_id,
            priority = %ticket.priority,
            status = %ticket.status,
            "created ticket"
        );
        Ok(ticket)
    }

    /// Merge `patch` over the stored ticket and stamp `updatedAt`.
    ///
    /// `updatedAt` never moves backwards: it is the latest of now, the
    /// creation time, and the previous update time.
    ///
    /// # Errors
    ///
    /// - [`DocketError::NotFound`] if no ticket has `id`.
    /// - [`DocketError::Validation`] for a patched title/description that
    ///   breaks creation rules.
    /// - [`DocketError::Storage`] on read/write failure.
    pub fn update(&self, id: TicketId, patch: TicketPatch) -> Result<Ticket> {
        patch.validate(&self.rules)?;

        let mut tickets = self.load()?;
        let Some(ticket) = tickets.iter_mut().find(|t| t.ticket_id == id) else {
            return Err(DocketError::NotFound(Target::Ticket(id)));
        };

        let now = self.clock.now();
        let floor = ticket.last_touched();
        patch.apply_to(ticket);
        ticket.updated_at = Some(now.max(floor));
        let updated = ticket.clone();

        self.save(&tickets)?;
        info!(ticket = %id, "updated ticket");
        Ok(updated)
    }

    /// Remove the ticket with `id`. Idempotent: a missing id is a no-op and
    /// nothing is written. Comments referencing the ticket are untouched.
    ///
    /// Returns whether a record was removed.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read/write failure.
    pub fn delete(&self, id: TicketId) -> Result<bool> {
        let mut tickets = self.load()?;
        let before = tickets.len();
        tickets.retain(|t| t.ticket_id != id);

        if tickets.len() == before {
            debug!(ticket = %id, "delete of unknown ticket ignored");
            return Ok(false);
        }

        self.save(&tickets)?;
        info!(ticket = %id, "deleted ticket");
        Ok(true)
    }

    /// All tickets in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] if the collection is unreadable or a
    /// record does not match the ticket schema.
    pub fn list(&self) -> Result<Vec<Ticket>> {
        self.load()
    }

    /// All tickets, oldest `createdAt` first; ties keep stored order.
    ///
    /// # Errors
    ///
    /// See [`TicketRepository::list`].
    pub fn list_sorted_by_created(&self) -> Result<Vec<Ticket>> {
        let mut tickets = self.load()?;
        tickets.sort_by_key(|t| (t.created_at, t.ticket_id));
        Ok(tickets)
    }

    /// # Errors
    ///
    /// See [`TicketRepository::list`].
    pub fn get_by_id(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.load()?.into_iter().find(|t| t.ticket_id == id))
    }

    /// Like [`TicketRepository::get_by_id`], but a missing ticket is an error.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::NotFound`] if no ticket has `id`.
    pub fn require(&self, id: TicketId) -> Result<Ticket> {
        self.get_by_id(id)?
            .ok_or(DocketError::NotFound(Target::Ticket(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::ticket::{Priority, Status};
    use crate::model::user::UserId;
    use crate::store::MemoryStore;
    use chrono::Duration;

    const T0: i64 = 1_700_000_000_000;

    fn draft() -> TicketDraft {
        TicketDraft::new("Fix bug", "Crash on startup screen")
            .priority(Priority::High)
            .status(Status::Open)
    }

    #[test]
    fn create_stamps_identity_and_owner() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let alice = CurrentUser::new(1, "alice");

        let ticket = repo.create(draft(), Some(&alice)).unwrap();

        assert_eq!(ticket.ticket_id, TicketId::new(T0));
        assert_eq!(ticket.created_at.timestamp_millis(), T0);
        assert_eq!(ticket.owner_id, Some(UserId::Number(1)));
        assert_eq!(ticket.owner_username.as_deref(), Some("alice"));
        assert_eq!(ticket.updated_at, None);
        assert_eq!(repo.list().unwrap(), vec![ticket]);
    }

    #[test]
    fn anonymous_create_leaves_owner_unset() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let ticket = TicketRepository::new(&store, &clock)
            .create(draft(), None)
            .unwrap();
        assert_eq!(ticket.owner_id, None);
        assert_eq!(ticket.owner_username, None);
    }

    #[test]
    fn same_millisecond_creates_get_distinct_ids() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);

        let a = repo.create(draft(), None).unwrap();
        let b = repo.create(draft(), None).unwrap();
        assert_eq!(a.ticket_id, TicketId::new(T0));
        assert_eq!(b.ticket_id, TicketId::new(T0 + 1));
    }

    #[test]
    fn invalid_draft_is_not_persisted() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);

        let err = repo
            .create(TicketDraft::new("ok", "Crash on startup screen"), None)
            .unwrap_err();
        assert!(matches!(err, DocketError::Validation { field: "title", .. }));
        assert!(store.raw(store::TICKETS).is_none());
    }

    #[test]
    fn custom_rules_are_applied() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock).with_rules(TicketRules {
            min_title_len: 1,
            min_description_len: 1,
        });
        repo.create(TicketDraft::new("x", "y"), None).unwrap();
    }

    #[test]
    fn update_merges_and_stamps() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let created = repo.create(draft(), None).unwrap();

        clock.advance(Duration::seconds(5));
        let updated = repo
            .update(created.ticket_id, TicketPatch::default().status(Status::Resolved))
            .unwrap();

        assert_eq!(updated.status, Status::Resolved);
        assert_eq!(updated.title, created.title);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at.map(|t| t.timestamp_millis()), Some(T0 + 5_000));
        assert_eq!(repo.get_by_id(created.ticket_id).unwrap(), Some(updated));
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let created = repo.create(draft(), None).unwrap();

        clock.advance(Duration::seconds(-60));
        let updated = repo
            .update(created.ticket_id, TicketPatch::default().priority(Priority::Low))
            .unwrap();
        assert_eq!(updated.updated_at, Some(created.created_at));
    }

    #[test]
    fn update_of_unknown_ticket_is_not_found() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);

        let err = repo
            .update(TicketId::new(1), TicketPatch::default().status(Status::Open))
            .unwrap_err();
        assert!(matches!(err, DocketError::NotFound(Target::Ticket(id)) if id == TicketId::new(1)));
    }

    #[test]
    fn update_rejects_short_title() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let created = repo.create(draft(), None).unwrap();

        let err = repo
            .update(created.ticket_id, TicketPatch::default().title("no"))
            .unwrap_err();
        assert!(matches!(err, DocketError::Validation { field: "title", .. }));
        assert_eq!(repo.require(created.ticket_id).unwrap(), created);
    }

    #[test]
    fn delete_is_idempotent() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let keep = repo.create(draft(), None).unwrap();
        let drop = repo.create(draft(), None).unwrap();

        assert!(repo.delete(drop.ticket_id).unwrap());
        let after_once = store.raw(store::TICKETS);
        assert!(!repo.delete(drop.ticket_id).unwrap());
        assert_eq!(store.raw(store::TICKETS), after_once);
        assert_eq!(repo.list().unwrap(), vec![keep]);
    }

    #[test]
    fn storage_failure_discards_the_mutation() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let created = repo.create(draft(), None).unwrap();

        store.set_read_only(true);
        let err = repo
            .update(created.ticket_id, TicketPatch::default().status(Status::Resolved))
            .unwrap_err();
        assert!(matches!(err, DocketError::Storage(_)));
        assert_eq!(repo.require(created.ticket_id).unwrap().status, Status::Open);
    }

    #[test]
    fn sorted_listing_orders_by_creation() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = TicketRepository::new(&store, &clock);
        let first = repo.create(draft(), None).unwrap();
        clock.advance(Duration::seconds(1));
        let second = repo.create(draft(), None).unwrap();

        let mut reversed = repo.list().unwrap();
        reversed.reverse();
        store::save_collection(&store, store::TICKETS, &reversed).unwrap();

        let ids: Vec<_> = repo
            .list_sorted_by_created()
            .unwrap()
            .into_iter()
            .map(|t| t.ticket_id)
            .collect();
        assert_eq!(ids, vec![first.ticket_id, second.ticket_id]);
    }

    #[test]
    fn malformed_record_surfaces_as_storage_error() {
        let store = MemoryStore::new().with_raw(
            store::TICKETS,
            r#"[{"ticketId": 1, "title": "Bad", "description": "Unknown priority",
                 "priority": "urgent", "status": "Open", "createdAt": "2024-01-01T00:00:00Z"}]"#,
        );
        let clock = ManualClock::at_millis(T0);
        let err = TicketRepository::new(&store, &clock).list().unwrap_err();
        assert!(matches!(err, DocketError::Storage(_)));
    }
}
