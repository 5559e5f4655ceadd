//! Comment repository: owner of the `comments` collection.
//!
//! Comments are addressed either by their dedicated [`CommentId`] or by the
//! composite [`CommentKey`]. Edit and delete check authorship here, against
//! the actor the caller passes in.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{DocketError, Result, Target};
use crate::identity::ensure_author;
use crate::model::comment::{Comment, CommentId, CommentKey, CommentRules};
use crate::model::ticket::TicketId;
use crate::model::user::{Author, CurrentUser};
use crate::store::{self, Store};

pub struct CommentRepository<'a> {
    store: &'a dyn Store,
    clock: &'a dyn Clock,
    rules: CommentRules,
}

impl<'a> CommentRepository<'a> {
    pub fn new(store: &'a dyn Store, clock: &'a dyn Clock) -> Self {
        Self {
            store,
            clock,
            rules: CommentRules::default(),
        }
    }

    #[must_use]
    pub const fn with_rules(mut self, rules: CommentRules) -> Self {
        self.rules = rules;
        self
    }

    fn load(&self) -> Result<Vec<Comment>> {
        Ok(store::load_collection(self.store, store::COMMENTS)?)
    }

    fn save(&self, comments: &[Comment]) -> Result<()> {
        Ok(store::save_collection(self.store, store::COMMENTS, comments)?)
    }

    /// Append a comment on `ticket_id` authored by `author`.
    ///
    /// The ticket is not looked up; see [`crate::Tracker::add_comment`] for
    /// the checked variant.
    ///
    /// # Errors
    ///
    /// - [`DocketError::Validation`] naming `text`.
    /// - [`DocketError::Storage`] on read/write failure.
    pub fn add(
        &self,
        ticket_id: TicketId,
        text: &str,
        author: Option<&CurrentUser>,
    ) -> Result<Comment> {
        self.rules.check_text(text)?;

        let mut comments = self.load()?;
        let author = Author::from(author);
        let created_at = self.clock.now();

        let mut comment = Comment {
            id: CommentId::generate(),
            ticket_id,
            text: text.to_string(),
            created_at,
            created_by: author.id,
            username: author.username,
            role: author.role,
            updated_at: None,
        };
        let key = comment.key();
        if comments.iter().any(|c| c.matches(&key)) {
            // Same author, same ticket, same instant: keep the composite key
            // unambiguous by nudging forward one millisecond at a time.
            while comments.iter().any(|c| c.matches(&comment.key())) {
                comment.created_at += chrono::Duration::milliseconds(1);
            }
            debug!(ticket = %ticket_id, "comment timestamp nudged to keep key unique");
        }

        comments.push(comment.clone());
        self.save(&comments)?;
        info!(ticket = %ticket_id, comment = %comment.id, "added comment");
        Ok(comment)
    }

    /// Replace the text of the comment at `key`.
    ///
    /// # Errors
    ///
    /// - [`DocketError::Validation`] naming `text`.
    /// - [`DocketError::NotFound`] if no comment matches `key`.
    /// - [`DocketError::Permission`] if `actor` is not the author.
    /// - [`DocketError::Storage`] on read/write failure.
    pub fn edit(
        &self,
        key: &CommentKey,
        text: &str,
        actor: Option<&CurrentUser>,
    ) -> Result<Comment> {
        self.edit_where(|c| c.matches(key), || Target::CommentKey(key.clone()), text, actor)
    }

    /// Like [`CommentRepository::edit`], addressing the comment by id.
    ///
    /// # Errors
    ///
    /// See [`CommentRepository::edit`].
    pub fn edit_by_id(
        &self,
        id: CommentId,
        text: &str,
        actor: Option<&CurrentUser>,
    ) -> Result<Comment> {
        self.edit_where(|c| c.id == id, || Target::Comment(id), text, actor)
    }

    fn edit_where(
        &self,
        pred: impl Fn(&Comment) -> bool,
        target: impl FnOnce() -> Target,
        text: &str,
        actor: Option<&CurrentUser>,
    ) -> Result<Comment> {
        self.rules.check_text(text)?;

        let mut comments = self.load()?;
        let Some(comment) = comments.iter_mut().find(|c| pred(c)) else {
            return Err(DocketError::NotFound(target()));
        };
        ensure_author("comment edit", actor, comment)?;

        let now = self.clock.now();
        comment.text = text.to_string();
        comment.updated_at = Some(now.max(comment.updated_at.unwrap_or(comment.created_at)));
        let edited = comment.clone();

        self.save(&comments)?;
        info!(ticket = %edited.ticket_id, comment = %edited.id, "edited comment");
        Ok(edited)
    }

    /// Remove every comment matching `key`.
    ///
    /// The collection is written back even when nothing matched. Every match
    /// must belong to `actor`, otherwise nothing is removed.
    ///
    /// Returns the number of comments removed.
    ///
    /// # Errors
    ///
    /// - [`DocketError::Permission`] if any match is not authored by `actor`.
    /// - [`DocketError::Storage`] on read/write failure.
    pub fn delete(&self, key: &CommentKey, actor: Option<&CurrentUser>) -> Result<usize> {
        let mut comments = self.load()?;
        for comment in comments.iter().filter(|c| c.matches(key)) {
            ensure_author("comment delete", actor, comment)?;
        }

        let before = comments.len();
        comments.retain(|c| !c.matches(key));
        let removed = before - comments.len();

        self.save(&comments)?;
        if removed == 0 {
            debug!(key = %key, "delete matched no comment");
        } else {
            info!(key = %key, removed, "deleted comment");
        }
        Ok(removed)
    }

    /// Remove the comment with `id`.
    ///
    /// # Errors
    ///
    /// - [`DocketError::NotFound`] if no comment has `id`.
    /// - [`DocketError::Permission`] if `actor` is not the author.
    /// - [`DocketError::Storage`] on read/write failure.
    pub fn delete_by_id(&self, id: CommentId, actor: Option<&CurrentUser>) -> Result<Comment> {
        let mut comments = self.load()?;
        let Some(pos) = comments.iter().position(|c| c.id == id) else {
            return Err(DocketError::NotFound(Target::Comment(id)));
        };
        ensure_author("comment delete", actor, &comments[pos])?;

        let removed = comments.remove(pos);
        self.save(&comments)?;
        info!(ticket = %removed.ticket_id, comment = %id, "deleted comment");
        Ok(removed)
    }

    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read failure.
    pub fn get(&self, id: CommentId) -> Result<Option<Comment>> {
        Ok(self.load()?.into_iter().find(|c| c.id == id))
    }

    /// Comments on `ticket_id`, in stored order (oldest first).
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read failure.
    pub fn list_by_ticket(&self, ticket_id: TicketId) -> Result<Vec<Comment>> {
        let mut comments = self.load()?;
        comments.retain(|c| c.ticket_id == ticket_id);
        Ok(comments)
    }

    /// Remove every comment on `ticket_id`, regardless of author.
    ///
    /// Writes only when something was removed. Returns the count.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read/write failure.
    pub fn purge_ticket(&self, ticket_id: TicketId) -> Result<usize> {
        let mut comments = self.load()?;
        let before = comments.len();
        comments.retain(|c| c.ticket_id != ticket_id);
        let removed = before - comments.len();

        if removed > 0 {
            self.save(&comments)?;
            info!(ticket = %ticket_id, removed, "purged comments");
        }
        Ok(removed)
    }

    /// Comments whose ticket is not in `known`.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Storage`] on read failure.
    pub fn orphans(&self, known: &HashSet<TicketId>) -> Result<Vec<Comment>> {
        let orphans: Vec<Comment> = self
            .load()?
            .into_iter()
            .filter(|c| !known.contains(&c.ticket_id))
            .collect();
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "found orphaned comments");
        }
        Ok(orphans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::model::user::UserId;
    use crate::store::MemoryStore;
    use chrono::Duration;

    const T0: i64 = 1_700_000_000_000;
    const TICKET: TicketId = TicketId::new(T0);

    fn alice() -> CurrentUser {
        CurrentUser::new(1, "alice").with_role("Admin")
    }

    fn bob() -> CurrentUser {
        CurrentUser::new(2, "bob")
    }

    #[test]
    fn add_stamps_author_and_time() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);

        let comment = repo.add(TICKET, "looks good", Some(&alice())).unwrap();
        assert_eq!(comment.created_by, Some(UserId::Number(1)));
        assert_eq!(comment.username.as_deref(), Some("alice"));
        assert_eq!(comment.role.as_deref(), Some("Admin"));
        assert_eq!(comment.created_at.timestamp_millis(), T0);
        assert_eq!(comment.updated_at, None);
        assert_eq!(repo.get(comment.id).unwrap(), Some(comment));
    }

    #[test]
    fn blank_text_is_rejected_without_writing() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);

        let err = repo.add(TICKET, "   ", Some(&alice())).unwrap_err();
        assert!(matches!(err, DocketError::Validation { field: "text", .. }));
        assert!(store.raw(store::COMMENTS).is_none());
    }

    #[test]
    fn colliding_keys_are_nudged_apart() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);

        let a = repo.add(TICKET, "first", Some(&alice())).unwrap();
        let b = repo.add(TICKET, "second", Some(&alice())).unwrap();
        let c = repo.add(TICKET, "other user", Some(&bob())).unwrap();

        assert_ne!(a.key(), b.key());
        assert_eq!(b.created_at.timestamp_millis(), T0 + 1);
        assert_eq!(c.created_at.timestamp_millis(), T0);
    }

    #[test]
    fn author_can_edit() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let comment = repo.add(TICKET, "typo", Some(&alice())).unwrap();

        clock.advance(Duration::seconds(30));
        let edited = repo.edit(&comment.key(), "fixed", Some(&alice())).unwrap();
        assert_eq!(edited.text, "fixed");
        assert_eq!(edited.id, comment.id);
        assert_eq!(edited.updated_at.map(|t| t.timestamp_millis()), Some(T0 + 30_000));
    }

    #[test]
    fn foreign_edit_is_rejected_and_not_persisted() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let comment = repo.add(TICKET, "mine", Some(&alice())).unwrap();

        let err = repo.edit_by_id(comment.id, "yours now", Some(&bob())).unwrap_err();
        assert!(matches!(err, DocketError::Permission { .. }));
        let err = repo.edit_by_id(comment.id, "anon", None).unwrap_err();
        assert!(matches!(err, DocketError::Permission { actor: None, .. }));

        assert_eq!(repo.get(comment.id).unwrap().unwrap().text, "mine");
    }

    #[test]
    fn edit_of_unknown_key_is_not_found() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let key = CommentKey {
            ticket_id: TICKET,
            created_at: clock.now(),
            created_by: Some(UserId::Number(1)),
        };

        let err = repo.edit(&key, "text", Some(&alice())).unwrap_err();
        assert!(matches!(err, DocketError::NotFound(Target::CommentKey(_))));
    }

    #[test]
    fn delete_by_key_persists_even_without_match() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let key = CommentKey {
            ticket_id: TICKET,
            created_at: clock.now(),
            created_by: None,
        };

        assert_eq!(repo.delete(&key, Some(&alice())).unwrap(), 0);
        assert_eq!(store.raw(store::COMMENTS).as_deref(), Some(&b"[]"[..]));
    }

    #[test]
    fn foreign_delete_is_rejected() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let comment = repo.add(TICKET, "mine", Some(&alice())).unwrap();

        assert!(repo.delete(&comment.key(), Some(&bob())).is_err());
        assert!(repo.delete_by_id(comment.id, Some(&bob())).is_err());
        assert_eq!(repo.list_by_ticket(TICKET).unwrap().len(), 1);

        repo.delete_by_id(comment.id, Some(&alice())).unwrap();
        assert!(repo.list_by_ticket(TICKET).unwrap().is_empty());
    }

    #[test]
    fn delete_by_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let err = CommentRepository::new(&store, &clock)
            .delete_by_id(CommentId::generate(), Some(&alice()))
            .unwrap_err();
        assert!(matches!(err, DocketError::NotFound(Target::Comment(_))));
    }

    #[test]
    fn list_by_ticket_filters_and_keeps_order() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let other = TicketId::new(T0 + 1);

        repo.add(TICKET, "one", Some(&alice())).unwrap();
        repo.add(other, "elsewhere", Some(&alice())).unwrap();
        clock.advance(Duration::seconds(1));
        repo.add(TICKET, "two", Some(&bob())).unwrap();

        let texts: Vec<_> = repo
            .list_by_ticket(TICKET)
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn purge_and_orphans() {
        let store = MemoryStore::new();
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);
        let gone = TicketId::new(7);

        repo.add(TICKET, "kept", Some(&alice())).unwrap();
        repo.add(gone, "orphan", Some(&bob())).unwrap();

        let known = HashSet::from([TICKET]);
        let orphans = repo.orphans(&known).unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].ticket_id, gone);

        assert_eq!(repo.purge_ticket(gone).unwrap(), 1);
        assert_eq!(repo.purge_ticket(gone).unwrap(), 0);
        assert!(repo.orphans(&known).unwrap().is_empty());
    }

    #[test]
    fn legacy_comment_can_be_deleted_by_derived_id() {
        let store = MemoryStore::new().with_raw(
            store::COMMENTS,
            r#"[{"text": "old", "createdAt": "2024-05-01T10:00:00Z", "createdBy": 1,
                 "username": "alice", "ticketId": 77}]"#,
        );
        let clock = ManualClock::at_millis(T0);
        let repo = CommentRepository::new(&store, &clock);

        let legacy = repo.list_by_ticket(TicketId::new(77)).unwrap().remove(0);
        repo.delete_by_id(legacy.id, Some(&alice())).unwrap();
        assert!(repo.list_by_ticket(TicketId::new(77)).unwrap().is_empty());
    }
}
