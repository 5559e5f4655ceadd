//! Current-user context.
//!
//! The session record (`loggedInUser`) and the user directory (`users`) are
//! owned by an external auth collaborator. The core only reads them, then
//! passes the resolved identity explicitly into every mutating call.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{DocketError, Result};
use crate::model::comment::Comment;
use crate::model::user::{CurrentUser, UserId};
use crate::store::{self, Store};

/// Read-only accessor over the active session.
pub trait SessionSource {
    /// # Errors
    ///
    /// Returns a storage error if the session record cannot be read.
    fn resolve(&self) -> Result<Option<CurrentUser>>;
}

/// Session read from the store's `loggedInUser` record.
pub struct StoredSession<'a> {
    store: &'a dyn Store,
}

impl<'a> StoredSession<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }
}

impl SessionSource for StoredSession<'_> {
    fn resolve(&self) -> Result<Option<CurrentUser>> {
        let user = store::load_record::<CurrentUser>(self.store, store::SESSION)?;
        debug!(user = ?user.as_ref().map(|u| &u.username), "resolved session");
        Ok(user)
    }
}

/// A session pinned to a value, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct FixedSession(pub Option<CurrentUser>);

impl SessionSource for FixedSession {
    fn resolve(&self) -> Result<Option<CurrentUser>> {
        Ok(self.0.clone())
    }
}

/// Writes the session record. Belongs to the sign-in collaborator, not the
/// repositories.
pub struct SessionWriter<'a> {
    store: &'a dyn Store,
}

impl<'a> SessionWriter<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns a storage error if the session cannot be written.
    pub fn sign_in(&self, user: &CurrentUser) -> Result<()> {
        store::save_record(self.store, store::SESSION, user)?;
        info!(user = %user.username, id = %user.id, "signed in");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a storage error if the session cannot be removed.
    pub fn sign_out(&self) -> Result<()> {
        self.store.remove(store::SESSION)?;
        info!("signed out");
        Ok(())
    }
}

/// Entry of the `users` directory. Only the fields the core displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Read-only view of the `users` collection.
pub struct KnownUsers<'a> {
    store: &'a dyn Store,
}

impl<'a> KnownUsers<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns a storage error if the collection is unreadable.
    pub fn list(&self) -> Result<Vec<UserRecord>> {
        Ok(store::load_collection(self.store, store::USERS)?)
    }

    /// # Errors
    ///
    /// Returns a storage error if the collection is unreadable.
    pub fn find(&self, id: &UserId) -> Result<Option<UserRecord>> {
        Ok(self.list()?.into_iter().find(|u| &u.id == id))
    }
}

/// Gate for comment mutation: only the author may edit or delete.
///
/// An anonymous actor is never allowed, even on an anonymous comment.
///
/// # Errors
///
/// Returns [`DocketError::Permission`] when `actor` is absent or is not the
/// comment's `createdBy`.
pub fn ensure_author(
    action: &'static str,
    actor: Option<&CurrentUser>,
    comment: &Comment,
) -> Result<()> {
    match actor {
        Some(user) if comment.created_by.as_ref() == Some(&user.id) => Ok(()),
        _ => Err(DocketError::Permission {
            action,
            actor: actor.map(|u| u.id.clone()),
            owner: comment.created_by.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn absent_session_resolves_to_none() {
        let store = MemoryStore::new();
        assert_eq!(StoredSession::new(&store).resolve().unwrap(), None);
    }

    #[test]
    fn sign_in_and_out_round_trip() {
        let store = MemoryStore::new();
        let alice = CurrentUser::new(1, "alice").with_role("Admin");

        SessionWriter::new(&store).sign_in(&alice).unwrap();
        assert_eq!(StoredSession::new(&store).resolve().unwrap(), Some(alice));

        SessionWriter::new(&store).sign_out().unwrap();
        assert_eq!(StoredSession::new(&store).resolve().unwrap(), None);
    }

    #[test]
    fn corrupt_session_is_a_storage_error() {
        let store = MemoryStore::new().with_raw(store::SESSION, "{\"id\":");
        let err = StoredSession::new(&store).resolve().unwrap_err();
        assert!(matches!(err, DocketError::Storage(_)));
    }

    #[test]
    fn known_users_lookup() {
        let store = MemoryStore::new().with_raw(
            store::USERS,
            r#"[{"id": 1, "username": "alice", "password": "x"}, {"id": "b", "username": "bob"}]"#,
        );
        let users = KnownUsers::new(&store);
        assert_eq!(users.list().unwrap().len(), 2);
        assert_eq!(
            users.find(&UserId::from("b")).unwrap().map(|u| u.username),
            Some("bob".to_string())
        );
        assert_eq!(users.find(&UserId::Number(9)).unwrap(), None);
    }

    #[test]
    fn only_the_author_passes_the_gate() {
        let comment: Comment = serde_json::from_str(
            r#"{"ticketId": 1, "text": "hi", "createdAt": "2024-05-01T10:00:00Z", "createdBy": 1}"#,
        )
        .unwrap();
        let alice = CurrentUser::new(1, "alice");
        let bob = CurrentUser::new(2, "bob");

        ensure_author("comment edit", Some(&alice), &comment).unwrap();
        assert!(matches!(
            ensure_author("comment edit", Some(&bob), &comment),
            Err(DocketError::Permission { .. })
        ));
        assert!(ensure_author("comment edit", None, &comment).is_err());
    }
}
