use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::{DocketError, Result};
use crate::model::ticket::{ParseEnumError, TicketId};
use crate::model::timestamp;
use crate::model::user::UserId;

/// Dedicated comment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Stable id for a stored comment written before ids existed, derived
    /// from its composite key.
    #[must_use]
    pub fn legacy(key: &CommentKey) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, key.to_string().as_bytes()))
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CommentId {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self).map_err(|_| ParseEnumError {
            expected: "comment id",
            got: s.to_string(),
        })
    }
}

/// Composite natural key `(ticketId, createdAt, createdBy)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentKey {
    pub ticket_id: TicketId,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
}

impl fmt::Display for CommentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/",
            self.ticket_id,
            self.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )?;
        match &self.created_by {
            Some(by) => write!(f, "{by}"),
            None => f.write_str("anonymous"),
        }
    }
}

/// A persisted comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredComment")]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Comment {
    #[must_use]
    pub fn key(&self) -> CommentKey {
        CommentKey {
            ticket_id: self.ticket_id,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
        }
    }

    #[must_use]
    pub fn matches(&self, key: &CommentKey) -> bool {
        self.ticket_id == key.ticket_id
            && self.created_at == key.created_at
            && self.created_by == key.created_by
    }
}

/// On-disk shape; `id` may be missing on comments written before ids existed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredComment {
    #[serde(default)]
    id: Option<CommentId>,
    ticket_id: TicketId,
    text: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    created_at: DateTime<Utc>,
    #[serde(default)]
    created_by: Option<UserId>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default, deserialize_with = "timestamp::deserialize_opt")]
    updated_at: Option<DateTime<Utc>>,
}

impl From<StoredComment> for Comment {
    fn from(stored: StoredComment) -> Self {
        let mut comment = Self {
            id: CommentId(Uuid::nil()),
            ticket_id: stored.ticket_id,
            text: stored.text,
            created_at: stored.created_at,
            created_by: stored.created_by,
            username: stored.username,
            role: stored.role,
            updated_at: stored.updated_at,
        };
        comment.id = stored
            .id
            .unwrap_or_else(|| CommentId::legacy(&comment.key()));
        comment
    }
}

/// Limits applied to comment text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRules {
    pub max_len: usize,
}

impl Default for CommentRules {
    fn default() -> Self {
        Self { max_len: 8_192 }
    }
}

impl CommentRules {
    /// Text is stored verbatim; this only rejects what cannot be a comment.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Validation`] naming `text` when it is blank, too
    /// long, or contains control characters other than newline and tab.
    pub fn check_text(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(DocketError::validation("text", "must not be empty"));
        }

        let len = text.chars().count();
        if len > self.max_len {
            return Err(DocketError::validation(
                "text",
                format!("must be at most {} characters (got {len})", self.max_len),
            ));
        }

        if text
            .chars()
            .any(|ch| ch.is_control() && ch != '\n' && ch != '\t')
        {
            return Err(DocketError::validation(
                "text",
                "must not contain control characters",
            ));
        }

        Ok(())
    }
}
