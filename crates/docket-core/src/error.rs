use std::{fmt, io};

use crate::store::LockError;
use crate::model::comment::{CommentId, CommentKey};
use crate::model::ticket::TicketId;
use crate::model::user::UserId;

/// Machine-readable error codes for callers that render their own messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotInitialized,
    ConfigParseError,
    InvalidField,
    InvalidEnumValue,
    TicketNotFound,
    CommentNotFound,
    NotCommentOwner,
    MissingIdentity,
    CorruptCollection,
    StoreReadFailed,
    StoreWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotInitialized => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InvalidField => "E2001",
            Self::InvalidEnumValue => "E2002",
            Self::TicketNotFound => "E3001",
            Self::CommentNotFound => "E3002",
            Self::NotCommentOwner => "E4001",
            Self::MissingIdentity => "E4002",
            Self::CorruptCollection => "E5001",
            Self::StoreReadFailed => "E5002",
            Self::StoreWriteFailed => "E5003",
            Self::LockContention => "E5004",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotInitialized => "Project not initialized",
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidField => "Invalid field value",
            Self::InvalidEnumValue => "Invalid priority/status value",
            Self::TicketNotFound => "Ticket not found",
            Self::CommentNotFound => "Comment not found",
            Self::NotCommentOwner => "Comment belongs to another user",
            Self::MissingIdentity => "No signed-in user",
            Self::CorruptCollection => "Stored collection is not valid JSON",
            Self::StoreReadFailed => "Store read failed",
            Self::StoreWriteFailed => "Store write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotInitialized => Some("Run `dk init` to create a .docket directory."),
            Self::ConfigParseError => Some("Fix syntax in .docket/config.toml and retry."),
            Self::InvalidField => Some("Titles need 3+ characters, descriptions 10+."),
            Self::InvalidEnumValue => Some(
                "Use High/Medium/Low for priority and Open/In Progress/Resolved for status.",
            ),
            Self::TicketNotFound | Self::CommentNotFound => None,
            Self::NotCommentOwner => Some("Only the author of a comment may change it."),
            Self::MissingIdentity => Some("Run `dk login` first."),
            Self::CorruptCollection => {
                Some("Restore the collection file from a backup or remove the bad record.")
            }
            Self::StoreReadFailed => Some("Check that the .docket directory is readable."),
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::LockContention => Some("Retry after the other `dk` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The record an operation was aimed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Ticket(TicketId),
    Comment(CommentId),
    CommentKey(CommentKey),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ticket(id) => write!(f, "ticket {id}"),
            Self::Comment(id) => write!(f, "comment {id}"),
            Self::CommentKey(key) => write!(f, "comment {key}"),
        }
    }
}

/// Failures of the persisted store. Fatal for the operation that hit them:
/// nothing is partially persisted.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read collection '{collection}': {source}")]
    Read {
        collection: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write collection '{collection}': {source}")]
    Write {
        collection: String,
        #[source]
        source: io::Error,
    },

    #[error("collection '{collection}' is not valid JSON: {source}")]
    Corrupt {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize collection '{collection}': {source}")]
    Serialize {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StorageError {
    #[must_use]
    pub fn read(collection: &str, source: io::Error) -> Self {
        Self::Read {
            collection: collection.to_string(),
            source,
        }
    }

    #[must_use]
    pub fn write(collection: &str, source: io::Error) -> Self {
        Self::Write {
            collection: collection.to_string(),
            source,
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::StoreReadFailed,
            Self::Corrupt { .. } => ErrorCode::CorruptCollection,
            Self::Write { .. } | Self::Serialize { .. } => ErrorCode::StoreWriteFailed,
            Self::Lock(err) => err.code(),
        }
    }
}

/// Every failure a repository, engine, or the tracker can report.
#[derive(Debug, thiserror::Error)]
pub enum DocketError {
    /// Malformed input. Recoverable; meant for inline display.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0} not found")]
    NotFound(Target),

    #[error("{action} denied: {}", describe_denial(.actor.as_ref(), .owner.as_ref()))]
    Permission {
        action: &'static str,
        actor: Option<UserId>,
        owner: Option<UserId>,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn describe_denial(actor: Option<&UserId>, owner: Option<&UserId>) -> String {
    match (actor, owner) {
        (None, _) => "no signed-in user".to_string(),
        (Some(actor), Some(owner)) => format!("user {actor} is not the author ({owner})"),
        (Some(actor), None) => format!("user {actor} is not the author (anonymous)"),
    }
}

impl DocketError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation { field, .. } if matches!(*field, "priority" | "status") => {
                ErrorCode::InvalidEnumValue
            }
            Self::Validation { .. } => ErrorCode::InvalidField,
            Self::NotFound(Target::Ticket(_)) => ErrorCode::TicketNotFound,
            Self::NotFound(_) => ErrorCode::CommentNotFound,
            Self::Permission { actor: None, .. } => ErrorCode::MissingIdentity,
            Self::Permission { .. } => ErrorCode::NotCommentOwner,
            Self::Storage(err) => err.code(),
        }
    }

    /// Remediation hint matching [`DocketError::code`].
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

pub type Result<T, E = DocketError> = std::result::Result<T, E>;
