use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{DocketError, Result};
use crate::model::timestamp;
use crate::model::user::UserId;

/// Creation-derived ticket identifier (milliseconds since the Unix epoch).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TicketId(i64);

impl TicketId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self).map_err(|_| ParseEnumError {
            expected: "ticket id",
            got: s.to_string(),
        })
    }
}

/// Ticket urgency; also the Kanban column a ticket sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Board column order.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Case- and edge-whitespace-insensitive classification of free text.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

/// Ticket lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Open,
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    Resolved,
}

impl Status {
    pub const ALL: [Self; 3] = [Self::Open, Self::InProgress, Self::Resolved];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }

    /// Like [`Priority::normalize`], but also ignores internal whitespace so
    /// `"In Progress"`, `"inprogress"` and `" IN  progress "` all match.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        match folded.as_str() {
            "open" => Some(Self::Open),
            "inprogress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| ParseEnumError {
            expected: "priority",
            got: s.to_string(),
        })
    }
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::normalize(s).ok_or_else(|| ParseEnumError {
            expected: "status",
            got: s.to_string(),
        })
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl From<ParseEnumError> for DocketError {
    fn from(err: ParseEnumError) -> Self {
        let reason = format!("'{}' is not a known value", err.got);
        Self::validation(err.expected, reason)
    }
}

/// A persisted ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: TicketId,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "id")]
    pub owner_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "user")]
    pub owner_username: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "timestamp::deserialize_opt"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Most recent of `createdAt` and `updatedAt`.
    #[must_use]
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.map_or(self.created_at, |u| u.max(self.created_at))
    }
}

/// Length limits applied to ticket text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketRules {
    pub min_title_len: usize,
    pub min_description_len: usize,
}

impl Default for TicketRules {
    fn default() -> Self {
        Self {
            min_title_len: 3,
            min_description_len: 10,
        }
    }
}

impl TicketRules {
    /// # Errors
    ///
    /// Returns [`DocketError::Validation`] naming `title` when it is empty or
    /// shorter than the minimum.
    pub fn check_title(&self, title: &str) -> Result<()> {
        check_min_len("title", title, self.min_title_len)
    }

    /// # Errors
    ///
    /// Returns [`DocketError::Validation`] naming `description`.
    pub fn check_description(&self, description: &str) -> Result<()> {
        check_min_len("description", description, self.min_description_len)
    }
}

fn check_min_len(field: &'static str, value: &str, min: usize) -> Result<()> {
    let len = value.trim().chars().count();
    if len == 0 {
        return Err(DocketError::validation(field, "must not be empty"));
    }
    if len < min {
        return Err(DocketError::validation(
            field,
            format!("must be at least {min} characters (got {len})"),
        ));
    }
    Ok(())
}

/// Input for ticket creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
}

impl TicketDraft {
    /// A draft with the form defaults: `Medium` priority, `Open` status.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority: Priority::Medium,
            status: Status::Open,
        }
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Check fields in order title, description; the first failure wins.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Validation`] naming the violated field.
    pub fn validate(&self, rules: &TicketRules) -> Result<()> {
        rules.check_title(&self.title)?;
        rules.check_description(&self.description)
    }
}

/// Field-by-field update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl TicketPatch {
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub const fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }

    /// # Errors
    ///
    /// Returns [`DocketError::Validation`] for a patched title or description
    /// that would fail creation rules.
    pub fn validate(&self, rules: &TicketRules) -> Result<()> {
        if let Some(title) = &self.title {
            rules.check_title(title)?;
        }
        if let Some(description) = &self.description {
            rules.check_description(description)?;
        }
        Ok(())
    }

    /// Overwrite the patched fields of `ticket`. Identity and timestamps are
    /// left alone.
    pub fn apply_to(self, ticket: &mut Ticket) {
        if let Some(title) = self.title {
            ticket.title = title;
        }
        if let Some(description) = self.description {
            ticket.description = description;
        }
        if let Some(priority) = self.priority {
            ticket.priority = priority;
        }
        if let Some(status) = self.status {
            ticket.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Ticket {
        Ticket {
            ticket_id: TicketId::new(1_700_000_000_000),
            title: "Fix bug".into(),
            description: "Crash on startup screen".into(),
            priority: Priority::High,
            status: Status::Open,
            owner_id: Some(UserId::Number(1)),
            owner_username: Some("alice".into()),
            created_at: DateTime::from_timestamp_millis(1_700_000_000_000).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn ticket_serializes_with_camel_case_and_display_enums() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["ticketId"], 1_700_000_000_000_i64);
        assert_eq!(json["priority"], "High");
        assert_eq!(json["status"], "Open");
        assert_eq!(json["ownerId"], 1);
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn in_progress_accepts_both_spellings() {
        let a: Status = serde_json::from_str(r#""In Progress""#).unwrap();
        let b: Status = serde_json::from_str(r#""InProgress""#).unwrap();
        assert_eq!(a, Status::InProgress);
        assert_eq!(b, Status::InProgress);
        assert_eq!(serde_json::to_string(&a).unwrap(), r#""In Progress""#);
    }

    #[test]
    fn free_text_enum_values_are_rejected_on_read() {
        let err = serde_json::from_str::<Priority>(r#""urgent""#);
        assert!(err.is_err());
    }

    #[test]
    fn legacy_owner_field_names_are_read() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"ticketId": 5, "title": "Old one", "description": "Created by the old form",
                "priority": "Low", "status": "Resolved", "id": 9, "user": "bob",
                "createdAt": "2024-01-02T03:04:05Z"}"#,
        )
        .unwrap();
        assert_eq!(ticket.owner_id, Some(UserId::Number(9)));
        assert_eq!(ticket.owner_username.as_deref(), Some("bob"));
    }

    #[test]
    fn browser_form_record_is_read() {
        let ticket: Ticket = serde_json::from_str(
            r#"{"title": "Fix bug", "description": "Crash on startup screen",
                "priority": "Medium", "status": "Open", "id": 1, "user": "alice",
                "ticketId": 1760880000000, "createdAt": "10/19/2026, 3:04:05 PM",
                "updatedAt": "10/20/2026, 9:00:00 AM"}"#,
        )
        .unwrap();
        assert_eq!(ticket.owner_username.as_deref(), Some("alice"));
        assert_eq!(ticket.created_at.to_rfc3339(), "2026-10-19T15:04:05+00:00");
        assert!(ticket.updated_at > Some(ticket.created_at));

        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["createdAt"], "2026-10-19T15:04:05Z");
        assert_eq!(json["ownerUsername"], "alice");
    }

    #[test]
    fn unreadable_timestamp_fails_the_record() {
        let err = serde_json::from_str::<Ticket>(
            r#"{"ticketId": 5, "title": "Old one", "description": "Created by the old form",
                "priority": "Low", "status": "Resolved", "createdAt": "last tuesday"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unrecognized timestamp"));
    }

    #[test]
    fn normalization_is_case_and_whitespace_insensitive() {
        assert_eq!(Priority::normalize("  hIgH "), Some(Priority::High));
        assert_eq!(Priority::normalize("hi gh"), None);
        assert_eq!(Status::normalize("in progress"), Some(Status::InProgress));
        assert_eq!(Status::normalize(" IN\tPROGRESS "), Some(Status::InProgress));
        assert_eq!(Status::normalize("closed"), None);
    }

    #[test]
    fn draft_validation_reports_first_failing_field() {
        let rules = TicketRules::default();
        let err = TicketDraft::new("ab", "short").validate(&rules).unwrap_err();
        assert!(matches!(err, DocketError::Validation { field: "title", .. }));

        let err = TicketDraft::new("Fix bug", "short").validate(&rules).unwrap_err();
        assert!(matches!(err, DocketError::Validation { field: "description", .. }));

        let err = TicketDraft::new("   ", "long enough text").validate(&rules).unwrap_err();
        assert_eq!(err.to_string(), "invalid title: must not be empty");

        TicketDraft::new("Fix bug", "Crash on startup screen")
            .validate(&rules)
            .unwrap();
    }

    #[test]
    fn patch_applies_only_given_fields() {
        let mut ticket = sample();
        TicketPatch::default().status(Status::Resolved).apply_to(&mut ticket);
        assert_eq!(ticket.status, Status::Resolved);
        assert_eq!(ticket.title, "Fix bug");
        assert_eq!(ticket.priority, Priority::High);
    }

    #[test]
    fn parse_enum_error_converts_to_validation() {
        let err: DocketError = "urgent".parse::<Priority>().unwrap_err().into();
        assert!(matches!(err, DocketError::Validation { field: "priority", .. }));
    }
}
