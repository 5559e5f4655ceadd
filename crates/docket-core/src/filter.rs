//! Filter/aggregate engine: pure functions over ticket collections.
//!
//! Filtering works on strict [`Ticket`] values. Aggregation works on anything
//! [`Labeled`], so the report can run over [`LooseTicket`] records read
//! straight from the store and tolerate values no strict read would accept.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::error::{DocketError, Result};
use crate::model::ticket::{Priority, Status, Ticket, TicketId};
use crate::store::{self, Store};

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Listing criteria. `None` means "All"; set criteria are ANDed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub priority: Option<Priority>,
    pub status: Option<Status>,
}

impl TicketFilter {
    /// Build a filter from free-text criteria, where absent or `"All"`
    /// (any case) matches everything.
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Validation`] naming `priority` or `status` for
    /// any other unrecognized value.
    pub fn parse(priority: Option<&str>, status: Option<&str>) -> Result<Self> {
        Ok(Self {
            priority: parse_criterion(priority)?,
            status: parse_criterion(status)?,
        })
    }

    #[must_use]
    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.priority.is_none_or(|p| ticket.priority == p)
            && self.status.is_none_or(|s| ticket.status == s)
    }
}

fn parse_criterion<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: FromStr,
    DocketError: From<T::Err>,
{
    match raw.map(str::trim) {
        None => Ok(None),
        Some(value) if value.eq_ignore_ascii_case("all") => Ok(None),
        Some(value) => Ok(Some(value.parse()?)),
    }
}

/// Tickets matching `filter`, in input order.
#[must_use]
pub fn filter_by<'t>(tickets: &'t [Ticket], filter: &TicketFilter) -> Vec<&'t Ticket> {
    tickets.iter().filter(|t| filter.matches(t)).collect()
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

/// Sort order for ticket listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Collection order, as stored.
    #[default]
    Stored,
    /// Oldest first.
    CreatedAsc,
    /// Newest first.
    CreatedDesc,
    /// Most recently touched first.
    UpdatedDesc,
}

impl SortOrder {
    /// Sort in place. Stable, so equal keys keep collection order.
    pub fn apply(self, tickets: &mut [Ticket]) {
        match self {
            Self::Stored => {}
            Self::CreatedAsc => tickets.sort_by_key(|t| t.created_at),
            Self::CreatedDesc => tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            Self::UpdatedDesc => tickets.sort_by(|a, b| b.last_touched().cmp(&a.last_touched())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored => f.write_str("stored"),
            Self::CreatedAsc => f.write_str("created"),
            Self::CreatedDesc => f.write_str("newest"),
            Self::UpdatedDesc => f.write_str("updated"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = DocketError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stored" | "none" => Ok(Self::Stored),
            "created" | "created_asc" | "oldest" => Ok(Self::CreatedAsc),
            "created_desc" | "newest" => Ok(Self::CreatedDesc),
            "updated" | "updated_desc" | "recent" => Ok(Self::UpdatedDesc),
            other => Err(DocketError::validation(
                "sort",
                format!("unknown sort order '{other}': expected stored, created, newest, updated"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregation inputs
// ---------------------------------------------------------------------------

/// A record that exposes priority and status as text, possibly malformed.
pub trait Labeled {
    fn priority_label(&self) -> Option<&str>;
    fn status_label(&self) -> Option<&str>;
}

impl Labeled for Ticket {
    fn priority_label(&self) -> Option<&str> {
        Some(self.priority.as_str())
    }

    fn status_label(&self) -> Option<&str> {
        Some(self.status.as_str())
    }
}

impl<T: Labeled> Labeled for &T {
    fn priority_label(&self) -> Option<&str> {
        (**self).priority_label()
    }

    fn status_label(&self) -> Option<&str> {
        (**self).status_label()
    }
}

/// Lenient view of a stored ticket: only the fields aggregation and orphan
/// detection read. Labels are free text; values of the wrong type read as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LooseTicket {
    #[serde(default, deserialize_with = "lenient_id")]
    pub ticket_id: Option<TicketId>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
}

impl Labeled for LooseTicket {
    fn priority_label(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    fn status_label(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Integer ids, or digits in a string, as older records sometimes hold.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<TicketId>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n.as_i64().map(TicketId::new),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    })
}

/// Read the `tickets` collection as loose records.
///
/// Entries that are not JSON objects are skipped with a warning. Only bytes
/// that are not a JSON array at all fail the read.
///
/// # Errors
///
/// Returns [`DocketError::Storage`] if the collection is unreadable or not
/// a JSON array.
pub fn load_loose(store: &dyn Store) -> Result<Vec<LooseTicket>> {
    let raw: Vec<serde_json::Value> = store::load_collection(store, store::TICKETS)?;
    let total = raw.len();
    let loose: Vec<LooseTicket> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();
    if loose.len() < total {
        warn!(skipped = total - loose.len(), "skipped non-object ticket records");
    }
    Ok(loose)
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityHistogram {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PriorityHistogram {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.low + self.medium + self.high
    }

    #[must_use]
    pub const fn count(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistogram {
    pub open: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl StatusHistogram {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.open + self.in_progress + self.resolved
    }

    #[must_use]
    pub const fn count(&self, status: Status) -> usize {
        match status {
            Status::Open => self.open,
            Status::InProgress => self.in_progress,
            Status::Resolved => self.resolved,
        }
    }
}

/// Count tickets per priority after normalization. Tickets whose priority
/// does not normalize are left out of every bucket.
pub fn priority_histogram<T: Labeled>(tickets: &[T]) -> PriorityHistogram {
    let mut hist = PriorityHistogram::default();
    let mut skipped = 0_usize;
    for ticket in tickets {
        match ticket.priority_label().and_then(Priority::normalize) {
            Some(Priority::High) => hist.high += 1,
            Some(Priority::Medium) => hist.medium += 1,
            Some(Priority::Low) => hist.low += 1,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "tickets with unrecognized priority left out of histogram");
    }
    hist
}

/// Count tickets per status after normalization, which also ignores
/// internal whitespace.
pub fn status_histogram<T: Labeled>(tickets: &[T]) -> StatusHistogram {
    let mut hist = StatusHistogram::default();
    let mut skipped = 0_usize;
    for ticket in tickets {
        match ticket.status_label().and_then(Status::normalize) {
            Some(Status::Open) => hist.open += 1,
            Some(Status::InProgress) => hist.in_progress += 1,
            Some(Status::Resolved) => hist.resolved += 1,
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "tickets with unrecognized status left out of histogram");
    }
    hist
}

/// Dashboard summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TicketReport {
    pub total: usize,
    pub priority: PriorityHistogram,
    pub status: StatusHistogram,
    pub users: usize,
}

impl TicketReport {
    pub fn from_tickets<T: Labeled>(tickets: &[T], users: usize) -> Self {
        Self {
            total: tickets.len(),
            priority: priority_histogram(tickets),
            status: status_histogram(tickets),
            users,
        }
    }
}

// ---------------------------------------------------------------------------
// Board columns
// ---------------------------------------------------------------------------

/// Split tickets into the High, Medium, Low columns, each in input order.
#[must_use]
pub fn group_by_priority(tickets: &[Ticket]) -> [(Priority, Vec<&Ticket>); 3] {
    Priority::ALL.map(|priority| {
        let column = tickets.iter().filter(|t| t.priority == priority).collect();
        (priority, column)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::DateTime;

    fn ticket(id: i64, priority: Priority, status: Status) -> Ticket {
        Ticket {
            ticket_id: TicketId::new(id),
            title: format!("Ticket {id}"),
            description: "Something to do here".into(),
            priority,
            status,
            owner_id: None,
            owner_username: None,
            created_at: DateTime::from_timestamp_millis(id).unwrap_or_default(),
            updated_at: None,
        }
    }

    fn sample() -> Vec<Ticket> {
        vec![
            ticket(1, Priority::High, Status::Open),
            ticket(2, Priority::Low, Status::Resolved),
            ticket(3, Priority::High, Status::InProgress),
            ticket(4, Priority::Medium, Status::Open),
        ]
    }

    #[test]
    fn all_matches_everything() {
        let tickets = sample();
        let filter = TicketFilter::parse(Some("All"), Some("all")).unwrap();
        assert_eq!(filter, TicketFilter::default());
        assert_eq!(filter_by(&tickets, &filter).len(), tickets.len());
    }

    #[test]
    fn criteria_are_anded() {
        let tickets = sample();
        let filter = TicketFilter::parse(Some("high"), Some("In Progress")).unwrap();
        let ids: Vec<_> = filter_by(&tickets, &filter)
            .iter()
            .map(|t| t.ticket_id.get())
            .collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn unknown_criterion_is_a_validation_error() {
        let err = TicketFilter::parse(Some("urgent"), None).unwrap_err();
        assert!(matches!(err, DocketError::Validation { field: "priority", .. }));
    }

    #[test]
    fn sort_orders() {
        let mut tickets = sample();
        tickets.reverse();
        SortOrder::CreatedAsc.apply(&mut tickets);
        assert_eq!(tickets[0].ticket_id.get(), 1);
        SortOrder::CreatedDesc.apply(&mut tickets);
        assert_eq!(tickets[0].ticket_id.get(), 4);
        assert_eq!("oldest".parse::<SortOrder>().unwrap(), SortOrder::CreatedAsc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn histograms_over_strict_tickets() {
        let report = TicketReport::from_tickets(&sample(), 2);
        assert_eq!(report.total, 4);
        assert_eq!(
            report.priority,
            PriorityHistogram {
                low: 1,
                medium: 1,
                high: 2
            }
        );
        assert_eq!(report.status.count(Status::Open), 2);
        assert_eq!(report.status.in_progress, 1);
        assert_eq!(report.users, 2);
    }

    #[test]
    fn malformed_labels_are_excluded_not_fatal() {
        let loose = vec![
            LooseTicket {
                priority: Some(" HIGH ".into()),
                status: Some("in progress".into()),
                ..LooseTicket::default()
            },
            LooseTicket {
                priority: Some("urgent".into()),
                status: Some("InProgress".into()),
                ..LooseTicket::default()
            },
            LooseTicket::default(),
        ];
        let priority = priority_histogram(&loose);
        let status = status_histogram(&loose);
        assert_eq!(priority.total(), 1);
        assert_eq!(priority.high, 1);
        assert_eq!(status.in_progress, 2);
        assert_eq!(status.total(), 2);
    }

    #[test]
    fn loose_read_survives_bad_records() {
        let store = MemoryStore::new().with_raw(
            store::TICKETS,
            r#"[{"priority": "low", "status": "Open"}, 42, {"priority": 3, "status": null}]"#,
        );
        let loose = load_loose(&store).unwrap();
        assert_eq!(loose.len(), 2);
        assert_eq!(loose[1], LooseTicket::default());
        assert_eq!(priority_histogram(&loose).low, 1);
    }

    #[test]
    fn loose_ids_accept_numbers_and_digit_strings() {
        let store = MemoryStore::new().with_raw(
            store::TICKETS,
            r#"[{"ticketId": 7, "priority": "high"}, {"ticketId": "8"}, {"ticketId": "x"}]"#,
        );
        let ids: Vec<_> = load_loose(&store)
            .unwrap()
            .into_iter()
            .map(|t| t.ticket_id)
            .collect();
        assert_eq!(ids, vec![Some(TicketId::new(7)), Some(TicketId::new(8)), None]);
    }

    #[test]
    fn report_serializes_camel_case_status() {
        let json = serde_json::to_value(TicketReport::from_tickets(&sample(), 0)).unwrap();
        assert_eq!(json["status"]["inProgress"], 1);
        assert_eq!(json["priority"]["high"], 2);
    }

    #[test]
    fn columns_follow_board_order() {
        let tickets = sample();
        let columns = group_by_priority(&tickets);
        assert_eq!(columns[0].0, Priority::High);
        assert_eq!(columns[0].1.len(), 2);
        assert_eq!(columns[1].1[0].ticket_id.get(), 4);
        assert_eq!(columns[2].1[0].ticket_id.get(), 2);
    }
}
