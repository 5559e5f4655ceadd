//! docket-core library.
//!
//! Tickets and comments live in named JSON collections behind a [`Store`].
//! Repositories own those collections; the filter and board modules are the
//! views built on top of them; [`Tracker`] ties it together with project
//! configuration.
//!
//! # Conventions
//!
//! - **Errors**: [`DocketError`] for everything the repositories and engines
//!   report; `anyhow::Result` only for configuration loading.
//! - **Logging**: `tracing` macros. `info!` for committed mutations, `debug!`
//!   for reads and no-ops, `warn!` for tolerated anomalies.
//! - **Identity**: the acting user is always an explicit argument, never
//!   looked up ambiently.

pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod identity;
pub mod model;
pub mod repo;
pub mod store;
pub mod tracker;

pub use board::{BoardSession, BoardUpdate, DropOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DocketError, ErrorCode, Result, StorageError, Target};
pub use filter::{SortOrder, TicketFilter, TicketReport};
pub use identity::{FixedSession, SessionSource, StoredSession};
pub use model::{
    Author, Comment, CommentId, CommentKey, CurrentUser, Priority, Status, Ticket, TicketDraft,
    TicketId, TicketPatch, UserId,
};
pub use repo::{CommentRepository, TicketRepository};
pub use store::{FileStore, MemoryStore, Store};
pub use tracker::{TicketDeletion, TicketThread, Tracker};
