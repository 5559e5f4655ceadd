//! Repositories: the only code that reads or writes record collections.
//!
//! Each operation is a full read-modify-write against the [`Store`]. A failed
//! write discards the in-memory mutation; the store keeps its previous bytes.
//!
//! [`Store`]: crate::store::Store

mod comments;
mod tickets;

pub use comments::CommentRepository;
pub use tickets::TicketRepository;
