//! Record types: tickets, comments, and the identities stamped on them.

pub mod comment;
pub mod ticket;
pub mod timestamp;
pub mod user;

pub use comment::{Comment, CommentId, CommentKey, CommentRules};
pub use ticket::{Priority, Status, Ticket, TicketDraft, TicketId, TicketPatch, TicketRules};
pub use user::{Author, CurrentUser, UserId};
