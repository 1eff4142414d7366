//! Persistence for tickets.
//!
//! The service talks to storage only through [`TicketStore`], which offers
//! the handful of document-store primitives it needs: insert, find all in
//! popularity order, find by id and the two targeted updates (vote, status).
//!
//! | Backend | Type | Use |
//! |---------|------|-----|
//! | PostgreSQL | [`PgTicketStore`] | production |
//! | In-process | [`InMemoryTicketStore`] | tests and local demos |

mod memory_store;
mod postgres_store;

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::tickets::models::{Ticket, TicketDetails, Voter};

pub use memory_store::InMemoryTicketStore;
pub use postgres_store::PgTicketStore;

/// Result of an attempt to record a vote
#[derive(Debug, Clone)]
pub enum VoteOutcome {
    /// Voter appended and counters updated
    Recorded(Ticket),
    TicketNotFound,
    /// The user already has an entry in the ticket's voter list
    AlreadyVoted,
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a new ticket; the store assigns `id` and `created_at`
    async fn insert(&self, details: &TicketDetails) -> Result<Ticket>;

    /// All tickets, most upvoted first, newest first among equals
    async fn find_all_sorted(&self) -> Result<Vec<Ticket>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>>;

    /// Append `voter` and bump the matching counter as one atomic step.
    ///
    /// The duplicate check happens inside the same operation, so two
    /// concurrent votes from one user can never both be recorded.
    async fn record_vote(&self, id: Uuid, voter: &Voter) -> Result<VoteOutcome>;

    /// Overwrite the status, returning the updated ticket if it exists
    async fn update_status(&self, id: Uuid, status: &str) -> Result<Option<Ticket>>;
}
