use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::tickets::models::{Ticket, TicketDetails, Voter, STATUS_PENDING};
use crate::features::tickets::store::{TicketStore, VoteOutcome};

/// Process-local ticket store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: RwLock<HashMap<Uuid, Ticket>>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert(&self, details: &TicketDetails) -> Result<Ticket> {
        let ticket = Ticket {
            id: Uuid::now_v7(),
            details: details.clone(),
            status: STATUS_PENDING.to_string(),
            upvotes: 0,
            downvotes: 0,
            created_at: Utc::now(),
            voters: Vec::new(),
        };

        self.tickets
            .write()
            .await
            .insert(ticket.id, ticket.clone());

        Ok(ticket)
    }

    async fn find_all_sorted(&self) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self.tickets.read().await.values().cloned().collect();

        // v7 ids are time-ordered, so they settle same-instant ties newest first
        tickets.sort_by(|a, b| {
            b.upvotes
                .cmp(&a.upvotes)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(tickets)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        Ok(self.tickets.read().await.get(&id).cloned())
    }

    async fn record_vote(&self, id: Uuid, voter: &Voter) -> Result<VoteOutcome> {
        // Check and write under one lock so duplicate votes cannot interleave
        let mut tickets = self.tickets.write().await;

        let Some(ticket) = tickets.get_mut(&id) else {
            return Ok(VoteOutcome::TicketNotFound);
        };

        if ticket.has_voted(&voter.user_id) {
            return Ok(VoteOutcome::AlreadyVoted);
        }

        let (up, down) = voter.counter_deltas();
        ticket.upvotes += up;
        ticket.downvotes += down;
        ticket.voters.push(voter.clone());

        Ok(VoteOutcome::Recorded(ticket.clone()))
    }

    async fn update_status(&self, id: Uuid, status: &str) -> Result<Option<Ticket>> {
        let mut tickets = self.tickets.write().await;

        Ok(tickets.get_mut(&id).map(|ticket| {
            ticket.status = status.to_string();
            ticket.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn details(species: &str) -> TicketDetails {
        let mut details = TicketDetails::default();
        details.animal.species = Some(species.to_string());
        details
    }

    fn voter(user_id: &str, vote: &str) -> Voter {
        Voter {
            user_id: user_id.to_string(),
            vote: Some(vote.to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_identity_and_defaults() {
        let store = InMemoryTicketStore::new();
        let a = store.insert(&details("elephant")).await.unwrap();
        let b = store.insert(&details("elephant")).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.status, STATUS_PENDING);
        assert_eq!((a.upvotes, a.downvotes), (0, 0));
        assert!(a.voters.is_empty());
        assert_eq!(store.find_by_id(a.id).await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_find_all_sorted_by_upvotes_then_newest() {
        let store = InMemoryTicketStore::new();
        let oldest = store.insert(&details("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let middle = store.insert(&details("b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newest = store.insert(&details("c")).await.unwrap();

        store.record_vote(oldest.id, &voter("u1", "up")).await.unwrap();

        let ids: Vec<Uuid> = store
            .find_all_sorted()
            .await
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();

        assert_eq!(ids, vec![oldest.id, newest.id, middle.id]);
    }

    #[tokio::test]
    async fn test_record_vote_outcomes() {
        let store = InMemoryTicketStore::new();
        let ticket = store.insert(&details("bear")).await.unwrap();

        match store.record_vote(ticket.id, &voter("u1", "down")).await.unwrap() {
            VoteOutcome::Recorded(t) => {
                assert_eq!((t.upvotes, t.downvotes), (0, 1));
                assert_eq!(t.voters, vec![voter("u1", "down")]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert!(matches!(
            store.record_vote(ticket.id, &voter("u1", "up")).await.unwrap(),
            VoteOutcome::AlreadyVoted
        ));
        assert!(matches!(
            store.record_vote(Uuid::now_v7(), &voter("u1", "up")).await.unwrap(),
            VoteOutcome::TicketNotFound
        ));

        let stored = store.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!((stored.upvotes, stored.downvotes), (0, 1));
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_votes_record_once() {
        let store = Arc::new(InMemoryTicketStore::new());
        let ticket_id = store.insert(&details("tiger")).await.unwrap().id;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.record_vote(ticket_id, &voter("same", "up")).await })
            })
            .collect();

        let mut recorded = 0;
        for handle in handles {
            if let VoteOutcome::Recorded(_) = handle.await.unwrap().unwrap() {
                recorded += 1;
            }
        }

        assert_eq!(recorded, 1);
        let stored = store.find_by_id(ticket_id).await.unwrap().unwrap();
        assert_eq!(stored.upvotes, 1);
        assert_eq!(stored.voters.len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_overwrites() {
        let store = InMemoryTicketStore::new();
        let ticket = store.insert(&details("wolf")).await.unwrap();

        let updated = store.update_status(ticket.id, "approved").await.unwrap().unwrap();
        assert_eq!(updated.status, "approved");

        let updated = store.update_status(ticket.id, "pending").await.unwrap().unwrap();
        assert_eq!(updated.status, "pending");

        assert!(store
            .update_status(Uuid::now_v7(), "approved")
            .await
            .unwrap()
            .is_none());
    }
}
