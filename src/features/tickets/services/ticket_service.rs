use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::tickets::dtos::{
    CreateTicketDto, ReviewTicketDto, TicketResponseDto, VoteTicketDto,
};
use crate::features::tickets::models::Voter;
use crate::features::tickets::store::{TicketStore, VoteOutcome};

/// Service for ticket operations
pub struct TicketService {
    store: Arc<dyn TicketStore>,
}

/// A malformed id cannot match any ticket
fn parse_ticket_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| ticket_not_found(id))
}

fn ticket_not_found(id: impl std::fmt::Display) -> AppError {
    AppError::NotFound(format!("Ticket '{}' not found", id))
}

impl TicketService {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self { store }
    }

    /// Submit a new ticket
    pub async fn submit(&self, dto: CreateTicketDto) -> Result<TicketResponseDto> {
        let ticket = self.store.insert(&dto.details).await?;

        tracing::info!(
            "Ticket created: id={}, species={:?}, submitter={:?}",
            ticket.id,
            ticket.details.animal.species,
            ticket.details.submitter.submitter_name
        );

        Ok(ticket.into())
    }

    /// List every ticket, most upvoted first
    pub async fn list(&self) -> Result<Vec<TicketResponseDto>> {
        let tickets = self.store.find_all_sorted().await?;
        Ok(tickets.into_iter().map(|t| t.into()).collect())
    }

    /// Get ticket by ID
    pub async fn get_by_id(&self, id: &str) -> Result<TicketResponseDto> {
        let ticket_id = parse_ticket_id(id)?;

        self.store
            .find_by_id(ticket_id)
            .await?
            .map(|t| t.into())
            .ok_or_else(|| ticket_not_found(id))
    }

    /// Record one vote per user per ticket.
    ///
    /// A direction other than "up"/"down" still uses up the caller's vote
    /// without touching either counter.
    pub async fn vote(&self, id: &str, dto: VoteTicketDto) -> Result<TicketResponseDto> {
        // userId is checked before the ticket is looked up
        dto.validate()
            .map_err(|_| AppError::Validation("userId required".to_string()))?;

        let voter = Voter {
            user_id: dto.user_id.unwrap_or_default(),
            vote: dto.vote,
        };
        let ticket_id = parse_ticket_id(id)?;

        if voter.direction().is_none() {
            tracing::warn!(
                "Vote without a counted direction: ticket={}, user={}, vote={:?}",
                ticket_id,
                voter.user_id,
                voter.vote
            );
        }

        match self.store.record_vote(ticket_id, &voter).await? {
            VoteOutcome::Recorded(ticket) => {
                tracing::info!(
                    "Vote recorded: ticket={}, user={}, vote={:?}, upvotes={}, downvotes={}",
                    ticket.id,
                    voter.user_id,
                    voter.vote,
                    ticket.upvotes,
                    ticket.downvotes
                );
                Ok(ticket.into())
            }
            VoteOutcome::TicketNotFound => Err(ticket_not_found(id)),
            VoteOutcome::AlreadyVoted => Err(AppError::Conflict("User already voted".to_string())),
        }
    }

    /// Overwrite a ticket's status; no transition rules apply
    pub async fn review(&self, id: &str, dto: ReviewTicketDto) -> Result<TicketResponseDto> {
        let ticket_id = parse_ticket_id(id)?;

        let ticket = match dto.status {
            Some(status) => {
                let ticket = self
                    .store
                    .update_status(ticket_id, &status)
                    .await?
                    .ok_or_else(|| ticket_not_found(id))?;
                tracing::info!("Ticket reviewed: id={}, status={}", ticket.id, status);
                ticket
            }
            // Nothing to write; behave like an update that changed no fields
            None => self
                .store
                .find_by_id(ticket_id)
                .await?
                .ok_or_else(|| ticket_not_found(id))?,
        };

        Ok(ticket.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tickets::models::{
        AnimalDetails, SubmitterInfo, TicketDetails, STATUS_PENDING,
    };
    use crate::features::tickets::store::InMemoryTicketStore;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    fn service() -> TicketService {
        TicketService::new(Arc::new(InMemoryTicketStore::new()))
    }

    fn create_dto(species: &str) -> CreateTicketDto {
        CreateTicketDto {
            details: TicketDetails {
                animal: AnimalDetails {
                    species: Some(species.to_string()),
                    ..Default::default()
                },
                submitter: SubmitterInfo {
                    submitter_name: Some(Name().fake()),
                    submitter_email: Some(SafeEmail().fake()),
                    affirmed: true,
                },
                ..Default::default()
            },
        }
    }

    fn vote_dto(user_id: Option<&str>, vote: &str) -> VoteTicketDto {
        VoteTicketDto {
            vote: Some(vote.to_string()),
            user_id: user_id.map(str::to_string),
        }
    }

    fn review_dto(status: &str) -> ReviewTicketDto {
        ReviewTicketDto {
            status: Some(status.to_string()),
        }
    }

    #[tokio::test]
    async fn test_submit_merges_payload_over_defaults() {
        let service = service();
        let dto = create_dto("elephant");

        let ticket = service.submit(dto.clone()).await.unwrap();

        assert_eq!(ticket.details, dto.details);
        assert_eq!(ticket.status, STATUS_PENDING);
        assert_eq!((ticket.upvotes, ticket.downvotes), (0, 0));
        assert!(ticket.voters.is_empty());
    }

    #[tokio::test]
    async fn test_submit_issues_unique_ids() {
        let service = service();
        let a = service.submit(create_dto("a")).await.unwrap();
        let b = service.submit(create_dto("a")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_popularity() {
        let service = service();
        let quiet = service.submit(create_dto("quiet")).await.unwrap();
        let popular = service.submit(create_dto("popular")).await.unwrap();
        let id = popular.id.to_string();

        for user in ["u1", "u2"] {
            service.vote(&id, vote_dto(Some(user), "up")).await.unwrap();
        }
        service
            .vote(&quiet.id.to_string(), vote_dto(Some("u1"), "up"))
            .await
            .unwrap();

        let tickets = service.list().await.unwrap();
        assert_eq!(tickets[0].id, popular.id);
        assert!(tickets
            .windows(2)
            .all(|w| w[0].upvotes > w[1].upvotes
                || (w[0].upvotes == w[1].upvotes && w[0].created_at >= w[1].created_at)));
    }

    #[tokio::test]
    async fn test_second_vote_from_same_user_conflicts() {
        let service = service();
        let ticket = service.submit(create_dto("lion")).await.unwrap();
        let id = ticket.id.to_string();

        let voted = service.vote(&id, vote_dto(Some("u1"), "up")).await.unwrap();
        assert_eq!(voted.upvotes, 1);

        let err = service
            .vote(&id, vote_dto(Some("u1"), "up"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let after = service.get_by_id(&id).await.unwrap();
        assert_eq!(after.upvotes, 1);
    }

    #[tokio::test]
    async fn test_votes_from_different_users_accumulate() {
        let service = service();
        let ticket = service.submit(create_dto("lion")).await.unwrap();
        let id = ticket.id.to_string();

        service.vote(&id, vote_dto(Some("u1"), "up")).await.unwrap();
        let after = service.vote(&id, vote_dto(Some("u2"), "up")).await.unwrap();

        assert_eq!(after.upvotes, 2);
        let users: Vec<&str> = after.voters.iter().map(|v| v.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2"]);
    }

    #[tokio::test]
    async fn test_unknown_direction_consumes_vote() {
        let service = service();
        let ticket = service.submit(create_dto("owl")).await.unwrap();
        let id = ticket.id.to_string();

        let after = service
            .vote(&id, vote_dto(Some("u1"), "sideways"))
            .await
            .unwrap();
        assert_eq!((after.upvotes, after.downvotes), (0, 0));
        assert_eq!(after.voters.len(), 1);

        let err = service
            .vote(&id, vote_dto(Some("u1"), "up"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_vote_errors() {
        let service = service();

        let err = service
            .vote(&Uuid::now_v7().to_string(), vote_dto(Some("u1"), "up"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .vote("not-a-ticket-id", vote_dto(Some("u1"), "up"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        // Missing userId wins over an unknown id
        let err = service
            .vote("not-a-ticket-id", vote_dto(None, "up"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service
            .vote("not-a-ticket-id", vote_dto(Some(""), "up"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_review_is_last_write_wins() {
        let service = service();
        let ticket = service.submit(create_dto("fox")).await.unwrap();
        let id = ticket.id.to_string();

        let approved = service.review(&id, review_dto("approved")).await.unwrap();
        assert_eq!(approved.status, "approved");

        let denied = service.review(&id, review_dto("denied")).await.unwrap();
        assert_eq!(denied.status, "denied");

        let reopened = service.review(&id, review_dto(STATUS_PENDING)).await.unwrap();
        assert_eq!(reopened.status, STATUS_PENDING);
    }

    #[tokio::test]
    async fn test_review_without_status_leaves_ticket_unchanged() {
        let service = service();
        let ticket = service.submit(create_dto("fox")).await.unwrap();
        let id = ticket.id.to_string();

        let same = service
            .review(&id, ReviewTicketDto { status: None })
            .await
            .unwrap();
        assert_eq!(same.status, STATUS_PENDING);
    }

    #[tokio::test]
    async fn test_review_unknown_ticket() {
        let service = service();
        let err = service
            .review(&Uuid::now_v7().to_string(), review_dto("approved"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
