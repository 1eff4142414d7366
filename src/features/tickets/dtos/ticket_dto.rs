use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::tickets::models::{Ticket, TicketDetails, Voter};
use crate::shared::serde_helpers::flexible_string;

/// Request DTO for submitting a ticket
///
/// Any subset of the descriptive fields may be supplied; everything else
/// falls back to its default. Moderation fields (`status`, counters,
/// `voters`, `createdAt`) are owned by the service and ignored here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketDto {
    #[serde(flatten)]
    pub details: TicketDetails,
}

/// Request DTO for voting on a ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteTicketDto {
    /// "up" or "down"
    #[serde(default, deserialize_with = "flexible_string::deserialize")]
    #[schema(example = "up")]
    pub vote: Option<String>,

    /// Caller-chosen voter identity, one vote per ticket. Numbers are
    /// accepted and stored as text.
    #[serde(default, deserialize_with = "flexible_string::deserialize")]
    #[validate(
        required(message = "userId required"),
        length(min = 1, message = "userId required")
    )]
    pub user_id: Option<String>,
}

/// Request DTO for reviewing a ticket
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ReviewTicketDto {
    /// Usually "approved" or "denied"; any value is stored as-is
    #[serde(default, deserialize_with = "flexible_string::deserialize")]
    #[schema(example = "approved")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoterDto {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote: Option<String>,
}

/// Response DTO for ticket
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponseDto {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: TicketDetails,
    pub status: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub voters: Vec<VoterDto>,
    pub created_at: DateTime<Utc>,
}

impl From<Voter> for VoterDto {
    fn from(v: Voter) -> Self {
        Self {
            user_id: v.user_id,
            vote: v.vote,
        }
    }
}

impl From<Ticket> for TicketResponseDto {
    fn from(t: Ticket) -> Self {
        Self {
            id: t.id,
            details: t.details,
            status: t.status,
            upvotes: t.upvotes,
            downvotes: t.downvotes,
            voters: t.voters.into_iter().map(VoterDto::from).collect(),
            created_at: t.created_at,
        }
    }
}
