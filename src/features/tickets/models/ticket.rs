use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::shared::serde_helpers::{
    flexible_bool, flexible_datetime, flexible_string, flexible_string_list,
};

/// Status given to every new ticket. Review may set any other string;
/// "approved" and "denied" are the usual outcomes.
pub const STATUS_PENDING: &str = "pending";

/// Whether the removal was a rescue ("yes") or a taking ("no")
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "rescue_disposition", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RescueOrProtect {
    Yes,
    No,
    #[default]
    Unknown,
}

/// Whether the submitter holds permits or legal paperwork
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "documentation_flag", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HasDocumentation {
    Yes,
    #[default]
    No,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AnimalDetails {
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub species: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub nickname: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub physical_description: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub approximate_age: Option<String>,
}

/// Where the animal lived before it was removed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OriginalLocation {
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_location: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub community: Option<String>,
    #[serde(
        deserialize_with = "flexible_datetime::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RemovalDetails {
    #[serde(
        deserialize_with = "flexible_datetime::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_relocation: Option<DateTime<Utc>>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub taken_by: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub organization_or_individual: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub affiliation: Option<String>,
    #[serde(deserialize_with = "flexible_string_list::deserialize")]
    pub witnesses: Vec<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub removal_description: Option<String>,
}

/// Facility currently holding the animal
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrentLocation {
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_facility: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_website: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_address: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_contact: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_phone: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_email: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub facility_social: Option<String>,
    pub rescue_or_protect: RescueOrProtect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Evidence {
    #[serde(deserialize_with = "flexible_string_list::deserialize")]
    pub photo_urls: Vec<String>,
    #[serde(deserialize_with = "flexible_string_list::deserialize")]
    pub video_urls: Vec<String>,
    #[serde(deserialize_with = "flexible_string_list::deserialize")]
    pub social_links: Vec<String>,
    #[serde(deserialize_with = "flexible_string_list::deserialize")]
    pub news_links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalStatement {
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub full_story: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub why_unjust: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Documentation {
    pub has_documentation: HasDocumentation,
    #[serde(deserialize_with = "flexible_string_list::deserialize")]
    pub documentation_urls: Vec<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub documentation_description: Option<String>,
}

/// Self-reported and unauthenticated
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitterInfo {
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitter_name: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitter_email: Option<String>,
    #[serde(deserialize_with = "flexible_bool::deserialize")]
    pub affirmed: bool,
}

/// Fields read by older clients
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(default)]
pub struct LegacyFields {
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub animal: Option<String>,
    #[serde(
        deserialize_with = "flexible_string::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
}

/// Everything a submitter may supply about an incident.
///
/// Sections are flattened both on the wire (camelCase keys at the top
/// level of the ticket object) and in the row mapping (one column each).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub animal: AnimalDetails,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub origin: OriginalLocation,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub removal: RemovalDetails,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub current_location: CurrentLocation,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub evidence: Evidence,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub statement: PersonalStatement,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub documentation: Documentation,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub submitter: SubmitterInfo,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub legacy: LegacyFields,
    #[serde(default, deserialize_with = "flexible_string_list::deserialize")]
    pub laws_violated: Vec<String>,
}

/// Direction of a counted vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    /// Only the exact strings "up" and "down" count
    pub fn parse(vote: Option<&str>) -> Option<Self> {
        match vote {
            Some("up") => Some(VoteDirection::Up),
            Some("down") => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

/// One entry in a ticket's voter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voter {
    pub user_id: String,
    /// Raw direction as sent by the client; may be absent or unrecognised
    pub vote: Option<String>,
}

impl Voter {
    pub fn direction(&self) -> Option<VoteDirection> {
        VoteDirection::parse(self.vote.as_deref())
    }

    /// (upvote delta, downvote delta) this vote applies to the counters
    pub fn counter_deltas(&self) -> (i64, i64) {
        match self.direction() {
            Some(VoteDirection::Up) => (1, 0),
            Some(VoteDirection::Down) => (0, 1),
            None => (0, 0),
        }
    }
}

/// Stored ticket
#[derive(Debug, Clone, FromRow)]
pub struct Ticket {
    pub id: Uuid,
    #[sqlx(flatten)]
    pub details: TicketDetails,
    pub status: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub created_at: DateTime<Utc>,
    /// Loaded from `ticket_voters`, oldest first
    #[sqlx(skip)]
    pub voters: Vec<Voter>,
}

impl Ticket {
    pub fn has_voted(&self, user_id: &str) -> bool {
        self.voters.iter().any(|v| v.user_id == user_id)
    }
}
