use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::tickets::models::{Ticket, TicketDetails, Voter, STATUS_PENDING};
use crate::features::tickets::store::{TicketStore, VoteOutcome};

const TICKET_COLUMNS: &str = r#"
    id,
    species, nickname, physical_description, approximate_age,
    original_location, community, date_last_seen,
    date_of_relocation, taken_by, organization_or_individual, affiliation,
    witnesses, removal_description,
    current_facility, facility_website, facility_address, facility_contact,
    facility_phone, facility_email, facility_social, rescue_or_protect,
    photo_urls, video_urls, social_links, news_links,
    full_story, why_unjust,
    has_documentation, documentation_urls, documentation_description,
    submitter_name, submitter_email, affirmed,
    animal, description,
    laws_violated, status, upvotes, downvotes, created_at
"#;

#[derive(Debug, FromRow)]
struct VoterRow {
    ticket_id: Uuid,
    user_id: String,
    vote: Option<String>,
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        tracing::error!("Failed to {}: {:?}", context, e);
        AppError::Database(e)
    }
}

/// Ticket store backed by PostgreSQL.
///
/// Tickets live in `tickets`; voter records live in `ticket_voters`, whose
/// unique `(ticket_id, user_id)` constraint enforces one vote per user.
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Fill `voters` for each ticket, preserving insertion order
async fn attach_voters<'e, E>(executor: E, tickets: &mut [Ticket]) -> Result<()>
where
    E: Executor<'e, Database = Postgres>,
{
    if tickets.is_empty() {
        return Ok(());
    }

    let ids: Vec<Uuid> = tickets.iter().map(|t| t.id).collect();
    let rows = sqlx::query_as::<_, VoterRow>(
        r#"
        SELECT ticket_id, user_id, vote
        FROM ticket_voters
        WHERE ticket_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(executor)
    .await
    .map_err(db_error("load ticket voters"))?;

    let mut by_ticket: HashMap<Uuid, Vec<Voter>> = HashMap::new();
    for row in rows {
        by_ticket.entry(row.ticket_id).or_default().push(Voter {
            user_id: row.user_id,
            vote: row.vote,
        });
    }

    for ticket in tickets.iter_mut() {
        ticket.voters = by_ticket.remove(&ticket.id).unwrap_or_default();
    }

    Ok(())
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn insert(&self, details: &TicketDetails) -> Result<Ticket> {
        let sql = format!(
            r#"
            INSERT INTO tickets (
                species, nickname, physical_description, approximate_age,
                original_location, community, date_last_seen,
                date_of_relocation, taken_by, organization_or_individual, affiliation,
                witnesses, removal_description,
                current_facility, facility_website, facility_address, facility_contact,
                facility_phone, facility_email, facility_social, rescue_or_protect,
                photo_urls, video_urls, social_links, news_links,
                full_story, why_unjust,
                has_documentation, documentation_urls, documentation_description,
                submitter_name, submitter_email, affirmed,
                animal, description,
                laws_violated, status
            ) VALUES (
                $1, $2, $3, $4,
                $5, $6, $7,
                $8, $9, $10, $11,
                $12, $13,
                $14, $15, $16, $17,
                $18, $19, $20, $21,
                $22, $23, $24, $25,
                $26, $27,
                $28, $29, $30,
                $31, $32, $33,
                $34, $35,
                $36, $37
            )
            RETURNING {TICKET_COLUMNS}
            "#
        );

        let ticket = sqlx::query_as::<_, Ticket>(&sql)
            // Animal details
            .bind(&details.animal.species)
            .bind(&details.animal.nickname)
            .bind(&details.animal.physical_description)
            .bind(&details.animal.approximate_age)
            // Original location
            .bind(&details.origin.original_location)
            .bind(&details.origin.community)
            .bind(details.origin.date_last_seen)
            // Removal details
            .bind(details.removal.date_of_relocation)
            .bind(&details.removal.taken_by)
            .bind(&details.removal.organization_or_individual)
            .bind(&details.removal.affiliation)
            .bind(&details.removal.witnesses)
            .bind(&details.removal.removal_description)
            // Current location
            .bind(&details.current_location.current_facility)
            .bind(&details.current_location.facility_website)
            .bind(&details.current_location.facility_address)
            .bind(&details.current_location.facility_contact)
            .bind(&details.current_location.facility_phone)
            .bind(&details.current_location.facility_email)
            .bind(&details.current_location.facility_social)
            .bind(details.current_location.rescue_or_protect)
            // Evidence
            .bind(&details.evidence.photo_urls)
            .bind(&details.evidence.video_urls)
            .bind(&details.evidence.social_links)
            .bind(&details.evidence.news_links)
            // Personal statement
            .bind(&details.statement.full_story)
            .bind(&details.statement.why_unjust)
            // Documentation
            .bind(details.documentation.has_documentation)
            .bind(&details.documentation.documentation_urls)
            .bind(&details.documentation.documentation_description)
            // Submitter
            .bind(&details.submitter.submitter_name)
            .bind(&details.submitter.submitter_email)
            .bind(details.submitter.affirmed)
            // Legacy
            .bind(&details.legacy.animal)
            .bind(&details.legacy.description)
            // Moderation
            .bind(&details.laws_violated)
            .bind(STATUS_PENDING)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("insert ticket"))?;

        Ok(ticket)
    }

    async fn find_all_sorted(&self) -> Result<Vec<Ticket>> {
        let sql = format!(
            r#"
            SELECT {TICKET_COLUMNS}
            FROM tickets
            ORDER BY upvotes DESC, created_at DESC
            "#
        );

        let mut tickets = sqlx::query_as::<_, Ticket>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list tickets"))?;

        attach_voters(&self.pool, &mut tickets).await?;
        Ok(tickets)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>> {
        let sql = format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = $1");

        let ticket = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("get ticket by ID"))?;

        match ticket {
            Some(mut ticket) => {
                attach_voters(&self.pool, std::slice::from_mut(&mut ticket)).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }

    async fn record_vote(&self, id: Uuid, voter: &Voter) -> Result<VoteOutcome> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("begin vote transaction"))?;

        // Row lock serialises votes on the same ticket until commit
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM tickets WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("lock ticket for vote"))?;

        if exists.is_none() {
            return Ok(VoteOutcome::TicketNotFound);
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO ticket_voters (ticket_id, user_id, vote)
            VALUES ($1, $2, $3)
            ON CONFLICT (ticket_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&voter.user_id)
        .bind(&voter.vote)
        .execute(&mut *tx)
        .await
        .map_err(db_error("record voter"))?;

        if inserted.rows_affected() == 0 {
            return Ok(VoteOutcome::AlreadyVoted);
        }

        let (up, down) = voter.counter_deltas();
        let sql = format!(
            r#"
            UPDATE tickets
            SET upvotes = upvotes + $2, downvotes = downvotes + $3
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "#
        );

        let mut ticket = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .bind(up)
            .bind(down)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("update vote counters"))?;

        attach_voters(&mut *tx, std::slice::from_mut(&mut ticket)).await?;

        tx.commit()
            .await
            .map_err(db_error("commit vote transaction"))?;

        Ok(VoteOutcome::Recorded(ticket))
    }

    async fn update_status(&self, id: Uuid, status: &str) -> Result<Option<Ticket>> {
        let sql = format!(
            r#"
            UPDATE tickets
            SET status = $2
            WHERE id = $1
            RETURNING {TICKET_COLUMNS}
            "#
        );

        let ticket = sqlx::query_as::<_, Ticket>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("update ticket status"))?;

        match ticket {
            Some(mut ticket) => {
                attach_voters(&self.pool, std::slice::from_mut(&mut ticket)).await?;
                Ok(Some(ticket))
            }
            None => Ok(None),
        }
    }
}

/// These run against the database named by `DATABASE_URL` and are skipped
/// when it is unset. Each test works only on tickets it inserts itself.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DatabaseConfig;
    use crate::core::database;
    use std::sync::Arc;
    use std::time::Duration;

    async fn store() -> Option<PgTicketStore> {
        let Ok(config) = DatabaseConfig::from_env() else {
            eprintln!("DATABASE_URL not set; skipping postgres store test");
            return None;
        };

        let pool = database::create_pool(&config)
            .await
            .expect("failed to connect to DATABASE_URL");
        database::run_migrations(&pool)
            .await
            .expect("failed to run migrations");

        Some(PgTicketStore::new(pool))
    }

    fn details(species: &str) -> TicketDetails {
        let mut details = TicketDetails::default();
        details.animal.species = Some(species.to_string());
        details.removal.witnesses = vec!["Ann".to_string(), "Bo".to_string()];
        details
    }

    fn voter(user_id: &str, vote: &str) -> Voter {
        Voter {
            user_id: user_id.to_string(),
            vote: Some(vote.to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_round_trip() {
        let Some(store) = store().await else { return };

        let ticket = store.insert(&details("pangolin")).await.unwrap();
        assert_eq!(ticket.status, STATUS_PENDING);
        assert_eq!((ticket.upvotes, ticket.downvotes), (0, 0));

        let found = store.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!(found.details, ticket.details);
        assert!(found.voters.is_empty());

        assert!(store.find_by_id(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_vote_outcomes() {
        let Some(store) = store().await else { return };
        let ticket = store.insert(&details("bear")).await.unwrap();

        match store.record_vote(ticket.id, &voter("u1", "up")).await.unwrap() {
            VoteOutcome::Recorded(t) => {
                assert_eq!((t.upvotes, t.downvotes), (1, 0));
                assert_eq!(t.voters, vec![voter("u1", "up")]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        store.record_vote(ticket.id, &voter("u2", "down")).await.unwrap();
        store.record_vote(ticket.id, &voter("u3", "sideways")).await.unwrap();

        assert!(matches!(
            store.record_vote(ticket.id, &voter("u1", "down")).await.unwrap(),
            VoteOutcome::AlreadyVoted
        ));
        assert!(matches!(
            store.record_vote(Uuid::now_v7(), &voter("u1", "up")).await.unwrap(),
            VoteOutcome::TicketNotFound
        ));

        let stored = store.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!((stored.upvotes, stored.downvotes), (1, 1));
        let users: Vec<&str> = stored.voters.iter().map(|v| v.user_id.as_str()).collect();
        assert_eq!(users, vec!["u1", "u2", "u3"]);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_votes_record_once() {
        let Some(store) = store().await else { return };
        let store = Arc::new(store);
        let ticket_id = store.insert(&details("tiger")).await.unwrap().id;

        let handles: Vec<_> = (0..8)
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
    async fn test_find_all_sorted_orders_by_popularity() {
        let Some(store) = store().await else { return };

        let oldest = store.insert(&details("a")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let middle = store.insert(&details("b")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let newest = store.insert(&details("c")).await.unwrap();

        store.record_vote(oldest.id, &voter("u1", "up")).await.unwrap();

        let ours = [oldest.id, middle.id, newest.id];
        let listed: Vec<Ticket> = store
            .find_all_sorted()
            .await
            .unwrap()
            .into_iter()
            .filter(|t| ours.contains(&t.id))
            .collect();

        let ids: Vec<Uuid> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![oldest.id, newest.id, middle.id]);
        assert_eq!(listed[0].voters, vec![voter("u1", "up")]);
    }

    #[tokio::test]
    async fn test_update_status_overwrites() {
        let Some(store) = store().await else { return };
        let ticket = store.insert(&details("wolf")).await.unwrap();

        let updated = store.update_status(ticket.id, "approved").await.unwrap().unwrap();
        assert_eq!(updated.status, "approved");

        let updated = store.update_status(ticket.id, "denied").await.unwrap().unwrap();
        assert_eq!(updated.status, "denied");

        assert!(store
            .update_status(Uuid::now_v7(), "approved")
            .await
            .unwrap()
            .is_none());
    }
}
