use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::tickets::handlers;
use crate::features::tickets::services::TicketService;

/// Create routes for the tickets feature
///
/// Note: every route is public; review is meant for administrators but is
/// not guarded here.
pub fn routes(service: Arc<TicketService>) -> Router {
    Router::new()
        .route(
            "/api/tickets",
            get(handlers::list_tickets).post(handlers::submit_ticket),
        )
        .route("/api/tickets/{id}", get(handlers::get_ticket))
        .route("/api/tickets/{id}/vote", post(handlers::vote_ticket))
        .route("/api/tickets/{id}/review", patch(handlers::review_ticket))
        .with_state(service)
}
