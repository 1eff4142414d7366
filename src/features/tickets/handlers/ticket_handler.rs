use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::core::error::Result;
use crate::core::extractor::AppJsonOrDefault;
use crate::features::tickets::dtos::{
    CreateTicketDto, ReviewTicketDto, TicketResponseDto, VoteTicketDto,
};
use crate::features::tickets::services::TicketService;
use crate::shared::types::ErrorBody;

/// Submit a ticket
///
/// Public endpoint; any subset of the ticket fields may be supplied.
/// A request without a JSON body creates a ticket of defaults.
#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketDto,
    responses(
        (status = 201, description = "Ticket created", body = TicketResponseDto),
        (status = 400, description = "Malformed body", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn submit_ticket(
    State(service): State<Arc<TicketService>>,
    AppJsonOrDefault(dto): AppJsonOrDefault<CreateTicketDto>,
) -> Result<(StatusCode, Json<TicketResponseDto>)> {
    let ticket = service.submit(dto).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// List tickets sorted by upvotes, newest first among ties
#[utoipa::path(
    get,
    path = "/api/tickets",
    responses(
        (status = 200, description = "All tickets", body = Vec<TicketResponseDto>),
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    State(service): State<Arc<TicketService>>,
) -> Result<Json<Vec<TicketResponseDto>>> {
    let tickets = service.list().await?;
    Ok(Json(tickets))
}

/// Get ticket by ID
#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(
        ("id" = String, Path, description = "Ticket ID")
    ),
    responses(
        (status = 200, description = "Ticket found", body = TicketResponseDto),
        (status = 404, description = "Ticket not found", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    State(service): State<Arc<TicketService>>,
    Path(id): Path<String>,
) -> Result<Json<TicketResponseDto>> {
    let ticket = service.get_by_id(&id).await?;
    Ok(Json(ticket))
}

/// Vote on a ticket
///
/// Each `userId` may vote once per ticket.
#[utoipa::path(
    post,
    path = "/api/tickets/{id}/vote",
    params(
        ("id" = String, Path, description = "Ticket ID")
    ),
    request_body = VoteTicketDto,
    responses(
        (status = 200, description = "Vote recorded", body = TicketResponseDto),
        (status = 400, description = "userId missing or user already voted", body = ErrorBody),
        (status = 404, description = "Ticket not found", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn vote_ticket(
    State(service): State<Arc<TicketService>>,
    Path(id): Path<String>,
    AppJsonOrDefault(dto): AppJsonOrDefault<VoteTicketDto>,
) -> Result<Json<TicketResponseDto>> {
    let ticket = service.vote(&id, dto).await?;
    Ok(Json(ticket))
}

/// Review a ticket (approve/deny)
///
/// Without a body or `status` the ticket is returned unchanged.
#[utoipa::path(
    patch,
    path = "/api/tickets/{id}/review",
    params(
        ("id" = String, Path, description = "Ticket ID")
    ),
    request_body = ReviewTicketDto,
    responses(
        (status = 200, description = "Status updated", body = TicketResponseDto),
        (status = 404, description = "Ticket not found", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn review_ticket(
    State(service): State<Arc<TicketService>>,
    Path(id): Path<String>,
    AppJsonOrDefault(dto): AppJsonOrDefault<ReviewTicketDto>,
) -> Result<Json<TicketResponseDto>> {
    let ticket = service.review(&id, dto).await?;
    Ok(Json(ticket))
}
