//! Animal-welfare tickets: submission, public voting and moderation.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/tickets` | Submit a ticket |
//! | GET | `/api/tickets` | List tickets, most upvoted first |
//! | GET | `/api/tickets/{id}` | Get one ticket |
//! | POST | `/api/tickets/{id}/vote` | Vote up or down, once per user |
//! | PATCH | `/api/tickets/{id}/review` | Set the moderation status |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use services::TicketService;
pub use store::{InMemoryTicketStore, PgTicketStore, TicketStore};
