#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use axum_test::TestServer;

#[cfg(test)]
use crate::core::config::AppConfig;
#[cfg(test)]
use crate::features::tickets::{InMemoryTicketStore, TicketService};

#[cfg(test)]
pub fn test_app_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_allowed_origins: vec!["*".to_string()],
        max_request_body_size: 64 * 1024,
    }
}

/// Full application router over a fresh in-memory store
#[cfg(test)]
pub fn test_server() -> TestServer {
    let service = Arc::new(TicketService::new(Arc::new(InMemoryTicketStore::new())));
    let app = crate::app_router(crate::api_routes(service), &test_app_config());
    TestServer::new(app).expect("failed to start test server")
}
