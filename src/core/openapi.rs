use utoipa::{Modify, OpenApi};

use crate::features::tickets::{
    dtos as tickets_dtos, handlers as tickets_handlers, models as tickets_models,
};
use crate::shared::types::ErrorBody;

#[derive(OpenApi)]
#[openapi(
    paths(
        tickets_handlers::submit_ticket,
        tickets_handlers::list_tickets,
        tickets_handlers::get_ticket,
        tickets_handlers::vote_ticket,
        tickets_handlers::review_ticket,
    ),
    components(
        schemas(
            // Shared
            ErrorBody,
            // Tickets
            tickets_models::RescueOrProtect,
            tickets_models::HasDocumentation,
            tickets_models::AnimalDetails,
            tickets_models::OriginalLocation,
            tickets_models::RemovalDetails,
            tickets_models::CurrentLocation,
            tickets_models::Evidence,
            tickets_models::PersonalStatement,
            tickets_models::Documentation,
            tickets_models::SubmitterInfo,
            tickets_models::LegacyFields,
            tickets_models::TicketDetails,
            tickets_dtos::CreateTicketDto,
            tickets_dtos::VoteTicketDto,
            tickets_dtos::ReviewTicketDto,
            tickets_dtos::VoterDto,
            tickets_dtos::TicketResponseDto,
        )
    ),
    tags(
        (name = "tickets", description = "Animal-welfare tickets: submission, voting and review"),
    ),
    info(
        title = "Animal Ticket API",
        version = "0.1.0",
        description = "Submit, vote on and moderate animal-welfare tickets",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
