use crate::handlers;
use crate::models::{ErrorResponse, MessageResponse, Person, PersonCreate, PersonUpdate};
use utoipa::OpenApi;

/// OpenAPI document for the person endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Person API",
        description = "CRUD over people, enriched with gender and nationality inferred from the name"
    ),
    paths(
        handlers::health,
        handlers::create_person,
        handlers::list_people,
        handlers::get_person,
        handlers::update_person,
        handlers::delete_person,
    ),
    components(schemas(Person, PersonCreate, PersonUpdate, MessageResponse, ErrorResponse)),
    tags(
        (name = "people", description = "Person management"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
