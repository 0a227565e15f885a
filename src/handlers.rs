use crate::errors::AppError;
use crate::models::*;
use crate::person_service::{parse_list_params, PersonService};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Request bodies above this size are refused before decoding.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub people: PersonService,
}

impl AppState {
    pub fn new(people: PersonService) -> Self {
        Self { people }
    }
}

/// Builds the full application router: person endpoints, health check and
/// Swagger UI.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/people", get(list_people).post(create_person))
        .route(
            "/people/:id",
            get(get_person).put(update_person).delete(delete_person),
        )
        .merge(
            SwaggerUi::new("/swagger")
                .url("/api-docs/openapi.json", crate::openapi::ApiDoc::openapi()),
        )
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /people
///
/// Creates a person. Gender and nationality are inferred from the name when
/// the lookups are confident enough.
#[utoipa::path(
    post,
    path = "/people",
    tag = "people",
    request_body = PersonCreate,
    responses(
        (status = 200, description = "Person created", body = Person),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn create_person(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PersonCreate>, JsonRejection>,
) -> Result<Json<Person>, AppError> {
    let Json(input) = payload.map_err(invalid_body)?;
    tracing::info!("POST /people - name: {}", input.name);

    let person = state.people.create_person(input).await?;
    Ok(Json(person))
}

/// GET /people
///
/// Lists people with optional filters and pagination.
#[utoipa::path(
    get,
    path = "/people",
    tag = "people",
    params(ListParams),
    responses(
        (status = 200, description = "Matching people", body = [Person]),
        (status = 400, description = "Invalid query", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn list_people(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Person>>, AppError> {
    let Query(params) = query.map_err(invalid_query)?;
    tracing::info!("GET /people - params: {:?}", params);

    let (filter, page) = parse_list_params(params)?;
    let people = state.people.list_people(&filter, page).await?;
    Ok(Json(people))
}

/// GET /people/:id
#[utoipa::path(
    get,
    path = "/people/{id}",
    tag = "people",
    params(("id" = i64, Path, description = "Person id")),
    responses(
        (status = 200, description = "Person found", body = Person),
        (status = 404, description = "No such person", body = ErrorResponse)
    )
)]
pub async fn get_person(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Person>, AppError> {
    let id = person_id(id)?;
    tracing::info!("GET /people/{}", id);

    let person = state.people.get_person(id).await?;
    Ok(Json(person))
}

/// PUT /people/:id
///
/// Merge-patch update: only fields present in the body change. A missing
/// person is reported before the body is looked at.
#[utoipa::path(
    put,
    path = "/people/{id}",
    tag = "people",
    params(("id" = i64, Path, description = "Person id")),
    request_body = PersonUpdate,
    responses(
        (status = 200, description = "Person updated", body = Person),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "No such person", body = ErrorResponse),
        (status = 500, description = "Storage error", body = ErrorResponse)
    )
)]
pub async fn update_person(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PersonUpdate>, JsonRejection>,
) -> Result<Json<Person>, AppError> {
    let id = person_id(id)?;
    tracing::info!("PUT /people/{}", id);

    state.people.get_person(id).await?;
    let Json(update) = payload.map_err(invalid_body)?;

    let person = state.people.update_person(id, update).await?;
    Ok(Json(person))
}

/// DELETE /people/:id
#[utoipa::path(
    delete,
    path = "/people/{id}",
    tag = "people",
    params(("id" = i64, Path, description = "Person id")),
    responses(
        (status = 200, description = "Person deleted", body = MessageResponse),
        (status = 404, description = "No such person", body = ErrorResponse)
    )
)]
pub async fn delete_person(
    State(state): State<Arc<AppState>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = person_id(id)?;
    tracing::info!("DELETE /people/{}", id);

    state.people.delete_person(id).await?;
    Ok(Json(MessageResponse {
        message: "Person deleted".to_string(),
    }))
}

/// A path segment that is not an integer cannot name a person.
fn person_id(id: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!("Unparsable person id: {}", rejection.body_text());
        AppError::NotFound("Person not found".to_string())
    })
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    tracing::warn!("Invalid request body: {}", rejection.body_text());
    AppError::Validation(rejection.body_text())
}

fn invalid_query(rejection: QueryRejection) -> AppError {
    tracing::warn!("Invalid query string: {}", rejection.body_text());
    AppError::Validation(rejection.body_text())
}
