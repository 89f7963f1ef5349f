pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Sprint Engine API",
        version = "0.1.0",
        description = "API for the autonomous Scrum sprint orchestration engine"
    ),
    paths(
        routes::health_check,
        routes::sprints::create_sprint,
        routes::sprints::list_sprints,
        routes::sprints::delete_sprint,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::sprints::CreateSprintRequest,
        routes::sprints::CreateSprintResponse,
        routes::sprints::SprintListResponse,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sprints", description = "Sprint session management endpoints"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health_check))
        .route(
            "/api/sprints",
            get(routes::list_sprints).post(routes::create_sprint),
        )
        .route(
            "/api/sprints/{id}",
            axum::routing::delete(routes::delete_sprint),
        )
        .route("/ws/sprint", get(routes::websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
