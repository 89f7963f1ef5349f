use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct CreateSprintRequest {
    pub goal: String,
}

#[derive(Serialize, ToSchema)]
pub struct CreateSprintResponse {
    pub session_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct SprintListResponse {
    pub sessions: Vec<Uuid>,
}

/// Start a sprint without attaching an observer.
///
/// Events published before a WebSocket observer subscribes are dropped,
/// which is the expected trade-off of this endpoint.
#[utoipa::path(
    post,
    path = "/api/sprints",
    request_body = CreateSprintRequest,
    responses(
        (status = 201, description = "Sprint session created", body = CreateSprintResponse),
        (status = 400, description = "Empty sprint goal")
    ),
    tag = "sprints"
)]
pub async fn create_sprint(
    State(state): State<AppState>,
    Json(request): Json<CreateSprintRequest>,
) -> Result<(StatusCode, Json<CreateSprintResponse>), AppError> {
    let (session_id, _rx) = state.coordinator.create_session(&request.goal)?;
    Ok((StatusCode::CREATED, Json(CreateSprintResponse { session_id })))
}

#[utoipa::path(
    get,
    path = "/api/sprints",
    responses(
        (status = 200, description = "Active sprint sessions", body = SprintListResponse)
    ),
    tag = "sprints"
)]
pub async fn list_sprints(State(state): State<AppState>) -> Json<SprintListResponse> {
    Json(SprintListResponse {
        sessions: state.coordinator.session_ids(),
    })
}

#[utoipa::path(
    delete,
    path = "/api/sprints/{id}",
    params(
        ("id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 204, description = "Sprint session torn down"),
        (status = 404, description = "Session not found")
    ),
    tag = "sprints"
)]
pub async fn delete_sprint(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.coordinator.teardown(id)?;
    Ok(StatusCode::NO_CONTENT)
}
