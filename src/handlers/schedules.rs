use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::schedules::{ScheduleFilters, ScheduleResponse, UpdateScheduleRequest};
use crate::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct GenerateScheduleRequest {
    /// Inclusive range start, "YYYY-MM-DD".
    pub start_date: String,
    /// Inclusive range end, "YYYY-MM-DD".
    pub end_date: String,
}

/// Replace the whole schedule with freshly generated showtimes
#[utoipa::path(
    post,
    path = "/api/v1/schedules/generate",
    summary = "Generate schedule",
    description = "Replaces all showtimes (and their bookings) with a freshly packed schedule for the inclusive date range",
    request_body = GenerateScheduleRequest,
    responses(
        (status = 200, description = "Schedule generated"),
        (status = 400, description = "Invalid range or nothing to schedule", body = crate::errors::ErrorResponse),
        (status = 500, description = "Generation failed and was rolled back", body = crate::errors::ErrorResponse),
    ),
    tag = "schedules"
)]
pub async fn generate_schedule(
    State(state): State<AppState>,
    Json(request): Json<GenerateScheduleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let summary = state
        .services
        .schedule_generator
        .generate(&request.start_date, &request.end_date)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!(
                "Generated {} showtimes for {}..{}",
                summary.count, summary.start_date, summary.end_date
            ),
            "count": summary.count,
        })),
    ))
}

/// List showtimes with optional filters
#[utoipa::path(
    get,
    path = "/api/v1/schedules",
    summary = "List schedules",
    description = "Lists showtimes ordered by date and time, with embedded movie and hall data",
    params(
        ("movie_id" = Option<Uuid>, Query, description = "Filter by movie"),
        ("hall_id" = Option<Uuid>, Query, description = "Filter by hall"),
        ("is_active" = Option<bool>, Query, description = "Filter by visibility"),
        ("date_from" = Option<String>, Query, description = "Earliest show date, YYYY-MM-DD"),
        ("date_to" = Option<String>, Query, description = "Latest show date, YYYY-MM-DD"),
    ),
    responses(
        (status = 200, description = "Showtimes retrieved", body = Vec<ScheduleResponse>),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    tag = "schedules"
)]
pub async fn list_schedules(
    State(state): State<AppState>,
    Query(filters): Query<ScheduleFilters>,
) -> Result<Json<Vec<ScheduleResponse>>, ServiceError> {
    let schedules = state.services.schedules.list(filters).await?;
    Ok(Json(schedules))
}

/// Edit one showtime
#[utoipa::path(
    put,
    path = "/api/v1/admin/schedules/{id}",
    summary = "Update schedule",
    description = "Applies a partial edit to one showtime",
    params(("id" = Uuid, Path, description = "Schedule id")),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated"),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "schedules"
)]
pub async fn update_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.schedules.update(id, request).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Schedule {} updated", id) })),
    ))
}

/// Flip a showtime's public visibility
#[utoipa::path(
    patch,
    path = "/api/v1/admin/schedules/{id}/toggle-active",
    summary = "Toggle schedule visibility",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Visibility flipped"),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "schedules"
)]
pub async fn toggle_schedule_active(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let is_active = state.services.schedules.toggle_active(id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!(
                "Schedule {} is now {}",
                id,
                if is_active { "visible" } else { "hidden" }
            ),
            "is_active": is_active,
        })),
    ))
}

/// Delete one showtime
#[utoipa::path(
    delete,
    path = "/api/v1/admin/schedules/{id}",
    summary = "Delete schedule",
    description = "Deletes one showtime and its cancelled bookings; refused while confirmed bookings exist",
    params(("id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Schedule deleted"),
        (status = 400, description = "Confirmed bookings exist", body = crate::errors::ErrorResponse),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "schedules"
)]
pub async fn delete_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.schedules.delete(id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Schedule {} deleted", id) })),
    ))
}
