use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::catalog::{CreateHallRequest, HallDetailResponse};
use crate::{ApiResponse, AppState};

pub async fn create_hall(
    State(state): State<AppState>,
    Json(request): Json<CreateHallRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    // Validate the request
    if let Err(validation_errors) = request.validate() {
        let errors: Vec<String> = validation_errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                let field = field.clone();
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(json!(ApiResponse::<()>::validation_errors(errors))),
        ));
    }

    let hall = state.services.catalog.create_hall(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!(ApiResponse::success(hall))),
    ))
}

pub async fn list_halls(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<HallDetailResponse>>>, ServiceError> {
    let halls = state.services.catalog.list_halls().await?;
    Ok(Json(ApiResponse::success(halls)))
}

pub async fn get_hall(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<HallDetailResponse>>, ServiceError> {
    let hall = state.services.catalog.get_hall(id).await?;
    Ok(Json(ApiResponse::success(hall)))
}

pub async fn toggle_hall_closed(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let is_closed = state.services.catalog.toggle_hall_closed(id).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!(
                "Hall {} is now {}",
                id,
                if is_closed { "closed" } else { "open" }
            ),
            "is_closed": is_closed,
        })),
    ))
}
