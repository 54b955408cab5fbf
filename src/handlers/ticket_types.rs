use axum::{extract::State, http::StatusCode, response::Json};

use crate::entities::ticket_type;
use crate::errors::ServiceError;
use crate::services::catalog::CreateTicketTypeRequest;
use crate::{ApiResponse, AppState};

pub async fn create_ticket_type(
    State(state): State<AppState>,
    Json(request): Json<CreateTicketTypeRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ticket_type::Model>>), ServiceError> {
    let ticket_type = state.services.catalog.create_ticket_type(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(ticket_type))))
}

pub async fn list_ticket_types(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ticket_type::Model>>>, ServiceError> {
    let ticket_types = state.services.catalog.list_ticket_types().await?;
    Ok(Json(ApiResponse::success(ticket_types)))
}
