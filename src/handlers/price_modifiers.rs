use axum::{extract::State, http::StatusCode, response::Json};

use crate::entities::price_modifier;
use crate::errors::ServiceError;
use crate::services::catalog::CreatePriceModifierRequest;
use crate::{ApiResponse, AppState};

pub async fn create_price_modifier(
    State(state): State<AppState>,
    Json(request): Json<CreatePriceModifierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<price_modifier::Model>>), ServiceError> {
    let modifier = state.services.catalog.create_price_modifier(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(modifier))))
}

pub async fn list_price_modifiers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<price_modifier::Model>>>, ServiceError> {
    let modifiers = state.services.catalog.list_price_modifiers().await?;
    Ok(Json(ApiResponse::success(modifiers)))
}
