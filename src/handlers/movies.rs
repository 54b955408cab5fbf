use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::entities::movie;
use crate::errors::ServiceError;
use crate::services::catalog::CreateMovieRequest;
use crate::{ApiResponse, AppState, ListQuery, PaginatedResponse};

pub async fn create_movie(
    State(state): State<AppState>,
    Json(request): Json<CreateMovieRequest>,
) -> Result<(StatusCode, Json<ApiResponse<movie::Model>>), ServiceError> {
    let movie = state.services.catalog.create_movie(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(movie))))
}

pub async fn list_movies(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<movie::Model>>>, ServiceError> {
    let page = query.page.max(1);
    let limit = query
        .limit
        .clamp(1, u64::from(state.config.api_max_page_size));
    let (items, total) = state.services.catalog.list_movies(page, limit).await?;
    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        items, total, page, limit,
    ))))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<movie::Model>>, ServiceError> {
    let movie = state.services.catalog.get_movie(id).await?;
    Ok(Json(ApiResponse::success(movie)))
}
