use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::services::bookings::{ReserveSeatRequest, SeatMapEntry};
use crate::{ApiResponse, AppState};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CancelBookingRequest {
    /// User performing the cancellation, recorded on the booking.
    pub cancelled_by: Uuid,
}

/// Reserve one seat on a showtime
#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    summary = "Reserve a seat",
    description = "Creates a confirmed booking with the price frozen at reservation time",
    request_body = ReserveSeatRequest,
    responses(
        (status = 200, description = "Seat reserved"),
        (status = 400, description = "Bad seat id or closed hall", body = crate::errors::ErrorResponse),
        (status = 404, description = "Schedule, zone or ticket type not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Seat already booked", body = crate::errors::ErrorResponse),
    ),
    tag = "bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<ReserveSeatRequest>,
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

    let booking = state.services.bookings.reserve(request).await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("Seat {} reserved", booking.seat_id()),
            "booking_id": booking.id,
            "price": booking.price,
        })),
    ))
}

/// Cancel a confirmed booking
#[utoipa::path(
    post,
    path = "/api/v1/admin/bookings/{id}/cancel",
    summary = "Cancel a booking",
    description = "Flips a confirmed booking to cancelled; terminal",
    params(("id" = Uuid, Path, description = "Booking id")),
    request_body = CancelBookingRequest,
    responses(
        (status = 200, description = "Booking cancelled"),
        (status = 400, description = "Already cancelled", body = crate::errors::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::errors::ErrorResponse),
    ),
    tag = "bookings"
)]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .bookings
        .cancel(id, request.cancelled_by)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": format!("Booking {} cancelled", id) })),
    ))
}

/// Seat map with per-seat price breakdown
#[utoipa::path(
    get,
    path = "/api/v1/bookings/seats/{schedule_id}",
    summary = "Seat map for a showtime",
    description = "Occupancy and the price breakdown for every seat of the showtime's hall",
    params(("schedule_id" = Uuid, Path, description = "Schedule id")),
    responses(
        (status = 200, description = "Seat map retrieved", body = Vec<SeatMapEntry>),
        (status = 400, description = "Schedule not active", body = crate::errors::ErrorResponse),
        (status = 404, description = "Schedule not found", body = crate::errors::ErrorResponse),
    ),
    tag = "bookings"
)]
pub async fn seat_map(
    State(state): State<AppState>,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<Vec<SeatMapEntry>>, ServiceError> {
    let map = state.services.bookings.seat_map(schedule_id).await?;
    Ok(Json(map))
}
