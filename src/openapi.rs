use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Kinoplex API",
        version = "0.2.0",
        description = r#"
# Kinoplex Cinema Ticketing API

Core services of an online cinema ticketing platform: automated showtime
scheduling, tiered seat pricing and conflict-safe seat reservation.

## Scheduling

`POST /api/v1/schedules/generate` replaces the whole schedule for a date
range in one transaction. Showtimes are packed per hall and day on a
quarter-hour grid with a 20-minute cleaning gap and age-rating windows.

## Pricing

A seat price is the zone base price scaled by the active popularity and
time-slot modifiers; the ticket type multiplier is applied at purchase.
Prices are frozen on the booking at reservation time.

## Errors

Errors use a consistent envelope with appropriate HTTP status codes:

```json
{
  "error": "Conflict",
  "message": "Conflict: Seat 3-7 is already booked",
  "timestamp": "2026-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "schedules", description = "Showtime generation and administration"),
        (name = "bookings", description = "Seat reservation and seat maps")
    ),
    paths(
        crate::handlers::schedules::generate_schedule,
        crate::handlers::schedules::list_schedules,
        crate::handlers::schedules::update_schedule,
        crate::handlers::schedules::toggle_schedule_active,
        crate::handlers::schedules::delete_schedule,
        crate::handlers::bookings::create_booking,
        crate::handlers::bookings::cancel_booking,
        crate::handlers::bookings::seat_map,
    ),
    components(
        schemas(
            crate::ApiResponse<serde_json::Value>,
            crate::PaginatedResponse<serde_json::Value>,
            crate::ListQuery,
            crate::handlers::schedules::GenerateScheduleRequest,
            crate::handlers::bookings::CancelBookingRequest,
            crate::services::schedules::ScheduleFilters,
            crate::services::schedules::UpdateScheduleRequest,
            crate::services::schedules::ScheduleResponse,
            crate::services::schedules::MovieSummary,
            crate::services::schedules::HallSummary,
            crate::services::schedules::ZoneSummary,
            crate::services::bookings::ReserveSeatRequest,
            crate::services::bookings::SeatMapEntry,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_covers_core_paths() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).expect("document serializes");
        assert!(json.contains("Kinoplex API"));
        assert!(json.contains("/api/v1/schedules/generate"));
        assert!(json.contains("/api/v1/bookings/seats/{schedule_id}"));
    }
}
