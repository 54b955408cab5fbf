//! Kinoplex API Library
//!
//! Core services of an online cinema ticketing platform: automated showtime
//! scheduling, tiered seat pricing and conflict-safe seat reservation.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod clock;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    extract::State,
    response::Json,
    routing::{delete, get, patch, post, put},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Envelope for JSON responses produced by catalogue and admin endpoints.
///
/// Booking and schedule endpoints return bare payloads; everything that
/// goes through this envelope carries `success` plus either `data` or the
/// error fields, never both.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    fn failure(message: String, errors: Option<Vec<String>>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn error(message: String) -> Self {
        Self::failure(message, None)
    }

    /// Envelope for field-level validation failures, one string per field.
    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self::failure("Validation failed".to_string(), Some(errors))
    }
}

/// Per-response metadata. The request id comes from the task-local scope
/// set by [`tracing::request_id_middleware`], so it is absent in contexts
/// that bypass the middleware (tests calling services directly).
#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.0),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Query string accepted by paginated list endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    #[serde(default = "first_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub limit: u64,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn first_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes under /api/v1
pub fn api_v1_routes() -> Router<AppState> {
    // Public storefront surface
    let schedules_read = Router::new().route("/schedules", get(handlers::schedules::list_schedules));

    let schedules_generate = Router::new().route(
        "/schedules/generate",
        post(handlers::schedules::generate_schedule),
    );

    let schedules_admin = Router::new()
        .route(
            "/admin/schedules/:id",
            put(handlers::schedules::update_schedule),
        )
        .route(
            "/admin/schedules/:id",
            delete(handlers::schedules::delete_schedule),
        )
        .route(
            "/admin/schedules/:id/toggle-active",
            patch(handlers::schedules::toggle_schedule_active),
        );

    let bookings = Router::new()
        .route("/bookings", post(handlers::bookings::create_booking))
        .route(
            "/bookings/seats/:schedule_id",
            get(handlers::bookings::seat_map),
        )
        .route(
            "/admin/bookings/:id/cancel",
            post(handlers::bookings::cancel_booking),
        );

    // Catalogue surface feeding the generator and the pricing engine
    let movies = Router::new()
        .route("/movies", get(handlers::movies::list_movies))
        .route("/movies", post(handlers::movies::create_movie))
        .route("/movies/:id", get(handlers::movies::get_movie));

    let halls = Router::new()
        .route("/halls", get(handlers::halls::list_halls))
        .route("/halls", post(handlers::halls::create_hall))
        .route("/halls/:id", get(handlers::halls::get_hall))
        .route(
            "/halls/:id/toggle-closed",
            patch(handlers::halls::toggle_hall_closed),
        );

    let ticket_types = Router::new()
        .route(
            "/ticket-types",
            get(handlers::ticket_types::list_ticket_types),
        )
        .route(
            "/ticket-types",
            post(handlers::ticket_types::create_ticket_type),
        );

    let price_modifiers = Router::new()
        .route(
            "/price-modifiers",
            get(handlers::price_modifiers::list_price_modifiers),
        )
        .route(
            "/price-modifiers",
            post(handlers::price_modifiers::create_price_modifier),
        );

    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Scheduling API
        .merge(schedules_read)
        .merge(schedules_generate)
        .merge(schedules_admin)
        // Booking API
        .merge(bookings)
        // Catalogue API
        .merge(movies)
        .merge(halls)
        .merge(ticket_types)
        .merge(price_modifiers)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "service": "kinoplex-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("RUN_ENV").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    // Check database connectivity
    let db_status = if db::check_connection(&state.db).await.is_ok() {
        "healthy"
    } else {
        "unhealthy"
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

/// Access-log middleware: one line per handled request with status and latency.
pub async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    tracing::debug!(method = %method, uri = %uri, "request received");
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );

    response
}

pub mod prelude {
    pub use crate::clock::*;
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::openapi::*;
    pub use crate::services::*;
    pub use crate::tracing::*;
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_envelope_captures_scoped_request_id() {
        let envelope = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("envelope-test-1"),
            async { ApiResponse::success("payload") },
        )
        .await;

        assert!(envelope.success);
        let meta = envelope.meta.expect("meta should be captured");
        assert_eq!(meta.request_id.as_deref(), Some("envelope-test-1"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should be RFC 3339");
    }

    #[tokio::test]
    async fn error_envelope_has_no_data() {
        let envelope = ApiResponse::<()>::error("lookup failed".into());

        assert!(!envelope.success);
        assert!(envelope.data.is_none());
        assert_eq!(envelope.message.as_deref(), Some("lookup failed"));
        // Outside a request scope the id is simply absent.
        assert!(envelope.meta.is_some_and(|m| m.request_id.is_none()));
    }

    #[tokio::test]
    async fn validation_envelope_keeps_field_errors() {
        let envelope = crate::tracing::scope_request_id(
            crate::tracing::RequestId::new("envelope-test-3"),
            async {
                ApiResponse::<()>::validation_errors(vec![
                    "seat_id: too short".into(),
                    "multiplier: out of range".into(),
                ])
            },
        )
        .await;

        assert!(!envelope.success);
        assert_eq!(envelope.errors.as_ref().map(Vec::len), Some(2));
        let meta = envelope.meta.expect("meta should be captured");
        assert_eq!(meta.request_id.as_deref(), Some("envelope-test-3"));
    }

    #[test]
    fn pagination_rounds_page_count_up() {
        let page = PaginatedResponse::new(vec![1, 2], 5, 1, 2);
        assert_eq!(page.total_pages, 3);

        let empty = PaginatedResponse::<i32>::new(vec![], 0, 1, 20);
        assert_eq!(empty.total_pages, 0);
    }
}
