use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use kinoplex_api::{
    clock::FixedClock,
    config::AppConfig,
    db::{self, DbPool},
    entities::{movie, price_modifier, schedule, ticket_type},
    events::{self, EventSender},
    handlers::AppServices,
    services::ScheduleGeneratorService,
    AppState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

/// Helper harness for spinning up an application state backed by a
/// file-based SQLite database in a temporary directory.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _tmp: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        // A file-backed database: with :memory: every pooled connection
        // would get its own empty database.
        let tmp = TempDir::new().expect("failed to create temp dir");
        let db_url = format!("sqlite://{}/test.db?mode=rwc", tmp.path().display());

        let mut cfg = AppConfig::new(
            db_url,
            "127.0.0.1".to_string(),
            18_080,
            "development".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let state = AppState {
            db: db_arc,
            config: cfg.clone(),
            event_sender,
            services,
        };

        let router = Router::new()
            .nest("/api/v1", kinoplex_api::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _tmp: tmp,
            _event_task: event_task,
        }
    }

    pub fn db(&self) -> Arc<DbPool> {
        self.state.db.clone()
    }

    /// A generator whose clock and RNG are pinned, so runs are repeatable.
    pub fn generator_at(&self, now: NaiveDateTime, seed: u64) -> ScheduleGeneratorService {
        ScheduleGeneratorService::with_clock_and_rng(
            self.db(),
            Some(Arc::new(self.state.event_sender.clone())),
            Arc::new(FixedClock(now)),
            StdRng::seed_from_u64(seed),
        )
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("request should build");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should produce a response")
    }

    pub async fn seed_movie(
        &self,
        title: &str,
        duration_minutes: i32,
        age_rating: Option<&str>,
        popularity_score: f64,
    ) -> movie::Model {
        movie::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            duration_minutes: Set(duration_minutes),
            age_rating: Set(age_rating.map(str::to_string)),
            popularity_score: Set(popularity_score),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed movie")
    }

    /// Seeds a hall through the catalog service so zones and rows come with
    /// it. Returns the created hall with its layout.
    pub async fn seed_hall(
        &self,
        name: &str,
        zones: &[(&str, Decimal)],
        rows: &[(i32, i32, &str)],
    ) -> kinoplex_api::services::catalog::HallDetailResponse {
        use kinoplex_api::services::catalog::{
            CreateHallRequest, CreateRowRequest, CreateZoneRequest,
        };

        let request = CreateHallRequest {
            name: name.to_string(),
            hall_type: "standard".to_string(),
            zones: zones
                .iter()
                .map(|(zone_name, base_price)| CreateZoneRequest {
                    name: zone_name.to_string(),
                    base_price: *base_price,
                })
                .collect(),
            rows: rows
                .iter()
                .map(|(row_number, seats_count, zone_name)| CreateRowRequest {
                    row_number: *row_number,
                    seats_count: *seats_count,
                    zone: zone_name.to_string(),
                    seat_type: None,
                    spacing: None,
                })
                .collect(),
        };

        self.state
            .services
            .catalog
            .create_hall(request)
            .await
            .expect("failed to seed hall")
    }

    pub async fn seed_schedule(
        &self,
        movie_id: Uuid,
        hall_id: Uuid,
        show_date: NaiveDate,
        start_time: NaiveTime,
    ) -> schedule::Model {
        schedule::ActiveModel {
            id: Set(Uuid::new_v4()),
            movie_id: Set(movie_id),
            hall_id: Set(hall_id),
            show_date: Set(show_date),
            start_time: Set(start_time),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed schedule")
    }

    pub async fn seed_ticket_type(&self, name: &str, multiplier: Decimal) -> ticket_type::Model {
        ticket_type::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            multiplier: Set(multiplier),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed ticket type")
    }

    pub async fn seed_modifier(
        &self,
        kind: &str,
        multiplier: Decimal,
        condition: &str,
        is_active: bool,
    ) -> price_modifier::Model {
        price_modifier::ActiveModel {
            id: Set(Uuid::new_v4()),
            kind: Set(kind.to_string()),
            name: Set(format!("{} rule", kind)),
            multiplier: Set(multiplier),
            condition: Set(condition.to_string()),
            is_active: Set(is_active),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.state.db)
        .await
        .expect("failed to seed price modifier")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Date helper used across tests.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// Time helper used across tests.
pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

/// Datetime helper used across tests.
pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    date(y, mo, d).and_hms_opt(h, mi, 0).expect("valid datetime")
}
