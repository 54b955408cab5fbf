pub mod bookings;
pub mod halls;
pub mod movies;
pub mod price_modifiers;
pub mod schedules;
pub mod ticket_types;

use std::sync::Arc;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{BookingService, CatalogService, ScheduleGeneratorService, ScheduleService};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub schedule_generator: Arc<ScheduleGeneratorService>,
    pub schedules: Arc<ScheduleService>,
    pub bookings: Arc<BookingService>,
    pub catalog: Arc<CatalogService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let sender = Some(event_sender);
        Self {
            schedule_generator: Arc::new(ScheduleGeneratorService::new(
                db_pool.clone(),
                sender.clone(),
            )),
            schedules: Arc::new(ScheduleService::new(db_pool.clone(), sender.clone())),
            bookings: Arc::new(BookingService::new(db_pool.clone(), sender.clone())),
            catalog: Arc::new(CatalogService::new(db_pool, sender)),
        }
    }
}
