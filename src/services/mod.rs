pub mod bookings;
pub mod catalog;
pub mod pricing;
pub mod scheduling;
pub mod schedules;

pub use bookings::BookingService;
pub use catalog::CatalogService;
pub use scheduling::ScheduleGeneratorService;
pub use schedules::ScheduleService;
