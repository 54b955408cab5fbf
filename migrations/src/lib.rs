pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_movies_table;
mod m20250301_000002_create_halls_tables;
mod m20250301_000003_create_ticket_types_table;
mod m20250301_000004_create_price_modifiers_table;
mod m20250301_000005_create_schedules_table;
mod m20250301_000006_create_bookings_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_movies_table::Migration),
            Box::new(m20250301_000002_create_halls_tables::Migration),
            Box::new(m20250301_000003_create_ticket_types_table::Migration),
            Box::new(m20250301_000004_create_price_modifiers_table::Migration),
            Box::new(m20250301_000005_create_schedules_table::Migration),
            Box::new(m20250301_000006_create_bookings_table::Migration),
        ]
    }
}
