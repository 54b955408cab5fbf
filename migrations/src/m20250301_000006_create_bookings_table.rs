use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bookings::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Bookings::UserId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::ScheduleId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::ZoneId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::TicketTypeId).uuid().not_null())
                    .col(ColumnDef::new(Bookings::SeatRow).integer().not_null())
                    .col(ColumnDef::new(Bookings::SeatNumber).integer().not_null())
                    .col(ColumnDef::new(Bookings::Price).decimal().not_null())
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string()
                            .not_null()
                            .default("confirmed"),
                    )
                    .col(ColumnDef::new(Bookings::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Bookings::UpdatedAt).timestamp().null())
                    .col(ColumnDef::new(Bookings::CancelledAt).timestamp().null())
                    .col(ColumnDef::new(Bookings::CancelledBy).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_schedule_id")
                            .from(Bookings::Table, Bookings::ScheduleId)
                            .to(
                                super::m20250301_000005_create_schedules_table::Schedules::Table,
                                super::m20250301_000005_create_schedules_table::Schedules::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_zone_id")
                            .from(Bookings::Table, Bookings::ZoneId)
                            .to(
                                super::m20250301_000002_create_halls_tables::Zones::Table,
                                super::m20250301_000002_create_halls_tables::Zones::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_ticket_type_id")
                            .from(Bookings::Table, Bookings::TicketTypeId)
                            .to(
                                super::m20250301_000003_create_ticket_types_table::TicketTypes::Table,
                                super::m20250301_000003_create_ticket_types_table::TicketTypes::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_schedule_id")
                    .table(Bookings::Table)
                    .col(Bookings::ScheduleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_bookings_user_id")
                    .table(Bookings::Table)
                    .col(Bookings::UserId)
                    .to_owned(),
            )
            .await?;

        // Partial unique index: one confirmed booking per seat per schedule.
        // sea-query's IndexCreateStatement has no WHERE clause, so raw SQL;
        // the syntax below is valid on both SQLite and PostgreSQL.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_bookings_confirmed_seat \
                 ON bookings (schedule_id, seat_row, seat_number) \
                 WHERE status = 'confirmed'",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bookings {
    Table,
    Id,
    UserId,
    ScheduleId,
    ZoneId,
    TicketTypeId,
    SeatRow,
    SeatNumber,
    Price,
    Status,
    CreatedAt,
    UpdatedAt,
    CancelledAt,
    CancelledBy,
}
