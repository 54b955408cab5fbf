use sea_orm_migration::prelude::*;

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

// Migration implementations

mod m20250301_000001_create_movies_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_movies_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Movies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Movies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Movies::Title).string().not_null())
                        .col(
                            ColumnDef::new(Movies::DurationMinutes)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Movies::AgeRating).string().null())
                        .col(
                            ColumnDef::new(Movies::PopularityScore)
                                .double()
                                .not_null()
                                .default(0.0),
                        )
                        .col(ColumnDef::new(Movies::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Movies::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movies_title")
                        .table(Movies::Table)
                        .col(Movies::Title)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Movies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Movies {
        Table,
        Id,
        Title,
        DurationMinutes,
        AgeRating,
        PopularityScore,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_halls_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_halls_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Halls::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Halls::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Halls::Name).string().not_null().unique_key())
                        .col(
                            ColumnDef::new(Halls::Capacity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Halls::HallType)
                                .string()
                                .not_null()
                                .default("standard"),
                        )
                        .col(
                            ColumnDef::new(Halls::IsClosed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Halls::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Halls::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Zones::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Zones::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Zones::HallId).uuid().not_null())
                        .col(ColumnDef::new(Zones::Name).string().not_null())
                        .col(ColumnDef::new(Zones::BasePrice).decimal().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_zones_hall_id")
                                .from(Zones::Table, Zones::HallId)
                                .to(Halls::Table, Halls::Id)
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
                        .name("idx_zones_hall_id")
                        .table(Zones::Table)
                        .col(Zones::HallId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(HallRows::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(HallRows::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(HallRows::HallId).uuid().not_null())
                        .col(ColumnDef::new(HallRows::ZoneId).uuid().not_null())
                        .col(ColumnDef::new(HallRows::RowNumber).integer().not_null())
                        .col(ColumnDef::new(HallRows::SeatsCount).integer().not_null())
                        .col(
                            ColumnDef::new(HallRows::SeatType)
                                .string()
                                .not_null()
                                .default("standard"),
                        )
                        .col(ColumnDef::new(HallRows::Spacing).string().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_hall_rows_hall_id")
                                .from(HallRows::Table, HallRows::HallId)
                                .to(Halls::Table, Halls::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_hall_rows_zone_id")
                                .from(HallRows::Table, HallRows::ZoneId)
                                .to(Zones::Table, Zones::Id)
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
                        .name("idx_hall_rows_hall_id_row_number")
                        .table(HallRows::Table)
                        .col(HallRows::HallId)
                        .col(HallRows::RowNumber)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(HallRows::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Zones::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Halls::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Halls {
        Table,
        Id,
        Name,
        Capacity,
        HallType,
        IsClosed,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Zones {
        Table,
        Id,
        HallId,
        Name,
        BasePrice,
    }

    #[derive(DeriveIden)]
    enum HallRows {
        Table,
        Id,
        HallId,
        ZoneId,
        RowNumber,
        SeatsCount,
        SeatType,
        Spacing,
    }
}

mod m20250301_000003_create_ticket_types_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_ticket_types_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TicketTypes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TicketTypes::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TicketTypes::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(TicketTypes::Multiplier).decimal().not_null())
                        .col(
                            ColumnDef::new(TicketTypes::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TicketTypes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TicketTypes {
        Table,
        Id,
        Name,
        Multiplier,
        CreatedAt,
    }
}

mod m20250301_000004_create_price_modifiers_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_price_modifiers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PriceModifiers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PriceModifiers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PriceModifiers::Kind).string().not_null())
                        .col(ColumnDef::new(PriceModifiers::Name).string().not_null())
                        .col(
                            ColumnDef::new(PriceModifiers::Multiplier)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PriceModifiers::Condition).text().not_null())
                        .col(
                            ColumnDef::new(PriceModifiers::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PriceModifiers::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PriceModifiers::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_price_modifiers_kind")
                        .table(PriceModifiers::Table)
                        .col(PriceModifiers::Kind)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PriceModifiers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PriceModifiers {
        Table,
        Id,
        Kind,
        Name,
        Multiplier,
        Condition,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000005_create_schedules_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000005_create_schedules_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Schedules::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Schedules::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Schedules::MovieId).uuid().not_null())
                        .col(ColumnDef::new(Schedules::HallId).uuid().not_null())
                        .col(ColumnDef::new(Schedules::ShowDate).date().not_null())
                        .col(ColumnDef::new(Schedules::StartTime).time().not_null())
                        .col(
                            ColumnDef::new(Schedules::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Schedules::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Schedules::UpdatedAt).timestamp().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedules_movie_id")
                                .from(Schedules::Table, Schedules::MovieId)
                                .to(Movies::Table, Movies::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_schedules_hall_id")
                                .from(Schedules::Table, Schedules::HallId)
                                .to(Halls::Table, Halls::Id)
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
                        .name("idx_schedules_hall_id_show_date")
                        .table(Schedules::Table)
                        .col(Schedules::HallId)
                        .col(Schedules::ShowDate)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_schedules_movie_id")
                        .table(Schedules::Table)
                        .col(Schedules::MovieId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Schedules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Schedules {
        Table,
        Id,
        MovieId,
        HallId,
        ShowDate,
        StartTime,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Movies {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Halls {
        Table,
        Id,
    }
}

mod m20250301_000006_create_bookings_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000006_create_bookings_table"
        }
    }

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
                                .to(Schedules::Table, Schedules::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_zone_id")
                                .from(Bookings::Table, Bookings::ZoneId)
                                .to(Zones::Table, Zones::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_bookings_ticket_type_id")
                                .from(Bookings::Table, Bookings::TicketTypeId)
                                .to(TicketTypes::Table, TicketTypes::Id)
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

            // Partial unique index guarding confirmed seats. sea-query has no
            // builder support for a WHERE clause on indexes; the raw statement
            // below parses on both SQLite and PostgreSQL.
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
    enum Bookings {
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

    #[derive(DeriveIden)]
    enum Schedules {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum Zones {
        Table,
        Id,
    }

    #[derive(DeriveIden)]
    enum TicketTypes {
        Table,
        Id,
    }
}
