use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

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
pub enum Halls {
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
pub enum Zones {
    Table,
    Id,
    HallId,
    Name,
    BasePrice,
}

#[derive(DeriveIden)]
pub enum HallRows {
    Table,
    Id,
    HallId,
    ZoneId,
    RowNumber,
    SeatsCount,
    SeatType,
    Spacing,
}
