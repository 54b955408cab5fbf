use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

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
                            .to(
                                super::m20250301_000001_create_movies_table::Movies::Table,
                                super::m20250301_000001_create_movies_table::Movies::Id,
                            )
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_schedules_hall_id")
                            .from(Schedules::Table, Schedules::HallId)
                            .to(
                                super::m20250301_000002_create_halls_tables::Halls::Table,
                                super::m20250301_000002_create_halls_tables::Halls::Id,
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
pub enum Schedules {
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
