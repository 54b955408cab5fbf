use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

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
pub enum PriceModifiers {
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
