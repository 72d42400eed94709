use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(EventPermissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EventPermissions::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventPermissions::RoleId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EventPermissions::Permission)
                            .string_len(32)
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(EventPermissions::GuildId)
                            .col(EventPermissions::RoleId)
                            .col(EventPermissions::Permission),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EventPermissions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum EventPermissions {
    Table,
    GuildId,
    RoleId,
    Permission,
}
