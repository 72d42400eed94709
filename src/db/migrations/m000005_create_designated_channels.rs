use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DesignatedChannels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DesignatedChannels::GuildId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DesignatedChannels::ChannelId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DesignatedChannels::GuildId)
                            .col(DesignatedChannels::ChannelId),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DesignatedChannels::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DesignatedChannels {
    Table,
    GuildId,
    ChannelId,
}
