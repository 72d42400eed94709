use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rsvps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rsvps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Rsvps::EventId).integer().not_null())
                    .col(ColumnDef::new(Rsvps::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Rsvps::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Rsvps::RsvpAt).date_time().not_null())
                    .to_owned(),
            )
            .await?;

        // One record per (event, user); the upsert path relies on this
        manager
            .create_index(
                Index::create()
                    .name("idx-rsvps-event-user")
                    .table(Rsvps::Table)
                    .col(Rsvps::EventId)
                    .col(Rsvps::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rsvps::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Rsvps {
    Table,
    Id,
    EventId,
    UserId,
    Status,
    RsvpAt,
}
