use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Queries::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Queries::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Queries::County).string().not_null())
                    .col(ColumnDef::new(Queries::Searches).text().not_null())
                    .col(ColumnDef::new(Queries::Timestamp).string().not_null())
                    .col(ColumnDef::new(Queries::Status).string().not_null())
                    .col(ColumnDef::new(Queries::TrackingToken).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Cases::CaseId)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Cases::Business).string().not_null())
                    .col(ColumnDef::new(Cases::FilingDate).string().not_null())
                    .col(ColumnDef::new(Cases::Defendant).string().not_null())
                    .col(ColumnDef::new(Cases::CaseName).string().null())
                    .col(ColumnDef::new(Cases::Loaded).string().not_null())
                    .col(ColumnDef::new(Cases::CaseStatus).string().not_null())
                    .col(ColumnDef::new(Cases::Addresses).text().not_null())
                    .col(ColumnDef::new(Cases::Other).text().not_null())
                    .col(ColumnDef::new(Cases::QueryId).string().not_null())
                    .col(ColumnDef::new(Cases::UserStatus).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cases_query_id")
                            .from(Cases::Table, Cases::QueryId)
                            .to(Queries::Table, Queries::Id)
                            .on_delete(ForeignKeyAction::NoAction)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cases_query_id")
                    .table(Cases::Table)
                    .col(Cases::QueryId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Queries::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Queries {
    Table,
    Id,
    County,
    Searches,
    Timestamp,
    Status,
    TrackingToken,
}

#[derive(Iden)]
enum Cases {
    Table,
    CaseId,
    Business,
    FilingDate,
    Defendant,
    CaseName,
    Loaded,
    CaseStatus,
    Addresses,
    Other,
    QueryId,
    UserStatus,
}
