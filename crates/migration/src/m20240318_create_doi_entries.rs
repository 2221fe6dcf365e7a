use crate::{
    SchemaCheck,
    error::SchemaError,
    schema::{self, BASE_COLUMNS, DOI_ENTRIES, PRIMARY_KEY},
};
use log::debug;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Builds the `CREATE TABLE IF NOT EXISTS` statement for `doi_entries`
pub fn create_doi_entries() -> TableCreateStatement {
    Table::create()
        .table(DoiEntries::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(DoiEntries::CiteKey)
                .text()
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(DoiEntries::BibType).text().not_null())
        .col(ColumnDef::new(DoiEntries::Doi).text().not_null())
        .col(ColumnDef::new(DoiEntries::Url).text().not_null())
        .col(ColumnDef::new(DoiEntries::Author).text().not_null())
        .col(ColumnDef::new(DoiEntries::Title).text().not_null())
        .col(ColumnDef::new(DoiEntries::Journal).text().not_null())
        .col(ColumnDef::new(DoiEntries::Publisher).text().not_null())
        .col(ColumnDef::new(DoiEntries::Volume).integer().not_null())
        .col(ColumnDef::new(DoiEntries::Number).integer().not_null())
        .col(ColumnDef::new(DoiEntries::Month).text().not_null())
        .col(ColumnDef::new(DoiEntries::Year).integer().not_null())
        .to_owned()
}

#[async_trait::async_trait]
impl SchemaCheck for Migration {
    /// An existing `doi_entries` must already be the table we would create
    async fn check(&self, manager: &SchemaManager) -> Result<(), SchemaError> {
        let Some(kind) = schema::object_kind(manager, DOI_ENTRIES).await? else {
            return Ok(());
        };

        if !kind.is_table() {
            return Err(SchemaError::SchemaConflict {
                object: DOI_ENTRIES.to_string(),
                detail: format!("exists as {kind}"),
            });
        }

        let existing = schema::columns(manager, DOI_ENTRIES).await?;
        let mut mismatches = schema::column_mismatches(&existing, &BASE_COLUMNS);

        let primary_key = schema::primary_key(manager, DOI_ENTRIES).await?;
        mismatches.extend(schema::primary_key_mismatch(&primary_key, &PRIMARY_KEY));

        if !mismatches.is_empty() {
            return Err(SchemaError::SchemaConflict {
                object: DOI_ENTRIES.to_string(),
                detail: mismatches.join("; "),
            });
        }

        debug!("`{DOI_ENTRIES}` already exists with a compatible shape");
        Ok(())
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.check(manager).await?;

        manager.create_table(create_doi_entries()).await
    }
}

#[derive(Iden)]
enum DoiEntries {
    Table,
    CiteKey,
    BibType,
    Doi,
    Url,
    Author,
    Title,
    Journal,
    Publisher,
    Volume,
    Number,
    Month,
    Year,
}
