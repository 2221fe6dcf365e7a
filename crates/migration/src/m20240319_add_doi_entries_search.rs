use crate::{
    SchemaCheck,
    error::SchemaError,
    schema::{self, DOI_ENTRIES, SEARCH_COLUMN, SEARCH_INDEX, SEARCH_SOURCE_COLUMNS},
};
use sea_orm_migration::prelude::*;

/// Tokenizes each source field with the language-agnostic `simple` configuration
const SEARCH_EXPRESSION: &str = "to_tsvector('simple', title) || \
     to_tsvector('simple', author) || \
     to_tsvector('simple', journal) || \
     to_tsvector('simple', publisher)";

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Builds the `ALTER TABLE` adding the generated `search` column
pub fn add_search_column() -> TableAlterStatement {
    Table::alter()
        .table(DoiEntries::Table)
        .add_column(
            ColumnDef::new(DoiEntries::Search)
                .custom(Alias::new("tsvector"))
                .extra(format!("GENERATED ALWAYS AS ({SEARCH_EXPRESSION}) STORED")),
        )
        .to_owned()
}

/// Builds the GIN index over `search`
pub fn create_search_index() -> String {
    format!("CREATE INDEX {SEARCH_INDEX} ON {DOI_ENTRIES} USING gin ({SEARCH_COLUMN});")
}

#[async_trait::async_trait]
impl SchemaCheck for Migration {
    async fn check(&self, manager: &SchemaManager) -> Result<(), SchemaError> {
        let existing = schema::columns(manager, DOI_ENTRIES).await?;

        let missing = schema::missing_columns(&existing, &SEARCH_SOURCE_COLUMNS);
        if !missing.is_empty() {
            return Err(SchemaError::SchemaDependency {
                table: DOI_ENTRIES.to_string(),
                missing,
            });
        }

        if existing.iter().any(|column| column.name == SEARCH_COLUMN) {
            return Err(SchemaError::ColumnExists {
                table: DOI_ENTRIES.to_string(),
                column: SEARCH_COLUMN.to_string(),
            });
        }

        if let Some(table) = schema::index_table(manager, SEARCH_INDEX).await? {
            return Err(SchemaError::IndexExists {
                table,
                index: SEARCH_INDEX.to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        self.check(manager).await?;

        // Computed by Postgres on every insert and update, never written by clients
        manager.alter_table(add_search_column()).await?;

        manager
            .get_connection()
            .execute_unprepared(&create_search_index())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum DoiEntries {
    Table,
    Search,
}
