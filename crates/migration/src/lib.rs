pub use sea_orm_migration::prelude::*;

pub mod error;
pub mod m20240318_create_doi_entries;
pub mod m20240319_add_doi_entries_search;
pub mod runner;
pub mod schema;

pub use error::{MigrateError, SchemaError};
pub use runner::{MigrationState, Status, apply_pending, migration_status};

/// Verifies that a migration can be applied to the schema as it stands
///
/// Runs before every `up`, inside the same transaction, and on its own from
/// [`apply_pending`] so that failures keep their [`SchemaError`] variant.
#[async_trait::async_trait]
pub trait SchemaCheck: MigrationName + Send + Sync {
    async fn check(&self, manager: &SchemaManager) -> Result<(), SchemaError>;
}

pub struct Migrator;

impl Migrator {
    /// Schema checks, in the same order as [`MigratorTrait::migrations`]
    pub fn schema_checks() -> Vec<Box<dyn SchemaCheck>> {
        vec![
            Box::new(m20240318_create_doi_entries::Migration),
            Box::new(m20240319_add_doi_entries_search::Migration),
        ]
    }
}

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240318_create_doi_entries::Migration),
            Box::new(m20240319_add_doi_entries_search::Migration),
        ]
    }
}
