use sea_orm_migration::prelude::DbErr;
use thiserror::Error;

/// Why a schema change cannot be applied to the current database
#[derive(Debug, Error)]
pub enum SchemaError {
    /// An object with the target name exists but has an incompatible shape
    #[error("`{object}` already exists with an incompatible definition: {detail}")]
    SchemaConflict { object: String, detail: String },

    /// The change builds on structure that is not there yet
    #[error("`{table}` is missing required column(s): {}", missing.join(", "))]
    SchemaDependency { table: String, missing: Vec<String> },

    #[error("column `{column}` already exists on `{table}`")]
    ColumnExists { table: String, column: String },

    #[error("index `{index}` already exists on `{table}`")]
    IndexExists { table: String, index: String },

    /// Any other error reported by the store
    #[error(transparent)]
    Store(#[from] DbErr),
}

/// Lets schema checks run inside `MigrationTrait::up`, which must return [`DbErr`]
impl From<SchemaError> for DbErr {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Store(err) => err,
            other => DbErr::Migration(other.to_string()),
        }
    }
}

/// Failure of a migration run
#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("failed to read the migration ledger: {0}")]
    Ledger(#[source] DbErr),

    /// The named migration failed; nothing after it was attempted
    #[error("migration `{migration}` failed: {cause}")]
    Apply {
        migration: String,
        #[source]
        cause: SchemaError,
    },
}

impl MigrateError {
    /// Name of the migration that failed, if the failure belongs to one
    pub fn migration(&self) -> Option<&str> {
        match self {
            Self::Ledger(_) => None,
            Self::Apply { migration, .. } => Some(migration),
        }
    }
}
