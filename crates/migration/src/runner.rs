use crate::{
    Migrator, SchemaCheck,
    error::{MigrateError, SchemaError},
};
use log::{debug, info, warn};
use sea_orm_migration::{
    MigrationStatus,
    prelude::*,
    sea_orm::{DatabaseConnection, DatabaseTransaction, DbBackend, Statement, TransactionTrait},
};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Advisory lock key shared by every process that migrates this database
const MIGRATION_LOCK_KEY: i64 = 0x6269_6264_625f_6d67;

/// Whether a migration has been recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Applied,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Applied => write!(f, "Applied"),
        }
    }
}

/// A known migration and its ledger status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationState {
    pub name: String,
    pub status: Status,
}

/// Opens a transaction holding the migration lock, with the ledger installed
///
/// The lock is transaction-scoped, so it is released on commit or rollback
/// of the same connection.
async fn locked_transaction(db: &DatabaseConnection) -> Result<DatabaseTransaction, DbErr> {
    let txn = db.begin().await?;

    if txn.get_database_backend() == DbBackend::Postgres {
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [MIGRATION_LOCK_KEY.into()],
        ))
        .await?;
        debug!("Acquired migration lock");
    }

    Migrator::install(&txn).await?;
    Ok(txn)
}

/// Runs the schema check and the migration inside the locked transaction
async fn apply_next(
    txn: &DatabaseTransaction,
    checks: &[Box<dyn SchemaCheck>],
    name: &str,
) -> Result<(), SchemaError> {
    if let Some(check) = checks.iter().find(|check| check.name() == name) {
        check.check(&SchemaManager::new(txn)).await?;
    }

    // Runs as a savepoint and records the ledger row next to the change
    Migrator::up(txn, Some(1)).await?;
    Ok(())
}

/// Applies every pending migration in order, one transaction each
///
/// Migrations already in the ledger are skipped. The first failure stops the
/// run; migrations after it are not attempted and stay pending. Concurrent
/// runs against the same database wait on an advisory lock and apply each
/// migration once.
///
/// # Arguments
/// * `db` - Connection to the target database
///
/// # Returns
/// Names of the migrations applied by this call, empty when the schema was
/// already current
pub async fn apply_pending(db: &DatabaseConnection) -> Result<Vec<String>, MigrateError> {
    let checks = Migrator::schema_checks();
    let mut applied = Vec::new();

    loop {
        let txn = locked_transaction(db).await.map_err(MigrateError::Ledger)?;

        // Read under the lock, so a migration applied by another run is not repeated
        let next = Migrator::get_pending_migrations(&txn)
            .await
            .map_err(MigrateError::Ledger)?
            .first()
            .map(|migration| migration.name().to_string());

        let Some(name) = next else {
            txn.commit().await.map_err(MigrateError::Ledger)?;
            break;
        };

        info!("Applying migration '{name}'");

        if let Err(cause) = apply_next(&txn, &checks, &name).await {
            if let Err(err) = txn.rollback().await {
                warn!("Rollback of migration '{name}' failed: {err}");
            }
            return Err(MigrateError::Apply {
                migration: name,
                cause,
            });
        }

        if let Err(err) = txn.commit().await {
            return Err(MigrateError::Apply {
                migration: name,
                cause: SchemaError::Store(err),
            });
        }

        info!("Migration '{name}' has been applied");
        applied.push(name);
    }

    if applied.is_empty() {
        info!("Database schema is up to date");
    }

    Ok(applied)
}

/// Lists every known migration with its ledger status, in application order
pub async fn migration_status(db: &DatabaseConnection) -> Result<Vec<MigrationState>, MigrateError> {
    let txn = locked_transaction(db).await.map_err(MigrateError::Ledger)?;

    let migrations = Migrator::get_migration_with_status(&txn)
        .await
        .map_err(MigrateError::Ledger)?;
    txn.commit().await.map_err(MigrateError::Ledger)?;

    Ok(migrations
        .iter()
        .map(|migration| MigrationState {
            name: migration.name().to_string(),
            status: match migration.status() {
                MigrationStatus::Applied => Status::Applied,
                MigrationStatus::Pending => Status::Pending,
            },
        })
        .collect())
}
