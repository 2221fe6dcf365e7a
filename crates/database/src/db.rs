use crate::config::DatabaseSettings;
use log::{LevelFilter, info};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Creates a database connection
pub async fn create_connection(settings: &DatabaseSettings) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(settings.url.clone());
    options
        .max_connections(settings.max_connections)
        .sqlx_logging_level(LevelFilter::Debug);

    if let Some(schema) = &settings.schema {
        options.set_schema_search_path(schema.clone());
    }

    let db = Database::connect(options).await?;
    info!("Connected to database");

    Ok(db)
}
