use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use database::{
    config::DatabaseSettings, db::create_connection, services::doi_entry::DoiEntryService,
};
use log::info;
use migration::{apply_pending, migration_status};
use models::{DoiEntry, DoiEntryDraft, render_bibliography};
use sea_orm::{DatabaseConnection, DbErr};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(Parser)]
#[command(name = "bibdb", version)]
#[command(about = "Bibliography database manager", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    database_url: Option<String>,

    /// Schema to use instead of the connection's default search path
    #[arg(long, env = "DATABASE_SCHEMA", global = true)]
    schema: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Show every migration and whether it has been applied
    Status,
    /// Add an entry from a JSON file
    Add { file: PathBuf },
    /// Replace every field of an entry with the contents of a JSON file
    Edit { cite_key: String, file: PathBuf },
    /// Print an entry as JSON
    Show { cite_key: String },
    /// List the citation key and title of every entry
    List,
    /// Find entries matching a search query
    Search { query: String },
    /// Delete an entry
    Delete { cite_key: String },
    /// Write every entry to a BibLaTeX file
    Export { file: PathBuf },
}

impl Cli {
    /// Settings from the environment, with command-line flags taking precedence
    fn settings(&self) -> Result<DatabaseSettings> {
        let settings = DatabaseSettings::from_env(|var| match var {
            "DATABASE_URL" => self.database_url.clone(),
            "DATABASE_SCHEMA" => self.schema.clone(),
            _ => None,
        })?;

        Ok(settings)
    }
}

async fn connect(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    create_connection(settings)
        .await
        .context("failed to connect to the database")
}

/// Connects and brings the schema up to date before touching entries
async fn open_store(settings: &DatabaseSettings) -> Result<DatabaseConnection> {
    let db = connect(settings).await?;
    apply_pending(&db).await?;

    Ok(db)
}

fn read_entry(path: &Path) -> Result<DoiEntry> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let draft = DoiEntryDraft::from_json(&json)
        .with_context(|| format!("{} does not hold a JSON entry", path.display()))?;

    DoiEntry::try_from(draft).with_context(|| format!("{} is incomplete", path.display()))
}

/// Reads the new contents of `cite_key`, which must keep its citation key
fn read_replacement(cite_key: &str, path: &Path) -> Result<DoiEntry> {
    let entry = read_entry(path)?;
    if entry.cite_key != cite_key {
        bail!(
            "{} holds citation key `{}`, expected `{cite_key}`",
            path.display(),
            entry.cite_key
        );
    }

    Ok(entry)
}

fn print_summary(entries: &[DoiEntry]) {
    for entry in entries {
        println!("{}\t{}", entry.cite_key, entry.title);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    // Validate input files before any connection is made
    let entry = match &cli.command {
        Commands::Add { file } => Some(read_entry(file)?),
        Commands::Edit { cite_key, file } => Some(read_replacement(cite_key, file)?),
        _ => None,
    };

    let settings = cli.settings()?;

    match cli.command {
        Commands::Migrate => {
            let db = connect(&settings).await?;
            let applied = apply_pending(&db).await?;

            if applied.is_empty() {
                println!("Database schema is up to date");
            }
            for name in applied {
                println!("Applied {name}");
            }
        }
        Commands::Status => {
            let db = connect(&settings).await?;
            for state in migration_status(&db).await? {
                println!("{:<40} {}", state.name, state.status);
            }
        }
        Commands::Add { .. } => {
            let db = open_store(&settings).await?;
            let Some(entry) = entry else {
                bail!("no entry to add");
            };

            let entry = DoiEntryService::insert(&db, entry)
                .await
                .context("failed to add entry")?;
            println!("Added {}", entry.cite_key);
        }
        Commands::Edit { cite_key, .. } => {
            let db = open_store(&settings).await?;
            let Some(entry) = entry else {
                bail!("no entry to write");
            };

            match DoiEntryService::update(&db, entry).await {
                Ok(entry) => println!("Updated {}", entry.cite_key),
                Err(DbErr::RecordNotUpdated) => {
                    bail!("no entry with citation key `{cite_key}`")
                }
                Err(err) => return Err(err).context("failed to update entry"),
            }
        }
        Commands::Show { cite_key } => {
            let db = open_store(&settings).await?;
            match DoiEntryService::find(&db, &cite_key).await? {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                None => bail!("no entry with citation key `{cite_key}`"),
            }
        }
        Commands::List => {
            let db = open_store(&settings).await?;
            print_summary(&DoiEntryService::list(&db).await?);
        }
        Commands::Search { query } => {
            let db = open_store(&settings).await?;
            let entries = DoiEntryService::search(&db, &query).await?;
            info!("Found {} entries matching '{query}'", entries.len());
            print_summary(&entries);
        }
        Commands::Delete { cite_key } => {
            let db = open_store(&settings).await?;
            if !DoiEntryService::delete(&db, &cite_key).await? {
                bail!("no entry with citation key `{cite_key}`");
            }
            println!("Deleted {cite_key}");
        }
        Commands::Export { file } => {
            let db = open_store(&settings).await?;
            let entries = DoiEntryService::list(&db).await?;

            let mut bibliography = render_bibliography(&entries);
            if !bibliography.is_empty() {
                bibliography.push('\n');
            }
            fs::write(&file, bibliography)
                .with_context(|| format!("failed to write {}", file.display()))?;
            println!("Exported {} entries to {}", entries.len(), file.display());
        }
    }

    Ok(())
}
