//! Read-only introspection of the live schema, used by the migration checks.
//!
//! All lookups are scoped to `current_schema()`, so a connection whose
//! `search_path` points at another schema sees only that schema.

use sea_orm_migration::{
    prelude::*,
    sea_orm::{ConnectionTrait, Statement},
};
use std::fmt::{Display, Formatter, Result as FmtResult};

pub const DOI_ENTRIES: &str = "doi_entries";
pub const SEARCH_COLUMN: &str = "search";
pub const SEARCH_INDEX: &str = "idx_doi_entries_search";
pub const PRIMARY_KEY: [&str; 1] = ["cite_key"];

/// The twelve stored columns of `doi_entries` with their `information_schema` types
pub const BASE_COLUMNS: [(&str, &str); 12] = [
    ("cite_key", "text"),
    ("bib_type", "text"),
    ("doi", "text"),
    ("url", "text"),
    ("author", "text"),
    ("title", "text"),
    ("journal", "text"),
    ("publisher", "text"),
    ("volume", "integer"),
    ("number", "integer"),
    ("month", "text"),
    ("year", "integer"),
];

/// Columns the generated `search` column is computed from
pub const SEARCH_SOURCE_COLUMNS: [&str; 4] = ["title", "author", "journal", "publisher"];

/// A column as reported by `information_schema.columns`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnShape {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Kind of schema object that owns a name, as recorded in `pg_class` or `pg_type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Table,
    PartitionedTable,
    View,
    MaterializedView,
    Sequence,
    Index,
    ForeignTable,
    CompositeType,
    /// A non-relation type (enum, domain, range, ...) that still blocks the row type of a new table
    Type,
    Other(String),
}

impl ObjectKind {
    /// Maps a `pg_class.relkind` code
    pub fn from_relkind(relkind: &str) -> Self {
        match relkind {
            "r" => Self::Table,
            "p" => Self::PartitionedTable,
            "v" => Self::View,
            "m" => Self::MaterializedView,
            "S" => Self::Sequence,
            "i" | "I" => Self::Index,
            "f" => Self::ForeignTable,
            "c" => Self::CompositeType,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether rows can be stored in it the way `CREATE TABLE` would allow
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table | Self::PartitionedTable)
    }
}

impl Display for ObjectKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Table => write!(f, "TABLE"),
            Self::PartitionedTable => write!(f, "PARTITIONED TABLE"),
            Self::View => write!(f, "VIEW"),
            Self::MaterializedView => write!(f, "MATERIALIZED VIEW"),
            Self::Sequence => write!(f, "SEQUENCE"),
            Self::Index => write!(f, "INDEX"),
            Self::ForeignTable => write!(f, "FOREIGN TABLE"),
            Self::CompositeType => write!(f, "COMPOSITE TYPE"),
            Self::Type => write!(f, "TYPE"),
            Self::Other(relkind) => write!(f, "relation of kind '{relkind}'"),
        }
    }
}

/// Finds whatever object already uses `name` in the current schema
///
/// Relations are looked up in `pg_class`, which also covers materialized
/// views, sequences and composite types missing from `information_schema.tables`.
/// Standalone types are looked up in `pg_type`, since a table's row type
/// shares their namespace.
pub async fn object_kind(manager: &SchemaManager<'_>, name: &str) -> Result<Option<ObjectKind>, DbErr> {
    let backend = manager.get_database_backend();
    let db = manager.get_connection();

    let relation = Statement::from_sql_and_values(
        backend,
        "SELECT c.relkind::text AS relkind FROM pg_class c
         JOIN pg_namespace n ON n.oid = c.relnamespace
         WHERE n.nspname = current_schema() AND c.relname = $1",
        [name.into()],
    );
    if let Some(row) = db.query_one(relation).await? {
        let relkind: String = row.try_get("", "relkind")?;
        return Ok(Some(ObjectKind::from_relkind(&relkind)));
    }

    let standalone_type = Statement::from_sql_and_values(
        backend,
        "SELECT 1 AS found FROM pg_type t
         JOIN pg_namespace n ON n.oid = t.typnamespace
         WHERE n.nspname = current_schema() AND t.typname = $1 AND t.typrelid = 0",
        [name.into()],
    );
    Ok(db.query_one(standalone_type).await?.map(|_| ObjectKind::Type))
}

/// Lists the columns of a table in ordinal order, empty if the table does not exist
pub async fn columns(manager: &SchemaManager<'_>, table: &str) -> Result<Vec<ColumnShape>, DbErr> {
    let stmt = Statement::from_sql_and_values(
        manager.get_database_backend(),
        "SELECT column_name, data_type, is_nullable FROM information_schema.columns
         WHERE table_schema = current_schema() AND table_name = $1
         ORDER BY ordinal_position",
        [table.into()],
    );

    manager
        .get_connection()
        .query_all(stmt)
        .await?
        .into_iter()
        .map(|row| -> Result<ColumnShape, DbErr> {
            Ok(ColumnShape {
                name: row.try_get("", "column_name")?,
                data_type: row.try_get("", "data_type")?,
                nullable: row.try_get::<String>("", "is_nullable")? == "YES",
            })
        })
        .collect()
}

/// Returns the table an index belongs to, or `None` if no index has that name
///
/// Index names share one namespace per schema, so this does not filter by table.
pub async fn index_table(manager: &SchemaManager<'_>, index: &str) -> Result<Option<String>, DbErr> {
    let stmt = Statement::from_sql_and_values(
        manager.get_database_backend(),
        "SELECT tablename FROM pg_indexes
         WHERE schemaname = current_schema() AND indexname = $1",
        [index.into()],
    );

    manager
        .get_connection()
        .query_one(stmt)
        .await?
        .map(|row| row.try_get::<String>("", "tablename"))
        .transpose()
}

/// Columns of the table's primary key, sorted by name; empty when it has none
pub async fn primary_key(manager: &SchemaManager<'_>, table: &str) -> Result<Vec<String>, DbErr> {
    let stmt = Statement::from_sql_and_values(
        manager.get_database_backend(),
        "SELECT a.attname::text AS column_name FROM pg_index i
         JOIN pg_class c ON c.oid = i.indrelid
         JOIN pg_namespace n ON n.oid = c.relnamespace
         JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey)
         WHERE n.nspname = current_schema() AND c.relname = $1 AND i.indisprimary
         ORDER BY a.attname",
        [table.into()],
    );

    manager
        .get_connection()
        .query_all(stmt)
        .await?
        .into_iter()
        .map(|row| row.try_get::<String>("", "column_name"))
        .collect()
}

/// Describes how an existing primary key differs from the expected one, if it does
pub fn primary_key_mismatch(existing: &[String], expected: &[&str]) -> Option<String> {
    let mut wanted: Vec<&str> = expected.to_vec();
    wanted.sort_unstable();

    if existing.is_empty() {
        return Some(format!("has no primary key on ({})", wanted.join(", ")));
    }
    if existing.iter().map(String::as_str).eq(wanted.iter().copied()) {
        return None;
    }

    Some(format!(
        "primary key is ({}) instead of ({})",
        existing.join(", "),
        wanted.join(", ")
    ))
}

/// Describes every way `existing` fails to provide the expected columns
///
/// Expected columns must be present, have the given type and be `NOT NULL`.
/// Columns beyond the expected ones are ignored.
pub fn column_mismatches(existing: &[ColumnShape], expected: &[(&str, &str)]) -> Vec<String> {
    expected
        .iter()
        .filter_map(|&(name, data_type)| {
            match existing.iter().find(|column| column.name == name) {
                None => Some(format!("column `{name}` is missing")),
                Some(column) if column.data_type != data_type => Some(format!(
                    "column `{name}` is {} instead of {data_type}",
                    column.data_type
                )),
                Some(column) if column.nullable => {
                    Some(format!("column `{name}` allows NULL"))
                }
                Some(_) => None,
            }
        })
        .collect()
}

/// Names from `required` that do not appear in `existing`
pub fn missing_columns(existing: &[ColumnShape], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !existing.iter().any(|column| column.name == **name))
        .map(|name| String::from(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str, nullable: bool) -> ColumnShape {
        ColumnShape {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
        }
    }

    fn base_table() -> Vec<ColumnShape> {
        BASE_COLUMNS
            .iter()
            .map(|(name, data_type)| column(name, data_type, false))
            .collect()
    }

    #[test]
    fn test_matching_table_has_no_mismatches() {
        assert!(column_mismatches(&base_table(), &BASE_COLUMNS).is_empty());
    }

    #[test]
    fn test_extra_columns_are_tolerated() {
        let mut columns = base_table();
        columns.push(column("search", "tsvector", true));
        assert!(column_mismatches(&columns, &BASE_COLUMNS).is_empty());
    }

    #[test]
    fn test_mismatches_are_reported() {
        let mut columns = base_table();
        columns.retain(|c| c.name != "doi");
        columns[0] = column("cite_key", "integer", false);
        columns[1].nullable = true;

        assert_eq!(
            column_mismatches(&columns, &BASE_COLUMNS),
            vec![
                "column `cite_key` is integer instead of text".to_string(),
                "column `bib_type` allows NULL".to_string(),
                "column `doi` is missing".to_string(),
            ]
        );
    }

    #[test]
    fn test_primary_key_mismatch() {
        assert_eq!(primary_key_mismatch(&["cite_key".to_string()], &PRIMARY_KEY), None);
        assert_eq!(
            primary_key_mismatch(&[], &PRIMARY_KEY),
            Some("has no primary key on (cite_key)".to_string())
        );
        assert_eq!(
            primary_key_mismatch(&["cite_key".to_string(), "doi".to_string()], &PRIMARY_KEY),
            Some("primary key is (cite_key, doi) instead of (cite_key)".to_string())
        );
    }

    #[test]
    fn test_object_kinds() {
        assert!(ObjectKind::from_relkind("r").is_table());
        assert!(ObjectKind::from_relkind("p").is_table());
        for relkind in ["v", "m", "S", "i", "f", "c"] {
            assert!(!ObjectKind::from_relkind(relkind).is_table(), "{relkind}");
        }
        assert!(!ObjectKind::Type.is_table());

        assert_eq!(ObjectKind::from_relkind("v").to_string(), "VIEW");
        assert_eq!(ObjectKind::from_relkind("m").to_string(), "MATERIALIZED VIEW");
        assert_eq!(ObjectKind::from_relkind("x").to_string(), "relation of kind 'x'");
    }

    #[test]
    fn test_missing_columns() {
        let columns = vec![column("title", "text", false), column("journal", "text", false)];
        assert_eq!(
            missing_columns(&columns, &SEARCH_SOURCE_COLUMNS),
            vec!["author".to_string(), "publisher".to_string()]
        );
        assert_eq!(missing_columns(&[], &SEARCH_SOURCE_COLUMNS).len(), 4);
    }
}
