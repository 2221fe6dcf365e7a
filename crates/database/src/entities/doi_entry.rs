use models::DoiEntry;
use sea_orm::{ActiveValue::Set, entity::prelude::*};
use serde::{Deserialize, Serialize};

/// Stored columns of `doi_entries`
///
/// The generated `search` column is not mapped, so it is never part of an
/// insert or update issued through this entity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "doi_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub cite_key: String,
    #[sea_orm(column_type = "Text")]
    pub bib_type: String,
    #[sea_orm(column_type = "Text")]
    pub doi: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text")]
    pub author: String,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub journal: String,
    #[sea_orm(column_type = "Text")]
    pub publisher: String,
    pub volume: i32,
    pub number: i32,
    #[sea_orm(column_type = "Text")]
    pub month: String,
    pub year: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DoiEntry {
    fn from(model: Model) -> Self {
        Self {
            cite_key: model.cite_key,
            bib_type: model.bib_type,
            doi: model.doi,
            url: model.url,
            author: model.author,
            title: model.title,
            journal: model.journal,
            publisher: model.publisher,
            volume: model.volume,
            number: model.number,
            month: model.month,
            year: model.year,
        }
    }
}

/// Sets every stored column, as required for full-column writes
impl From<DoiEntry> for ActiveModel {
    fn from(entry: DoiEntry) -> Self {
        Self {
            cite_key: Set(entry.cite_key),
            bib_type: Set(entry.bib_type),
            doi: Set(entry.doi),
            url: Set(entry.url),
            author: Set(entry.author),
            title: Set(entry.title),
            journal: Set(entry.journal),
            publisher: Set(entry.publisher),
            volume: Set(entry.volume),
            number: Set(entry.number),
            month: Set(entry.month),
            year: Set(entry.year),
        }
    }
}
