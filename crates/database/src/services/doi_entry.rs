use crate::entities::doi_entries;
use log::debug;
use models::{DoiEntry, SearchVector};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Statement, prelude::Expr,
};

pub struct DoiEntryService;

impl DoiEntryService {
    /// Stores a new entry with all of its stored columns
    ///
    /// # Returns
    /// The row as persisted, or an error if the citation key is already taken
    pub async fn insert(db: &DatabaseConnection, entry: DoiEntry) -> Result<DoiEntry, DbErr> {
        let model = doi_entries::ActiveModel::from(entry).insert(db).await?;
        debug!("Inserted entry '{}'", model.cite_key);

        Ok(model.into())
    }

    /// Looks up a single entry by citation key
    pub async fn find(db: &DatabaseConnection, cite_key: &str) -> Result<Option<DoiEntry>, DbErr> {
        let model = doi_entries::Entity::find_by_id(cite_key.to_string())
            .one(db)
            .await?;

        Ok(model.map(Into::into))
    }

    /// Lists every entry ordered by citation key
    pub async fn list(db: &DatabaseConnection) -> Result<Vec<DoiEntry>, DbErr> {
        let models = doi_entries::Entity::find()
            .order_by_asc(doi_entries::Column::CiteKey)
            .all(db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Rewrites every stored column of the entry with the same citation key
    ///
    /// Fails with [`DbErr::RecordNotUpdated`] if no such entry exists.
    pub async fn update(db: &DatabaseConnection, entry: DoiEntry) -> Result<DoiEntry, DbErr> {
        let model = doi_entries::Entity::update(doi_entries::ActiveModel::from(entry))
            .exec(db)
            .await?;
        debug!("Updated entry '{}'", model.cite_key);

        Ok(model.into())
    }

    /// Deletes an entry, returning whether one was removed
    pub async fn delete(db: &DatabaseConnection, cite_key: &str) -> Result<bool, DbErr> {
        let result = doi_entries::Entity::delete_by_id(cite_key.to_string())
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Finds entries whose search vector matches a web-style search query
    ///
    /// Uses the `simple` configuration, the same one that builds the
    /// `search` column. Results are ordered by citation key, not ranked.
    pub async fn search(db: &DatabaseConnection, query: &str) -> Result<Vec<DoiEntry>, DbErr> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let models = doi_entries::Entity::find()
            .filter(Expr::cust_with_expr(
                "doi_entries.search @@ websearch_to_tsquery('simple', $1)",
                query,
            ))
            .order_by_asc(doi_entries::Column::CiteKey)
            .all(db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    /// Reads the generated search vector of an entry
    pub async fn search_vector(
        db: &DatabaseConnection,
        cite_key: &str,
    ) -> Result<Option<SearchVector>, DbErr> {
        let stmt = Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT search::text AS search FROM doi_entries WHERE cite_key = $1",
            [cite_key.into()],
        );

        let Some(row) = db.query_one(stmt).await? else {
            return Ok(None);
        };

        let text: String = row.try_get("", "search")?;
        text.parse::<SearchVector>()
            .map(Some)
            .map_err(|err| DbErr::Type(err.to_string()))
    }
}
