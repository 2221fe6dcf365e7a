use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a record cannot become a [`DoiEntry`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("citation key must not be blank")]
    BlankCiteKey,
}

/// A complete bibliographic record, one row of `doi_entries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoiEntry {
    /// Citation key, the natural primary key
    pub cite_key: String,
    /// Entry type, e.g. `article` or `book`
    pub bib_type: String,
    pub doi: String,
    pub url: String,
    /// Free-text author list
    pub author: String,
    pub title: String,
    pub journal: String,
    pub publisher: String,
    pub volume: i32,
    pub number: i32,
    pub month: String,
    pub year: i32,
}

/// A record as supplied by a caller, where any field may be absent
///
/// Partial records are never stored; convert with [`DoiEntry::try_from`]
/// first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoiEntryDraft {
    pub cite_key: Option<String>,
    pub bib_type: Option<String>,
    pub doi: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub journal: Option<String>,
    pub publisher: Option<String>,
    pub volume: Option<i32>,
    pub number: Option<i32>,
    pub month: Option<String>,
    pub year: Option<i32>,
}

impl DoiEntryDraft {
    /// Parses a draft from a JSON object
    ///
    /// # Arguments
    /// * `json` - JSON text holding a single record
    ///
    /// # Returns
    /// The draft, with absent keys left as `None`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn require<T>(value: Option<T>, field: &'static str) -> Result<T, EntryError> {
    value.ok_or(EntryError::MissingField(field))
}

impl TryFrom<DoiEntryDraft> for DoiEntry {
    type Error = EntryError;

    fn try_from(draft: DoiEntryDraft) -> Result<Self, Self::Error> {
        let cite_key = require(draft.cite_key, "cite_key")?;
        if cite_key.trim().is_empty() {
            return Err(EntryError::BlankCiteKey);
        }

        Ok(Self {
            cite_key,
            bib_type: require(draft.bib_type, "bib_type")?,
            doi: require(draft.doi, "doi")?,
            url: require(draft.url, "url")?,
            author: require(draft.author, "author")?,
            title: require(draft.title, "title")?,
            journal: require(draft.journal, "journal")?,
            publisher: require(draft.publisher, "publisher")?,
            volume: require(draft.volume, "volume")?,
            number: require(draft.number, "number")?,
            month: require(draft.month, "month")?,
            year: require(draft.year, "year")?,
        })
    }
}

impl From<DoiEntry> for DoiEntryDraft {
    fn from(entry: DoiEntry) -> Self {
        Self {
            cite_key: Some(entry.cite_key),
            bib_type: Some(entry.bib_type),
            doi: Some(entry.doi),
            url: Some(entry.url),
            author: Some(entry.author),
            title: Some(entry.title),
            journal: Some(entry.journal),
            publisher: Some(entry.publisher),
            volume: Some(entry.volume),
            number: Some(entry.number),
            month: Some(entry.month),
            year: Some(entry.year),
        }
    }
}
