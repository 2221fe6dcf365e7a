use std::env;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` must be set")]
    Missing(&'static str),
    #[error("environment variable `{var}` has invalid value `{value}`")]
    Invalid { var: &'static str, value: String },
}

/// Connection settings for the bibliography database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Postgres connection string
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Schema placed first on the `search_path`, if any
    pub schema: Option<String>,
}

impl DatabaseSettings {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: Self::DEFAULT_MAX_CONNECTIONS,
            schema: None,
        }
    }

    /// Reads settings from the environment, loading `.env` first if present
    ///
    /// * `DATABASE_URL` - required
    /// * `DATABASE_MAX_CONNECTIONS` - positive integer, defaults to 5
    /// * `DATABASE_SCHEMA` - optional
    ///
    /// `overrides` is consulted before the environment, e.g. for values
    /// given on the command line.
    pub fn from_env(overrides: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| overrides(var).or_else(|| env::var(var).ok()))
    }

    /// Builds settings from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            None => Self::DEFAULT_MAX_CONNECTIONS,
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "DATABASE_MAX_CONNECTIONS",
                        value,
                    });
                }
            },
        };

        let schema = lookup("DATABASE_SCHEMA").filter(|schema| !schema.trim().is_empty());

        Ok(Self {
            url,
            max_connections,
            schema,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings =
            DatabaseSettings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/bib")]))
                .unwrap();
        assert_eq!(settings, DatabaseSettings::new("postgres://localhost/bib"));
    }

    #[test]
    fn test_all_variables() {
        let settings = DatabaseSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/bib"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("DATABASE_SCHEMA", "library"),
        ]))
        .unwrap();
        assert_eq!(settings.max_connections, 12);
        assert_eq!(settings.schema.as_deref(), Some("library"));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let settings = DatabaseSettings::from_env(|var| match var {
            "DATABASE_URL" => Some("postgres://override/bib".to_string()),
            "DATABASE_SCHEMA" => Some("override".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(settings.url, "postgres://override/bib");
        assert_eq!(settings.schema.as_deref(), Some("override"));
    }

    #[test]
    fn test_missing_url() {
        assert_eq!(
            DatabaseSettings::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
        assert_eq!(
            DatabaseSettings::from_lookup(lookup(&[("DATABASE_URL", "  ")])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn test_invalid_max_connections() {
        for value in ["0", "many", "-1"] {
            let result = DatabaseSettings::from_lookup(lookup(&[
                ("DATABASE_URL", "postgres://localhost/bib"),
                ("DATABASE_MAX_CONNECTIONS", value),
            ]));
            assert_eq!(
                result,
                Err(ConfigError::Invalid {
                    var: "DATABASE_MAX_CONNECTIONS",
                    value: value.to_string(),
                })
            );
        }
    }
}
