use std::env;

use super::error::{CouchDaoError, CouchResult};

const DEFAULT_DATABASE: &str = "pattern_arena";

/// Where the CouchDB arena database lives and how to authenticate.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    /// Basic-auth user and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Anonymous access to `database` on the server at `base_url`.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
        }
    }

    /// Configuration from `COUCH_BASE_URL` (required), `COUCH_DB`, and the
    /// `COUCH_USERNAME` / `COUCH_PASSWORD` pair when both are set.
    pub fn from_env() -> CouchResult<Self> {
        let Ok(base_url) = env::var("COUCH_BASE_URL") else {
            return Err(CouchDaoError::MissingEnvVar {
                var: "COUCH_BASE_URL",
            });
        };
        let database = env::var("COUCH_DB").unwrap_or_else(|_| DEFAULT_DATABASE.to_owned());

        let mut config = Self::new(base_url, database);
        if let (Ok(user), Ok(password)) = (env::var("COUCH_USERNAME"), env::var("COUCH_PASSWORD")) {
            config.credentials = Some((user, password));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_is_anonymous() {
        let config = CouchConfig::new("http://localhost:5984/", "arenas");
        assert_eq!(config.database, "arenas");
        assert!(config.credentials.is_none());
    }
}
