//! Connection settings for the CouchDB document store.

use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "quiz_show";

/// Where the key-value documents live and how to authenticate.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    pub base_url: String,
    pub database: String,
    /// Basic-auth username and password.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read `COUCH_BASE_URL` and `COUCH_DB`, falling back to a local server.
    ///
    /// Basic auth is used only when both `COUCH_USERNAME` and `COUCH_PASSWORD` are set.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            base_url: non_empty("COUCH_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            database: non_empty("COUCH_DB").unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            credentials: non_empty("COUCH_USERNAME").zip(non_empty("COUCH_PASSWORD")),
        }
    }
}
