use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DATABASE: &str = "trivia_rooms";

/// Connection settings for the CouchDB room store.
#[derive(Debug, Clone)]
pub struct CouchConfig {
    /// Base URL of the CouchDB server.
    pub base_url: String,
    /// Database holding the room documents.
    pub database: String,
    /// Optional basic-auth credentials.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Read the connection settings from the environment, falling back to a
    /// local single-node default.
    pub fn from_env() -> Self {
        let base_url = env::var("COUCH_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let database = env::var("COUCH_DB").unwrap_or_else(|_| DEFAULT_DATABASE.into());
        let credentials = env::var("COUCH_USERNAME")
            .ok()
            .zip(env::var("COUCH_PASSWORD").ok());

        Self {
            base_url,
            database,
            credentials,
        }
    }
}
