use std::path::PathBuf;

/// Runtime settings, read from the environment (and `.env` if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_filter: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            db_path: lookup("WARBLER_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("warbler.db")),
            log_filter: lookup("RUST_LOG").unwrap_or_else(|| "warbler=debug".into()),
        }
    }
}
