use std::path::PathBuf;

use anyhow::{Context, Result};

use convey_types::api::DEFAULT_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    /// Page size used when a listing command is given no `--limit`.
    pub default_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let db_path = lookup("CONVEY_DB_PATH").unwrap_or_else(|| "convey.db".into());
        let default_limit = match lookup("CONVEY_DEFAULT_LIMIT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("CONVEY_DEFAULT_LIMIT is not a number: {}", raw))?,
            None => DEFAULT_LIMIT,
        };

        Ok(Self {
            db_path: PathBuf::from(db_path),
            default_limit,
        })
    }
}
