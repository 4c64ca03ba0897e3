/// Failures surfaced by the core. Callers log the detail and present every
/// variant the same way (see [`Error::public_message`]).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed content: {0}")]
    MalformedContent(String),

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Error::NotFound(what.to_string())
    }

    /// The text shown to users, whatever went wrong.
    pub fn public_message(&self) -> &'static str {
        "Not Found"
    }
}
