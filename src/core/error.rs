use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Could not collapse input for `{field}` using key `{key}`")]
    Collapse { field: String, key: String },

    #[error("Identity error: {0}")]
    Identity(String),

    #[error("State error: {0}")]
    State(String),

    #[error("Invalid getter input: {0}")]
    Query(String),

    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for StoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::State(err.to_string())
    }
}
