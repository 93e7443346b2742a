use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("theme '{0}' already exists")]
    ThemeExists(String),

    #[error("theme '{0}' not found")]
    ThemeNotFound(String),

    #[error("question '{0}' not found")]
    QuestionNotFound(String),

    #[error("invalid question id: {0}")]
    InvalidId(String),

    #[error("correct answer '{0}' is not one of the options")]
    AnswerNotInOptions(String),

    #[error("admin privileges required")]
    Unauthorized,

    #[error("{operation} cascade could not be confirmed: {message}")]
    CascadeIncomplete {
        operation: &'static str,
        message: String,
    },

    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
