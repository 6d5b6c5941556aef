use thiserror::Error;

#[derive(Debug, Error)]
pub enum BriefError {
    #[error("unknown flow: {0}")]
    UnknownFlow(String),

    #[error("unknown field path: {0}")]
    UnknownPath(String),

    #[error("value not usable for field path '{path}': expected {expected}")]
    PathValue { path: String, expected: &'static str },

    #[error("home directory not found: set HOME environment variable")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, BriefError>;
