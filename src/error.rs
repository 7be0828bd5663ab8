use std::path::PathBuf;
use thiserror::Error;

/// Catalog error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    ConfigValidation(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Failed to load specification {path}: {message}")]
    SpecParse { path: PathBuf, message: String },

    #[error("Application {0} is defined more than once")]
    DuplicateApplication(String),

    #[error("Failed to render {target}: {message}")]
    Render { target: String, message: String },

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a config validation error
    pub fn config_validation(msg: impl Into<String>) -> Self {
        Error::ConfigValidation(msg.into())
    }

    /// Create a specification load error
    pub fn spec_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::SpecParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a rendering error for the named diagram target
    pub fn render(target: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Render {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}
