use thiserror::Error;

/// Errors that can occur while extracting codeflow models.
#[derive(Error, Debug)]
pub enum CodeflowError {
    #[error("parse error: {message} (line: {line:?})")]
    Parse { message: String, line: Option<u32> },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results using `CodeflowError`.
pub type Result<T> = std::result::Result<T, CodeflowError>;
