use thiserror::Error;

/// Errors that can occur during analysis and tool handling.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("unsupported language for '{path}'")]
    UnsupportedLanguage { path: String },

    #[error("parse failed: {message} (path: {path})")]
    ParseFailed { message: String, path: String },

    #[error("walk error: {message} (path: {path})")]
    Walk { message: String, path: String },

    #[error("import '{import}' escapes the project: {reason}")]
    ImportEscapesProject { import: String, reason: String },

    #[error("bad glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("git analysis failed: {message}")]
    Git { message: String },

    #[error("not found: {what}")]
    NotFound { what: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Convenience alias for results using `AnalyzerError`.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
