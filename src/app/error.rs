use thiserror::Error;

use crate::api::ApiError;

#[derive(Error, Debug)]
pub enum KioskError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Article not found: {0}")]
    ArticleNotFound(i64),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, KioskError>;
