//! Error types for the YeniWatch scraper
//!
//! [`ExtractError`] classifies what can go wrong while turning pages into
//! records. [`AppError`] unifies everything the API can fail with and
//! converts it to an HTTP response with a consistent JSON structure.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiError;
use crate::scraper::ScraperError;

/// Failure of a single extraction step
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    /// Network or HTTP failure while fetching a page
    #[error("transport error: {0}")]
    Transport(#[from] ScraperError),

    /// Expected structure absent (heading, container, script block, pattern)
    #[error("expected structure not found: {0}")]
    ParseMiss(String),

    /// A structured response could not be decoded or lacks a required field
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A link that does not form a valid absolute URL
    #[error("invalid reference: {0}")]
    InvalidReference(String),
}

impl ExtractError {
    pub fn parse_miss(what: impl Into<String>) -> Self {
        ExtractError::ParseMiss(what.into())
    }

    pub fn malformed(what: impl Into<String>) -> Self {
        ExtractError::MalformedResponse(what.into())
    }
}

/// Application-wide error type that unifies all error sources
#[derive(Debug, Error)]
pub enum AppError {
    /// Failure to fetch or read the primary page of a request
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Validation errors (bad request)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found errors
    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<ScraperError> for AppError {
    fn from(err: ScraperError) -> Self {
        AppError::Extraction(ExtractError::Transport(err))
    }
}

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // The upstream site answered 404 for the requested page
            AppError::Extraction(ExtractError::Transport(ScraperError::HttpError(404))) => {
                StatusCode::NOT_FOUND
            }
            AppError::Extraction(ExtractError::Transport(_)) => StatusCode::BAD_GATEWAY,
            AppError::Extraction(ExtractError::InvalidReference(_)) => StatusCode::BAD_REQUEST,
            AppError::Extraction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),

            AppError::Extraction(err) => match err {
                ExtractError::Transport(ScraperError::NetworkError(msg)) => {
                    format!("Failed to connect to server: {}", msg)
                }
                ExtractError::Transport(ScraperError::HttpError(status)) => {
                    format!("Server returned error status: {}", status)
                }
                ExtractError::Transport(ScraperError::ResponseError(msg)) => {
                    format!("Failed to read response: {}", msg)
                }
                ExtractError::Transport(ScraperError::RateLimited) => {
                    "Server is rate limiting requests, please try again later".to_string()
                }
                ExtractError::InvalidReference(reference) => {
                    format!("Invalid page reference: {}", reference)
                }
                ExtractError::ParseMiss(_) | ExtractError::MalformedResponse(_) => {
                    "Unexpected page structure".to_string()
                }
            },
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error_response = ApiError::new(self.user_message());

        HttpResponse::build(status).json(error_response)
    }
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;
