use axum::http::StatusCode;
use thiserror::Error;

use crate::{doc_loader::DocLoaderError, llm::LlmError, resolver::ResolveError};

/// Message returned to callers for every failure that is not their fault.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to process the request";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),
    #[error("Missing form field: {0}")]
    MissingField(String),
    #[error("Configuration Error: {0}")]
    Config(String),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Document Loading Error: {0}")]
    DocLoader(#[from] DocLoaderError),
    #[error("Language Model Error: {0}")]
    Llm(#[from] LlmError),
    #[error("Multipart Error: {0}")]
    Multipart(String),
    #[error("Invalid form: {0}")]
    InvalidForm(String),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

impl ServerError {
    /// Recognized caller mistakes surface with their own message and a 400.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::Resolve(ResolveError::ComparisonUnavailable { .. })
                | ServerError::MissingField(_)
                | ServerError::InvalidForm(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// The message that is safe to show to the caller.
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }
}
