use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::models::MessageResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid deviceId")]
    InvalidDevice,

    #[error("You already voted on this device. Thank you!")]
    DuplicateVote,

    #[error("Invalid {0} selection")]
    InvalidSelection(&'static str),

    #[error("Please enter your custom tagline")]
    MissingCustomText,

    #[error("Custom tagline is too long")]
    CustomTextTooLong,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Poll not found")]
    PollNotFound,

    #[error("Malformed payload")]
    MalformedPayload,

    #[error("Storage error: {0}")]
    Storage(#[source] LedgerError),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::DuplicateDevice => AppError::DuplicateVote,
            other => AppError::Storage(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidDevice
            | AppError::InvalidSelection(_)
            | AppError::MissingCustomText
            | AppError::CustomTextTooLong
            | AppError::MalformedPayload => StatusCode::BAD_REQUEST,
            AppError::DuplicateVote => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PollNotFound => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Storage(err) => {
                error!("Request failed on storage: {}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
