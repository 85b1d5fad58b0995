use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use log::{info, warn};

use super::SharedState;
use crate::error::AppError;
use crate::models::{MessageResponse, SubmitRequest};
use crate::voting;

pub async fn submit(
    State(state): State<SharedState>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Rejected submit body: {}", rejection.body_text());
        AppError::MalformedPayload
    })?;

    match voting::submit_vote(state.catalog, state.ledger.as_ref(), request).await {
        Ok(_) => Ok(Json(MessageResponse::new("Thanks for voting!"))),
        Err(AppError::DuplicateVote) => {
            info!("Ignored repeat vote from an already recorded device");
            Err(AppError::DuplicateVote)
        }
        Err(e) => Err(e),
    }
}
