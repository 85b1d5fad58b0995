mod vote;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use log::{info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::catalog::PollCatalog;
use crate::error::AppError;
use crate::ledger::Ledger;
use crate::models::{AdminResults, Poll};
use crate::voting::tally;

pub struct AppState {
    pub catalog: &'static PollCatalog,
    pub ledger: Arc<dyn Ledger>,
    pub admin_key: String,
}

pub type SharedState = Arc<AppState>;

pub fn router(state: SharedState, frontend_url: &str) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/polls/:poll_id", get(get_poll))
        .route("/api/submit", post(vote::submit))
        .route("/api/admin/results", get(admin_results))
        .layer(cors_layer(frontend_url))
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if frontend_url == "*" {
        return layer.allow_origin(Any);
    }

    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!(
                "FRONTEND_URL {:?} is not a valid origin ({}), allowing any origin",
                frontend_url, e
            );
            layer.allow_origin(Any)
        }
    }
}

async fn health() -> &'static str {
    "CHAAT Poll API is running"
}

async fn get_poll(
    State(state): State<SharedState>,
    Path(poll_id): Path<String>,
) -> Result<Json<Poll>, AppError> {
    state
        .catalog
        .get(&poll_id)
        .cloned()
        .map(Json)
        .ok_or(AppError::PollNotFound)
}

#[derive(Debug, Deserialize)]
struct AdminQuery {
    key: Option<String>,
}

async fn admin_results(
    State(state): State<SharedState>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<AdminResults>, AppError> {
    let result = tally::admin_results(
        state.catalog,
        state.ledger.as_ref(),
        &state.admin_key,
        query.key.as_deref(),
    )
    .await;

    match result {
        Ok(results) => {
            info!("Served admin results ({} submissions)", results.total_submissions);
            Ok(Json(results))
        }
        Err(AppError::Unauthorized) => {
            warn!("Rejected admin results request with a bad key");
            Err(AppError::Unauthorized)
        }
        Err(e) => Err(e),
    }
}
