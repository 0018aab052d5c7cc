pub mod health;
pub mod prices;
pub mod transfers;

use crate::db::Repository;
use crate::domain::Address;
use crate::engine::{PriceEngine, TransferValuer};
use crate::error::AppError;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub engine: Arc<PriceEngine>,
    pub valuer: Arc<TransferValuer>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        engine: Arc<PriceEngine>,
        valuer: Arc<TransferValuer>,
    ) -> Self {
        Self {
            repo,
            engine,
            valuer,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/prices/:chain_id/:token", get(prices::get_price))
        .route("/v1/transfers/value", post(transfers::value_transfer))
        .layer(cors)
        .with_state(state)
}

pub(crate) fn parse_address(raw: &str) -> Result<Address, AppError> {
    Address::from_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("invalid address: {}", raw)))
}
