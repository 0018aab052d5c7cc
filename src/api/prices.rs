use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use super::{parse_address, AppState};
use crate::domain::{BlockNumber, ChainId, Price};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct PriceParams {
    /// Omitted means the current head.
    pub block: Option<BlockNumber>,
    #[serde(default)]
    pub latest: bool,
}

pub async fn get_price(
    Path((chain_id, token)): Path<(ChainId, String)>,
    Query(params): Query<PriceParams>,
    State(state): State<AppState>,
) -> Result<Json<Price>, AppError> {
    let token = parse_address(&token)?;
    let price = state
        .engine
        .resolve_price(chain_id, token, params.block, params.latest)
        .await;
    Ok(Json(price))
}
