use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::{parse_address, AppState};
use crate::domain::{BlockNumber, ChainId, TransferEvent, Valuation};
use crate::error::AppError;
use alloy_primitives::U256;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub chain_id: ChainId,
    pub address: String,
    pub block_number: BlockNumber,
    /// Raw amount as a base-10 integer string.
    pub value: String,
}

impl TransferRequest {
    fn into_event(self) -> Result<TransferEvent, AppError> {
        let address = parse_address(&self.address)?;
        let value = U256::from_str_radix(self.value.trim(), 10)
            .map_err(|_| AppError::BadRequest(format!("invalid value: {}", self.value)))?;
        Ok(TransferEvent {
            chain_id: self.chain_id,
            address,
            block_number: self.block_number,
            value,
        })
    }
}

pub async fn value_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<Valuation>, AppError> {
    let event = request.into_event()?;
    Ok(Json(state.valuer.value_event(&event).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(address: &str, value: &str) -> TransferRequest {
        TransferRequest {
            chain_id: 1,
            address: address.to_string(),
            block_number: 10,
            value: value.to_string(),
        }
    }

    #[test]
    fn test_into_event_parses_large_values() {
        let event = request(
            "0x6b175474e89094c44da98b954eedeac495271d0f",
            "1000000000000000000000000000000",
        )
        .into_event()
        .unwrap();
        assert_eq!(
            event.value,
            U256::from(10u8).pow(U256::from(30u8))
        );
    }

    #[test]
    fn test_into_event_rejects_bad_input() {
        assert!(matches!(
            request("0x1234", "1").into_event(),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            request("0x6b175474e89094c44da98b954eedeac495271d0f", "1.5").into_event(),
            Err(AppError::BadRequest(_))
        ));
    }
}
