//! Repository layer for persisted prices and the vault registry.

use crate::domain::{
    checksummed, Address, BlockNumber, ChainId, Decimal, Price, PriceSource, VaultDefaults,
    VaultRegistration,
};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::fmt;

/// Read access to the registry of labelled addresses.
#[async_trait]
pub trait VaultRegistry: Send + Sync + fmt::Debug {
    async fn find_thing(
        &self,
        chain_id: ChainId,
        address: &Address,
        label: &str,
    ) -> Result<Option<VaultRegistration>, sqlx::Error>;
}

/// Repository for database operations.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Exact `(chain, address, block)` lookup; no interpolation between blocks.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored row cannot be decoded.
    pub async fn get_price(
        &self,
        chain_id: ChainId,
        address: &Address,
        block_number: BlockNumber,
    ) -> Result<Option<Price>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT chain_id, address, block_number, price_usd, price_source, block_time
            FROM price
            WHERE chain_id = ? AND address = ? AND block_number = ?
            "#,
        )
        .bind(chain_id as i64)
        .bind(checksummed(address))
        .bind(block_number as i64)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| price_from_row(&r)).transpose()
    }

    /// Insert or replace the price stored for `(chain, address, block)`.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    pub async fn upsert_price(&self, price: &Price) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO price (
                chain_id, address, block_number, price_usd, price_source, block_time, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(chain_id, address, block_number) DO UPDATE SET
                price_usd = excluded.price_usd,
                price_source = excluded.price_source,
                block_time = excluded.block_time,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(price.chain_id as i64)
        .bind(checksummed(&price.address))
        .bind(price.block_number as i64)
        .bind(price.price_usd.to_canonical_string())
        .bind(price.price_source.to_string())
        .bind(price.block_time.timestamp())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_prices(&self) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM price")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    /// Register (or re-register) a labelled address with its defaults.
    pub async fn upsert_thing(&self, thing: &VaultRegistration) -> Result<(), sqlx::Error> {
        let defaults = serde_json::to_string(&thing.defaults)
            .map_err(|e| sqlx::Error::Protocol(format!("encode defaults: {}", e)))?;
        sqlx::query(
            r#"
            INSERT INTO thing (chain_id, address, label, defaults)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(chain_id, address, label) DO UPDATE SET defaults = excluded.defaults
            "#,
        )
        .bind(thing.chain_id as i64)
        .bind(checksummed(&thing.address))
        .bind(thing.label.as_str())
        .bind(defaults)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Health probe used by the readiness endpoint.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl VaultRegistry for Repository {
    async fn find_thing(
        &self,
        chain_id: ChainId,
        address: &Address,
        label: &str,
    ) -> Result<Option<VaultRegistration>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT chain_id, address, label, defaults FROM thing WHERE chain_id = ? AND address = ? AND label = ?",
        )
        .bind(chain_id as i64)
        .bind(checksummed(address))
        .bind(label)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let defaults: String = row.try_get("defaults")?;
        let defaults: VaultDefaults =
            serde_json::from_str(&defaults).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(Some(VaultRegistration {
            chain_id,
            address: *address,
            label: row.try_get("label")?,
            defaults,
        }))
    }
}

fn price_from_row(row: &SqliteRow) -> Result<Price, sqlx::Error> {
    let address: String = row.try_get("address")?;
    let price_usd: String = row.try_get("price_usd")?;
    let price_source: String = row.try_get("price_source")?;
    let block_time: i64 = row.try_get("block_time")?;

    Ok(Price {
        chain_id: row.try_get::<i64, _>("chain_id")? as ChainId,
        address: address
            .parse::<Address>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        price_usd: Decimal::from_str_canonical(&price_usd)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        price_source: price_source
            .parse::<PriceSource>()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        block_number: row.try_get::<i64, _>("block_number")? as BlockNumber,
        block_time: DateTime::from_timestamp(block_time, 0).ok_or_else(|| {
            sqlx::Error::Decode(format!("bad block_time {}", block_time).into())
        })?,
    })
}
