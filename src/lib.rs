pub mod api;
pub mod cache;
pub mod chain;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod queue;
pub mod sources;

pub use cache::TtlCache;
pub use chain::{ChainClient, ChainError, MockChainClient, RpcChainClient};
pub use config::{ConfigError, PriceConfig, Settings};
pub use db::{init_db, Repository, VaultRegistry};
pub use domain::{Address, Decimal, Price, PriceSource, TransferEvent, Valuation};
pub use engine::{Cascade, PriceEngine, TransferValuer};
pub use error::AppError;
pub use queue::{ChannelQueue, Job, JobQueue, PriceLoader, RecordingQueue};
pub use sources::{MockSource, PriceProvider, PriceQuery, SourceError};
