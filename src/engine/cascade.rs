//! Ordered provider descriptors consulted by the resolver.

use crate::chain::ChainClient;
use crate::config::{PriceConfig, Settings};
use crate::db::Repository;
use crate::sources::{
    DatabaseSource, EOracleSource, HttpClient, LensSource, PriceProvider, SporkSource,
    YDaemonSource, YPriceSource,
};
use std::sync::Arc;
use tracing::info;

/// When a step runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Only for latest requests, before the historical steps.
    Latest,
    /// Always, at the resolved block.
    Historical,
}

#[derive(Debug, Clone)]
pub struct CascadeStep {
    pub phase: Phase,
    pub provider: Arc<dyn PriceProvider>,
}

/// Fixed priority order. The first hit wins; providers never race.
#[derive(Debug, Clone, Default)]
pub struct Cascade {
    steps: Vec<CascadeStep>,
}

impl Cascade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(mut self, provider: Arc<dyn PriceProvider>) -> Self {
        self.steps.push(CascadeStep {
            phase: Phase::Latest,
            provider,
        });
        self
    }

    pub fn historical(mut self, provider: Arc<dyn PriceProvider>) -> Self {
        self.steps.push(CascadeStep {
            phase: Phase::Historical,
            provider,
        });
        self
    }

    /// Steps of `phase`, in priority order.
    pub fn phase(&self, phase: Phase) -> impl Iterator<Item = &CascadeStep> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }

    pub fn names(&self, phase: Phase) -> Vec<&'static str> {
        self.phase(phase).map(|s| s.provider.name()).collect()
    }

    /// Production order.
    ///
    /// Latest: eOracle at head, then yDaemon when configured.
    /// Historical: database, eOracle, lens, then Spork and yPrice when enabled.
    pub fn standard(
        settings: &Settings,
        config: Arc<PriceConfig>,
        chain: Arc<dyn ChainClient>,
        repo: Arc<Repository>,
        http: HttpClient,
    ) -> Self {
        let eoracle: Arc<dyn PriceProvider> =
            Arc::new(EOracleSource::new(config.clone(), chain.clone()));

        let mut cascade = Cascade::new().latest(eoracle.clone());
        if let Some(api) = &settings.ydaemon_api {
            cascade = cascade.latest(Arc::new(YDaemonSource::new(
                api.clone(),
                http.clone(),
                chain.clone(),
            )));
        }

        cascade = cascade
            .historical(Arc::new(DatabaseSource::new(repo)))
            .historical(eoracle)
            .historical(Arc::new(LensSource::new(config.clone(), chain.clone())));

        match (&settings.spork, settings.spork_in_cascade) {
            (Some(credentials), true) => {
                cascade = cascade.historical(Arc::new(SporkSource::new(
                    credentials.clone(),
                    config,
                    http.clone(),
                    chain.clone(),
                )));
            }
            (None, true) => info!("SPORK_IN_CASCADE set without Spork credentials, skipping"),
            _ => {}
        }

        match (&settings.yprice, settings.yprice_enabled) {
            (Some(credentials), true) => {
                cascade = cascade.historical(Arc::new(YPriceSource::new(
                    credentials.clone(),
                    http,
                    chain,
                )));
            }
            (None, true) => info!("YPRICE_ENABLED set without YPRICE_API, skipping"),
            _ => {}
        }

        info!(
            latest = ?cascade.names(Phase::Latest),
            historical = ?cascade.names(Phase::Historical),
            "price cascade"
        );
        cascade
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MockChainClient;
    use crate::config::{SporkCredentials, YPriceCredentials};
    use crate::db::init_db;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn settings(env: &[(&str, &str)]) -> Settings {
        let mut map: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        map.insert("DATABASE_PATH".to_string(), "/tmp/unused.db".to_string());
        Settings::from_env_map(map).unwrap()
    }

    async fn build(settings: &Settings) -> (TempDir, Cascade) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db").to_string_lossy().to_string();
        let repo = Arc::new(Repository::new(init_db(&db_path).await.unwrap()));
        let cascade = Cascade::standard(
            settings,
            Arc::new(PriceConfig::empty()),
            Arc::new(MockChainClient::new()),
            repo,
            HttpClient::new(1_000),
        );
        (temp_dir, cascade)
    }

    #[tokio::test]
    async fn test_base_order() {
        let (_dir, cascade) = build(&settings(&[])).await;
        assert_eq!(cascade.names(Phase::Latest), vec!["eoracle"]);
        assert_eq!(
            cascade.names(Phase::Historical),
            vec!["database", "eoracle", "lens"]
        );
    }

    #[tokio::test]
    async fn test_fully_enabled_order() {
        let settings = settings(&[
            ("YDAEMON_API", "http://ydaemon"),
            ("SPORK_API", "http://spork"),
            ("SPORK_API_AUTH", "secret"),
            ("SPORK_IN_CASCADE", "true"),
            ("YPRICE_API", "http://yprice"),
            ("YPRICE_ENABLED", "true"),
        ]);
        assert_eq!(
            settings.spork,
            Some(SporkCredentials {
                api: "http://spork".to_string(),
                auth: "secret".to_string()
            })
        );
        assert!(matches!(settings.yprice, Some(YPriceCredentials { .. })));

        let (_dir, cascade) = build(&settings).await;
        assert_eq!(cascade.names(Phase::Latest), vec!["eoracle", "ydaemon"]);
        assert_eq!(
            cascade.names(Phase::Historical),
            vec!["database", "eoracle", "lens", "spork", "yprice"]
        );
    }

    #[tokio::test]
    async fn test_flags_without_credentials_are_ignored() {
        let settings = settings(&[("SPORK_IN_CASCADE", "true"), ("YPRICE_ENABLED", "1")]);
        let (_dir, cascade) = build(&settings).await;
        assert_eq!(
            cascade.names(Phase::Historical),
            vec!["database", "eoracle", "lens"]
        );
    }

    #[tokio::test]
    async fn test_credentials_without_flags_are_ignored() {
        let settings = settings(&[
            ("SPORK_API", "http://spork"),
            ("SPORK_API_AUTH", "secret"),
            ("YPRICE_API", "http://yprice"),
        ]);
        let (_dir, cascade) = build(&settings).await;
        assert_eq!(cascade.names(Phase::Historical).len(), 3);
    }
}
