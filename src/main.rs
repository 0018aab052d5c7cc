use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokenvalue::chain::ChainClient;
use tokenvalue::sources::HttpClient;
use tokenvalue::{
    api, init_db, Cascade, PriceConfig, PriceEngine, PriceLoader, Repository, RpcChainClient,
    Settings, TransferValuer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let settings = Settings::from_env().context("configuration error")?;
    let prices_config = PriceConfig::from_file(&settings.prices_config_path)
        .with_context(|| format!("loading {}", settings.prices_config_path))?;
    let prices_config = Arc::new(prices_config);

    let pool = init_db(&settings.database_path)
        .await
        .context("failed to initialize database")?;
    let repo = Arc::new(Repository::new(pool));

    let chain: Arc<dyn ChainClient> = Arc::new(
        RpcChainClient::new(&settings.rpc_urls, settings.rpc_timeout_ms)
            .context("failed to configure RPC providers")?,
    );
    if settings.rpc_urls.is_empty() {
        tracing::warn!("no RPC_URL_<chainId> configured, on-chain sources will miss");
    }

    let (queue, _loader) = PriceLoader::spawn(repo.clone());
    let cascade = Cascade::standard(
        &settings,
        prices_config,
        chain.clone(),
        repo.clone(),
        HttpClient::new(settings.http_timeout_ms),
    );
    let engine = Arc::new(PriceEngine::new(chain.clone(), Arc::new(queue), cascade));
    let valuer = Arc::new(TransferValuer::new(engine.clone(), chain, repo.clone()));

    let app = api::create_router(api::AppState::new(repo, engine, valuer));

    let addr = SocketAddr::from(([127, 0, 0, 1], settings.port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
