use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use codegen_backend::completion::{CompletionClient, OpenAiClient};
use codegen_backend::config::Config;
use codegen_backend::db::{create_pool, run_migrations, PgStore};
use codegen_backend::http_client::HttpClient;
use codegen_backend::server::{router, AppHandlers};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codegen_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting codegen-backend HTTP server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connection established");

    if config.run_migrations {
        run_migrations(&pool)
            .await
            .context("Failed to apply migrations")?;
        tracing::info!("Migrations applied");
    }

    let completion: Option<Arc<dyn CompletionClient>> = match &config.openai_api_key {
        Some(api_key) => {
            let http = HttpClient::new(config.http_timeout())?;
            tracing::info!("Code generation enabled: model={}", config.openai_model);
            let client: Arc<dyn CompletionClient> = Arc::new(OpenAiClient::new(
                http,
                api_key.clone(),
                config.openai_base_url.clone(),
                config.openai_model.clone(),
            ));
            Some(client)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY is not set, code generation requests will fail");
            None
        }
    };

    let store = Arc::new(PgStore::new(pool));
    let app = router(AppHandlers::new(store.clone(), store, completion));

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
