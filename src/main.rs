use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use news_hub::config::Config;
use news_hub::news_api::NewsApiClient;
use news_hub::refiner::QueryRefiner;
use news_hub::repository::ArticleRepository;
use news_hub::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "news_hub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load_or_default("news.toml")?;
    info!(
        "Using news provider at {} (revalidate every {} min)",
        config.news_api.base_url, config.news_api.revalidate_minutes
    );

    let api = NewsApiClient::new(&config.news_api)?;
    if !api.has_api_key() {
        warn!(
            "{} is not set; article lists will be empty",
            config.news_api.api_key_env
        );
    }

    let refiner = QueryRefiner::from_config(&config.refiner)?;
    match &refiner {
        Some(r) => info!("Search refinement enabled ({})", r.model_name()),
        None => info!("Search refinement disabled; raw queries go to the provider"),
    }

    // Create app state
    let state = Arc::new(AppState {
        repository: Arc::new(ArticleRepository::new(api)),
        refiner,
    });

    let app = routes::router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!("Server starting on http://{}", config.server.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
