use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timetable::api::router;
use timetable::config::AppConfig;
use timetable::repository::CourseStore;
use timetable::services::statistics::{NoopTracker, StatisticsService, UsageTracker};
use timetable::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "timetable=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let stats: Arc<dyn UsageTracker> = if config.stats_enabled {
        Arc::new(StatisticsService::load(&config.stats_file).await)
    } else {
        info!("usage statistics disabled");
        Arc::new(NoopTracker)
    };

    let state = AppState::new(Arc::new(CourseStore::new()), stats);

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
