use std::sync::Arc;
use std::time::Duration;

use outfit_planner::assistant::{
    AiResponder, MockAiResponder, MockWeatherResponder, WeatherResponder,
};
use outfit_planner::config::AppConfig;
use outfit_planner::journey::{LogProfileSink, ProfileSink};
use outfit_planner::routes;
use outfit_planner::session::SessionRegistry;

/// How often idle sessions are swept.
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env();

    eprintln!("👗 Outfit Planner v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Sessions API: http://0.0.0.0:{}/api/sessions", config.port);
    eprintln!("   Session WS: ws://0.0.0.0:{}/ws/sessions/{{id}}", config.port);
    eprintln!(
        "   Mock latency: chat {}ms, weather {}ms",
        config.chat_delay.as_millis(),
        config.weather_delay.as_millis()
    );
    eprintln!(
        "   CORS: {}",
        config.cors_origin.as_deref().unwrap_or("any origin")
    );
    eprintln!("   Session idle timeout: {}s\n", config.session_idle.as_secs());

    // ── Collaborators ───────────────────────────────────────────────────
    let ai: Arc<dyn AiResponder> = Arc::new(MockAiResponder::new(config.chat_delay));
    let weather: Arc<dyn WeatherResponder> =
        Arc::new(MockWeatherResponder::new(config.weather_delay));
    let sink: Arc<dyn ProfileSink> = Arc::new(LogProfileSink);

    let registry = SessionRegistry::new(ai, weather, sink);
    let pruner = registry.spawn_pruner(config.session_idle, PRUNE_INTERVAL);
    let app = routes::app(registry, &config)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "Outfit planner server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    pruner.abort();
    Ok(())
}
