use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Form, Json, Router,
};
use serde_json::json;

mod config;
mod extract;
mod models;
mod views;

use config::Config;
use extract::Fetcher;
use models::PageRequest;
use views::IndexTemplate;

struct AppState {
    fetcher: Fetcher,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;
    serve(config).await
}

async fn serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState {
        fetcher: Fetcher::new(&config)?,
    });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn index() -> IndexTemplate {
    IndexTemplate::default()
}

async fn submit(State(state): State<Arc<AppState>>, Form(req): Form<PageRequest>) -> IndexTemplate {
    let url = req.url.trim().to_string();
    if url.is_empty() {
        return IndexTemplate::default();
    }

    let outcome = state.fetcher.extract_images(&url).await;
    if let Err(e) = &outcome {
        tracing::warn!(url = %url, error = %e, "extraction failed");
    }
    IndexTemplate::for_outcome(url, outcome)
}
