use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
};
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::{self, AppConfig, CorsConfig},
    database,
    error::{AppError, Result},
    routes,
    services::{chat_completion_service::ChatCompletionClient, form_session_store::FormSessionStore},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3_client: aws_sdk_s3::Client,
    pub s3_bucket: String,
    pub assets_url: String,
    pub chat: ChatCompletionClient,
    pub form_sessions: FormSessionStore,
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let pool = database::create_pool(&config.database).await?;
    let s3_client = config::load_s3_client(&config.storage).await?;

    let form_sessions =
        FormSessionStore::with_limits(config.sessions.ttl, config.sessions.max_sessions);
    form_sessions.spawn_sweeper(config.sessions.sweep_interval);

    let state = AppState {
        db: pool,
        s3_client,
        s3_bucket: config.storage.bucket.clone(),
        assets_url: config.storage.assets_url.clone(),
        chat: ChatCompletionClient::new(&config.openai),
        form_sessions,
    };

    router(state, &config.cors, config.server.max_body_size)
}

pub fn router(state: AppState, cors: &CorsConfig, max_body_size: usize) -> Result<Router> {
    let allowed_origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::ConfigError(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION])
        .allow_origin(allowed_origins);

    let app = routes::create_router()
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}
