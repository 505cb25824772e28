use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
};
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::{
    config::{AppConfig, CatalogConfig, SessionConfig},
    database::{self, CatalogStore, MemoryCatalog, PgCatalog},
    error::{AppError, Result},
    routes,
};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogStore>,
    pub public_url: Option<String>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self {
            catalog,
            public_url: None,
        }
    }
}

pub async fn build(config: &AppConfig) -> Result<Router> {
    let catalog = connect_catalog(&config.catalog).await?;
    let state = AppState {
        catalog,
        public_url: config.server.public_url.clone(),
    };

    let mut app = router(state, &config.session)
        .layer(DefaultBodyLimit::max(config.server.max_body_size));

    if !config.cors.allowed_origins.is_empty() {
        let allowed_origins: Vec<HeaderValue> = config
            .cors
            .allowed_origins
            .iter()
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|_| {
                    AppError::ConfigError(format!("Invalid CORS origin: {}", origin))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
            .allow_origin(allowed_origins);

        app = app.layer(cors);
    }

    Ok(app)
}

/// Routes plus the session and tracing layers, without transport concerns.
pub fn router(state: AppState, session: &SessionConfig) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session.secure_cookie)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(session.ttl_minutes)));

    routes::create_router()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn connect_catalog(config: &CatalogConfig) -> Result<Arc<dyn CatalogStore>> {
    match config {
        CatalogConfig::Postgres(db) => {
            let pool = database::create_pool(db).await?;
            Ok(Arc::new(PgCatalog::new(pool)))
        }
        CatalogConfig::Memory { seed_file: Some(path) } => {
            Ok(Arc::new(MemoryCatalog::load_seed_file(path).await?))
        }
        CatalogConfig::Memory { seed_file: None } => {
            tracing::warn!("DB_URL not set, serving an empty in-memory catalog");
            Ok(Arc::new(MemoryCatalog::new()))
        }
    }
}
