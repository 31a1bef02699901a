use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::Method, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod services;

use services::charts::{ChartRenderer, PlottersRenderer};
use services::session::SessionStore;

// Application state
pub struct AppState {
    pub config: config::Config,
    pub sessions: SessionStore,
    pub charts: Arc<dyn ChartRenderer>,
    pub report_font: Option<Arc<Vec<u8>>>,
}

impl AppState {
    pub fn new(config: config::Config) -> anyhow::Result<Self> {
        let report_font = config.load_report_font()?.map(Arc::new);
        Ok(Self::with_renderer(config, Arc::new(PlottersRenderer::default()), report_font))
    }

    pub fn with_renderer(
        config: config::Config,
        charts: Arc<dyn ChartRenderer>,
        report_font: Option<Arc<Vec<u8>>>,
    ) -> Self {
        let sessions = SessionStore::new(config.session_capacity, config.session_idle);
        Self {
            config,
            sessions,
            charts,
            report_font,
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));
    let body_limit = state.config.max_file_size;

    routes::routes()
        .merge(routes::datasets::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
