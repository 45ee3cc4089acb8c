use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::constants::fotos::MAX_UPLOAD_BYTES;
use crate::state::SharedState;

pub mod auth;
mod dashboard;
mod encastes;
mod error;
mod gallos;
pub mod guard;
mod observability;
mod seguridad;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    /// Single-use login codes minted for sign-in links, keyed by code with
    /// the owning user and mint time. Swept on every mint.
    pub login_codes: Arc<Mutex<HashMap<String, (i32, Instant)>>>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub async fn config(&self) -> Config {
        self.shared.config().await
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn photos(&self) -> &crate::services::PhotoStore {
        &self.shared.photos
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<dyn crate::services::EditGate> {
        &self.shared.gate
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        login_codes: Arc::new(Mutex::new(HashMap::new())),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let config = state.config().await;
    let images_path = config.general.images_path.clone();
    let web_path = config.general.web_path.clone();
    let cors_origins = config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/logout", post(auth::logout))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state.clone());

    // Anything that is not /api, /images or /auth/callback is a page: serve
    // the frontend bundle, falling back to index.html for client routes, with
    // the navigation guard in front.
    let index = std::path::Path::new(&web_path).join("index.html");
    let pages = Router::new()
        .fallback_service(ServeDir::new(&web_path).fallback(ServeFile::new(index)))
        .layer(middleware::from_fn(guard::page_guard));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_minutes,
        )));

    Router::new()
        .nest("/api", api_router)
        .route(
            "/auth/callback",
            get(auth::auth_callback).with_state(state.clone()),
        )
        .nest_service("/images", ServeDir::new(images_path))
        .fallback_service(pages)
        .layer(session_layer)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/gallos", get(gallos::list_gallos))
        .route("/gallos", post(gallos::create_gallo))
        .route("/gallos/{id}", get(gallos::get_gallo))
        .route("/gallos/{id}", put(gallos::update_gallo))
        .route("/gallos/{id}", delete(gallos::delete_gallo))
        .route("/encastes", get(encastes::list_encastes))
        .route("/encastes", post(encastes::create_encaste))
        .route("/encastes/{id}", get(encastes::get_encaste))
        .route("/encastes/{id}", put(encastes::update_encaste))
        .route("/encastes/{id}", delete(encastes::delete_encaste))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/seguridad/verificar", post(seguridad::verificar_clave))
        .route("/seguridad/clave", put(seguridad::cambiar_clave))
        .route("/seguridad/reset", post(seguridad::reset_clave))
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/auth/code", post(auth::create_login_code))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
