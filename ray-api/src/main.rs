use anyhow::Result;
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod core;
mod middleware;
mod models;

use crate::api::{email::EmailState, items::ItemsState, proxy::ProxyState, ray::RayState};
use crate::core::{auth::AuthManager, config::Settings, services::Services};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let settings = Settings::new()?;

    info!(
        "Starting Ray relay on {}:{}",
        settings.server.host, settings.server.port
    );
    if settings.auth.app_token.is_none() {
        warn!("APP_TOKEN is not set; token-gated routes will answer 500");
    }

    let services = Services::from_settings(&settings)?;
    let app = create_app(&settings, services);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn create_app(settings: &Settings, services: Services) -> Router {
    use crate::core::auth::require_app_token;
    use crate::middleware::{error_handler, request_id};
    use axum::middleware;

    let cors = CorsLayer::permissive();
    let auth = AuthManager::new(settings.auth.app_token.as_deref());

    let ray_state = RayState::new(&services);
    let items_state = ItemsState {
        store: services.store.clone(),
    };
    let proxy_state = ProxyState {
        completion: services.completion.clone(),
        search: services.search.clone(),
        models: services.models.clone(),
    };
    let email_state = EmailState {
        mailer: services.mailer.clone(),
        default_to: services.default_email_to.clone(),
    };

    let ray_routes = Router::new()
        .route("/api/ray", post(api::ray::ray))
        .with_state(ray_state.clone());

    let item_routes = Router::new()
        .route(
            "/api/ray-items",
            post(api::items::create_item).get(api::items::list_items),
        )
        .with_state(items_state);

    let proxy_routes = Router::new()
        .route("/api/openai", post(api::proxy::openai))
        .route("/api/vision", post(api::proxy::vision))
        .route("/api/google-search", post(api::proxy::google_search))
        .with_state(proxy_state);

    let email_routes = Router::new()
        .route("/api/ray/send-email", post(api::email::send_email))
        .with_state(email_state);

    let protected = Router::new()
        .merge(ray_routes)
        .merge(item_routes)
        .merge(proxy_routes)
        .merge(email_routes)
        .route_layer(middleware::from_fn_with_state(auth, require_app_token));

    let mut app = Router::new()
        .route("/health", get(health_check))
        .merge(protected);

    if settings.auth.enable_live_route {
        warn!("/api/ray-live is enabled without token checks");
        app = app.merge(
            Router::new()
                .route("/api/ray-live", post(api::ray::ray))
                .with_state(ray_state),
        );
    }

    app.layer(middleware::from_fn(request_id::add_request_id))
        .layer(middleware::from_fn(error_handler::handle_errors))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}
