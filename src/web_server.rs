use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post},
    serve, Json, Router,
};
use minijinja::{path_loader, Environment};
use minijinja_autoreload::AutoReloader;
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::constants;
use crate::relay::{RelayError, RelayRequest, RelayResponse, RelayService};
use crate::render::ChatView;

#[derive(Debug, Clone)]
pub struct WebConfig {
    pub allowed_origin: String,
    pub templates_dir: PathBuf,
    pub static_dir: PathBuf,
    pub view: ChatView,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            allowed_origin: constants::DEFAULT_ALLOWED_ORIGIN.to_string(),
            templates_dir: PathBuf::from("templates"),
            static_dir: PathBuf::from("static"),
            view: ChatView::default(),
        }
    }
}

// Shared application state
#[derive(Clone)]
struct AppState {
    relay: RelayService,
    templates: Arc<AutoReloader>,
    view: ChatView,
}

// Minijinja Environment setup
fn create_minijinja_env(templates_dir: &Path) -> AutoReloader {
    let templates_dir = templates_dir.to_path_buf();
    AutoReloader::new(move |notifier| {
        let mut env = Environment::new();
        env.set_loader(path_loader(&templates_dir));
        notifier.watch_path(&templates_dir, true);
        Ok(env)
    })
}

async fn index_handler(State(state): State<AppState>) -> Result<Html<String>, (StatusCode, Html<String>)> {
    state
        .templates
        .acquire_env()
        .and_then(|env| {
            env.get_template("index.html").and_then(|tmpl| {
                tmpl.render(minijinja::context! {
                    title => &state.view.title,
                    placeholder => &state.view.placeholder,
                    relay_route => constants::RELAY_ROUTE,
                    greeting => constants::GREETING,
                })
            })
        })
        .map(Html)
        .map_err(|e| {
            error!("Failed to get or render template: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("Internal Server Error".to_string()),
            )
        })
}

async fn relay_handler(
    State(state): State<AppState>,
    payload: Result<Json<RelayRequest>, JsonRejection>,
) -> Result<Json<RelayResponse>, RelayError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(%rejection, "Rejected relay request body");
            return Err(RelayError::Validation);
        }
    };
    state.relay.relay(request).await.map(Json)
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let client = state.relay.client();
    Json(json!({
        "status": "ok",
        "provider": client.provider().to_string(),
        "model": client.model(),
        "prompt_strategy": state.relay.strategy().name(),
    }))
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer> {
    let origin = allowed_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid allowed origin {}", allowed_origin))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]))
}

pub fn build_router(relay: RelayService, config: &WebConfig) -> Result<Router> {
    let state = AppState {
        relay,
        templates: Arc::new(create_minijinja_env(&config.templates_dir)),
        view: config.view.clone(),
    };

    // Serve static files from the configured directory
    let static_files_service = ServeDir::new(&config.static_dir).not_found_service(
        tower::service_fn(|_req: Request| async {
            Ok::<_, Infallible>((StatusCode::NOT_FOUND, "Not Found").into_response())
        }),
    );

    let app = Router::new()
        .route("/", get(index_handler))
        .route(constants::RELAY_ROUTE, post(relay_handler))
        .route("/relay", post(relay_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", static_files_service)
        .with_state(state)
        .layer(cors_layer(&config.allowed_origin)?)
        .layer(TraceLayer::new_for_http()); // Add request logging

    Ok(app)
}

pub async fn start_web_server(port: u16, app: Router) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind to address {}", addr))?;

    serve(listener, app.into_make_service())
        .await
        .context("Web server failed")?;

    Ok(())
}
