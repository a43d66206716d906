//! Wires the route table, upload handling, auth gate, and static-file
//! delegate into a running HTTP listener.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::{basic_auth_middleware, BasicAuth};
use crate::config::Config;
use crate::error::StartupError;
use crate::handlers;
use crate::routes::RouteTable;

/// Callbacks surfaced to the embedding caller.
#[derive(Clone, Default)]
pub struct Hooks {
    /// Invoked on every folder-route request while clipboard mode is on.
    pub on_clipboard_access: Option<Arc<dyn Fn() + Send + Sync>>,
    /// Invoked once the listener is bound.
    pub on_start: Option<Arc<dyn Fn(SocketAddr) + Send + Sync>>,
}

/// Application state shared across handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub routes: Arc<RouteTable>,
    /// Destination for uploads: the first shared path's owning directory.
    pub upload_dir: PathBuf,
    pub hooks: Hooks,
}

/// Validate the configured paths and derive the immutable state.
pub fn build_state(config: Config, hooks: Hooks) -> Result<AppState, StartupError> {
    if config.paths.is_empty() {
        return Err(StartupError::NoPaths);
    }
    let routes = RouteTable::build(&config.paths)?;
    let upload_dir = routes
        .entries()
        .first()
        .map(|entry| entry.directory.clone())
        .ok_or(StartupError::NoPaths)?;

    Ok(AppState {
        config: Arc::new(config),
        routes: Arc::new(routes),
        upload_dir,
        hooks,
    })
}

/// Build the router from immutable state. Route bindings are data consumed
/// here, never accumulated through side effects elsewhere.
pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/", get(handlers::root))
        .route("/share", get(handlers::share));

    if state.config.receive {
        app = app.route("/receive", get(handlers::receive_form)).route(
            "/upload",
            post(handlers::upload).layer(DefaultBodyLimit::max(state.config.max_upload_size)),
        );
    }

    // one static-serving binding per distinct shared directory; etag,
    // ranges, and 404s are ServeDir's concern
    let mut folders = Router::new();
    for entry in state.routes.entries() {
        folders = folders.nest_service(&entry.route_prefix, ServeDir::new(&entry.directory));
    }
    let folders = folders.route_layer(middleware::from_fn_with_state(
        state.clone(),
        handlers::folder_access,
    ));
    app = app.merge(folders);

    app = app.nest_service("/assets", ServeDir::new(&state.config.assets_dir));

    if let Some((username, password)) = state.config.auth.credentials() {
        let gate = BasicAuth::new(username, password);
        app = app.layer(middleware::from_fn_with_state(gate, basic_auth_middleware));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind and serve, over TLS when cert material is configured.
pub async fn serve(config: Config, hooks: Hooks) -> Result<(), StartupError> {
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .map_err(|err| StartupError::InvalidConfig(format!("bad bind address: {err}")))?;
    let tls = config.tls.clone();

    let state = build_state(config, hooks.clone())?;
    for entry in state.routes.entries() {
        info!(
            prefix = %entry.route_prefix,
            directory = %entry.directory.display(),
            "sharing directory"
        );
    }
    let app = build_router(state);

    match tls {
        Some(tls) => {
            let rustls =
                axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert, &tls.key)
                    .await
                    .map_err(StartupError::Bind)?;
            info!("listening on https://{addr}");
            if let Some(on_start) = &hooks.on_start {
                on_start(addr);
            }
            axum_server::bind_rustls(addr, rustls)
                .serve(app.into_make_service())
                .await
                .map_err(StartupError::Bind)?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .map_err(StartupError::Bind)?;
            let local = listener.local_addr().map_err(StartupError::Bind)?;
            info!("listening on http://{local}");
            if let Some(on_start) = &hooks.on_start {
                on_start(local);
            }
            axum::serve(listener, app)
                .await
                .map_err(StartupError::Bind)?;
        }
    }
    Ok(())
}
