use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, Level};

mod db;
mod domain;
mod rest;

use domain::{now_rfc3339, HeatmapService, TodoService};
use rest::AppState;

/// Session token accepted in local single-user mode. A real deployment
/// provisions sessions through the auth layer instead.
const LOCAL_SESSION_TOKEN: &str = "local-dev-token";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Setting up database");
    let db = db::DbConnection::init().await?;

    // Local single-user mode: one user, one well-known session
    let now = now_rfc3339();
    db.ensure_user("user_local", "Local User", &now).await?;
    db.ensure_session(LOCAL_SESSION_TOKEN, "user_local", &now).await?;

    let state = AppState::new(TodoService::new(db.clone()), HeatmapService::new(db));

    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:8080".parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    // Set up our application routes
    let api_routes = Router::new()
        .route("/todos", post(rest::create_todo).get(rest::list_todos))
        .route("/todos/:id", patch(rest::update_todo).delete(rest::delete_todo))
        .route("/heatmap", get(rest::heatmap));

    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(PathBuf::from("../frontend/dist")))
        .layer(cors)
        .with_state(state);

    // Start the server
    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
