//! HTTP route definitions

use axum::{
    extract::State,
    response::{Html, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::app::AppState;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router.
/// Anything but GET on a known path, or any unknown path, is rejected by
/// axum's routing (405/404).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The bundled viewer page
async fn home_handler() -> Html<&'static str> {
    Html(include_str!("../../assets/home.html"))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    players: usize,
    connections: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let players = state.world.lock().await.players.len();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        players,
        connections: state.hub.connections(),
    })
}
