mod error;
mod extract;
pub mod routes;
mod state;

use std::net::SocketAddr;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

pub use error::ApiError;
pub use extract::JsonBody;
pub use state::{AppState, Session};

/// The page shell: wallet session and trade cache wrapped around the page
/// content and its JSON API.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::session_router())
        .merge(routes::trades_router())
        .merge(routes::health_router())
        .merge(routes::static_router())
        .with_state(state)
        .layer(ServiceBuilder::new().layer(CompressionLayer::new()).layer(cors))
}

/// Build and run the desk server.
pub async fn serve(state: AppState, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let app = router(state);

    info!(%addr, "Escrow desk listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
