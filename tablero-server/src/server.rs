/// HTTP server assembly: router, CORS, and the accept loop.
use tower_http::cors::{Any, CorsLayer};

use crate::api::api_router;
use crate::config::Config;
use crate::state::AppState;

pub async fn serve(config: &Config, state: AppState) -> std::io::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api_router().layer(cors).with_state(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("[server] Listening on http://{}", addr);
    axum::serve(listener, app).await
}
