use std::sync::{Arc, Mutex};

mod api;
mod auth;
mod config;
mod server;
mod state;
mod store;

use auth::TokenService;
use config::Config;
use state::AppState;
use store::Store;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env();
    let state = AppState {
        store: Arc::new(Mutex::new(Store::new())),
        tokens: Arc::new(TokenService::new(
            &config.jwt_secret,
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        )),
    };

    if let Err(e) = server::serve(&config, state).await {
        log::error!("[server] Failed to start: {}", e);
        std::process::exit(1);
    }
}
