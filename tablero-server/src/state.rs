/// Shared application state passed to axum handlers.
use std::sync::{Arc, Mutex};

use crate::auth::TokenService;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    /// Every handler takes this lock once for its whole
    /// read-reflow-write sequence, which keeps position maintenance
    /// atomic with respect to other requests.
    pub store: Arc<Mutex<Store>>,
    pub tokens: Arc<TokenService>,
}
