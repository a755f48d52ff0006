use std::sync::MutexGuard;

use axum::{
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

mod auth;
mod boards;
mod cards;
mod lists;

use crate::state::AppState;
use crate::store::{Store, StoreError};

/// Axum REST API routes.
///
///   GET    /health                             -> liveness check
///   POST   /auth/register                      -> create account, return tokens
///   POST   /auth/login                         -> exchange credentials for tokens
///   POST   /auth/refresh                       -> new access token from refresh token
///   GET    /auth/me                            -> current user profile
///   GET    /boards                             -> boards owned by or shared with caller
///   POST   /boards                             -> create board
///   GET    /boards/{board_id}                  -> board detail
///   PUT    /boards/{board_id}                  -> update board
///   DELETE /boards/{board_id}                  -> delete board and contents (owner only)
///   GET    /boards/{board_id}/members          -> list members
///   POST   /boards/{board_id}/members          -> add members (owner only)
///   DELETE /boards/{board_id}/members/{user_id} -> remove member (owner only)
///   GET    /users/{user_id}/boards             -> boards shared with a user
///   GET    /boards/{board_id}/lists            -> lists of a board, ordered
///   POST   /boards/{board_id}/lists            -> create list (board in path)
///   POST   /lists                              -> create list (board_id in body)
///   GET    /lists/{list_id}                    -> list detail with its cards
///   PUT    /lists/{list_id}                    -> rename and/or relocate list
///   DELETE /lists/{list_id}                    -> delete list and its cards
///   PUT    /lists/{list_id}/move               -> move list to board/position
///   GET    /lists/{list_id}/cards              -> cards of a list, ordered
///   POST   /lists/{list_id}/cards              -> create card (list in path)
///   POST   /cards                              -> create card (list_id in body)
///   GET    /cards/{card_id}                    -> card detail
///   PUT    /cards/{card_id}                    -> update card fields, possibly moving it
///   DELETE /cards/{card_id}                    -> delete card
///   PUT    /cards/{card_id}/move               -> move card to list/position
///   PUT    /cards/{card_id}/archive            -> archive card
///   PUT    /cards/{card_id}/unarchive          -> restore card
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        .route("/boards", get(boards::list_boards).post(boards::create_board))
        .route(
            "/boards/{board_id}",
            get(boards::get_board)
                .put(boards::update_board)
                .delete(boards::delete_board),
        )
        .route(
            "/boards/{board_id}/members",
            get(boards::list_members).post(boards::add_members),
        )
        .route(
            "/boards/{board_id}/members/{user_id}",
            axum::routing::delete(boards::remove_member),
        )
        .route("/users/{user_id}/boards", get(boards::member_boards))
        .route(
            "/boards/{board_id}/lists",
            get(lists::list_lists).post(lists::create_list),
        )
        .route("/lists", post(lists::create_list_from_body))
        .route(
            "/lists/{list_id}",
            get(lists::get_list)
                .put(lists::update_list)
                .delete(lists::delete_list),
        )
        .route("/lists/{list_id}/move", put(lists::move_list))
        .route(
            "/lists/{list_id}/cards",
            get(cards::list_cards).post(cards::create_card),
        )
        .route("/cards", post(cards::create_card_from_body))
        .route(
            "/cards/{card_id}",
            get(cards::get_card)
                .put(cards::update_card)
                .delete(cards::delete_card),
        )
        .route("/cards/{card_id}/move", put(cards::move_card))
        .route("/cards/{card_id}/archive", put(cards::archive_card))
        .route("/cards/{card_id}/unarchive", put(cards::unarchive_card))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ── Shared types and helpers used across sub-modules ────────────────────

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn log_api_issue(status: StatusCode, target: &'static str, message: impl AsRef<str>) {
    let message = message.as_ref();
    if status.is_server_error() {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}

fn api_error(status: StatusCode, target: &'static str, message: impl Into<String>) -> ApiError {
    let message = message.into();
    log_api_issue(status, target, &message);
    (status, Json(ErrorResponse { error: message }))
}

fn store_error_status(error: &StoreError) -> StatusCode {
    match error {
        StoreError::Forbidden => StatusCode::FORBIDDEN,
        StoreError::DuplicateUser => StatusCode::CONFLICT,
        _ => StatusCode::NOT_FOUND,
    }
}

fn store_error_response(target: &'static str, error: StoreError) -> ApiError {
    api_error(store_error_status(&error), target, error.to_string())
}

/// Take the store lock for the duration of a handler. A poisoned lock
/// means an earlier handler panicked mid-update, so fail the request.
fn lock_store<'a>(
    state: &'a AppState,
    target: &'static str,
) -> Result<MutexGuard<'a, Store>, ApiError> {
    state.store.lock().map_err(|_| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            target,
            "Internal server error",
        )
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{hash_password, TokenService};

    /// State with two users: "ana" (id 1) owns board 1 with lists 1-2
    /// and cards 1-2 in list 1; "bob" (id 2) is a member. Returns the
    /// state plus access tokens for both.
    fn seeded_state() -> (AppState, String, String) {
        let mut store = Store::new();
        let owner = store
            .create_user("ana".into(), "ana@example.com".into(), hash_password("hunter22"))
            .unwrap();
        let member = store
            .create_user("bob".into(), "bob@example.com".into(), hash_password("hunter22"))
            .unwrap();
        store.create_board(owner.id, "Proyecto".into(), None);
        store.add_members(1, &[member.id]).unwrap();
        store.create_list(1, "Todo".into(), None).unwrap();
        store.create_list(1, "Done".into(), None).unwrap();
        store.create_card(1, "c1".into(), None, None, None).unwrap();
        store.create_card(1, "c2".into(), None, None, None).unwrap();

        let tokens = TokenService::new("test-secret", 900, 3600);
        let owner_token = tokens.issue_access(owner.id).unwrap();
        let member_token = tokens.issue_access(member.id).unwrap();
        let state = AppState {
            store: Arc::new(Mutex::new(store)),
            tokens: Arc::new(tokens),
        };
        (state, owner_token, member_token)
    }

    async fn send(
        state: &AppState,
        method: Method,
        uri: &str,
        token: &str,
        body: serde_json::Value,
    ) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        api_router()
            .with_state(state.clone())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_move_and_archive_routes_accept_put() {
        let (state, owner, _) = seeded_state();
        let body = serde_json::json!({ "position": 1 });
        assert_eq!(
            send(&state, Method::PUT, "/cards/1/move", &owner, body.clone()).await,
            StatusCode::OK
        );
        assert_eq!(
            send(&state, Method::PUT, "/lists/1/move", &owner, body).await,
            StatusCode::OK
        );
        assert_eq!(
            send(&state, Method::PUT, "/cards/1/archive", &owner, serde_json::json!({})).await,
            StatusCode::OK
        );
        assert_eq!(
            send(&state, Method::PUT, "/cards/1/unarchive", &owner, serde_json::json!({})).await,
            StatusCode::OK
        );
        // POST is not a valid method for the move routes.
        assert_eq!(
            send(
                &state,
                Method::POST,
                "/cards/1/move",
                &owner,
                serde_json::json!({ "position": 0 })
            )
            .await,
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[tokio::test]
    async fn test_create_list_and_card_with_parent_in_body() {
        let (state, owner, _) = seeded_state();
        assert_eq!(
            send(
                &state,
                Method::POST,
                "/lists",
                &owner,
                serde_json::json!({ "title": "Backlog", "board_id": 1 })
            )
            .await,
            StatusCode::CREATED
        );
        assert_eq!(
            send(
                &state,
                Method::POST,
                "/cards",
                &owner,
                serde_json::json!({ "title": "c3", "list_id": 2 })
            )
            .await,
            StatusCode::CREATED
        );
        // The parent id is required in the body form.
        assert_eq!(
            send(&state, Method::POST, "/lists", &owner, serde_json::json!({ "title": "X" }))
                .await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            send(&state, Method::POST, "/cards", &owner, serde_json::json!({ "title": "X" }))
                .await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_members_can_update_board_but_not_delete_it() {
        let (state, _, member) = seeded_state();
        assert_eq!(
            send(
                &state,
                Method::PUT,
                "/boards/1",
                &member,
                serde_json::json!({ "title": "Renombrado" })
            )
            .await,
            StatusCode::OK
        );
        assert_eq!(
            send(&state, Method::DELETE, "/boards/1", &member, serde_json::json!({})).await,
            StatusCode::FORBIDDEN
        );
    }
}
