use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use super::{api_error, lock_store, store_error_response, ApiError};
use crate::auth::AuthUser;
use crate::state::AppState;
use crate::store::Store;

#[derive(Deserialize)]
pub struct BoardBody {
    title: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
pub struct AddMembersBody {
    user_ids: Option<Vec<i64>>,
}

pub async fn list_boards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let store = lock_store(&state, "tablero.api.list_boards")?;
    let boards = store.boards_for_user(user_id);
    Ok(Json(serde_json::json!({ "boards": boards })))
}

pub async fn create_board(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<BoardBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.create_board";
    let title = match body.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, target, "Title is required")),
    };
    let mut store = lock_store(&state, target)?;
    let board = store.create_board(user_id, title, body.description);
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "board": board })),
    ))
}

/// Board detail, with its lists in display order.
pub async fn get_board(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.get_board";
    let store = lock_store(&state, target)?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let board = store
        .board(board_id)
        .map_err(|e| store_error_response(target, e))?;
    let lists = store
        .lists_of_board(board_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "board": board, "lists": lists })))
}

pub async fn update_board(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
    Json(body): Json<BoardBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.update_board";
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "Title cannot be empty",
        ));
    }
    let mut store = lock_store(&state, target)?;
    // Any member may edit the board; only deletion and membership
    // changes stay owner-only.
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let board = store
        .update_board(board_id, body.title, body.description)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "board": board })))
}

pub async fn delete_board(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.delete_board";
    let mut store = lock_store(&state, target)?;
    store
        .board_owner(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .delete_board(board_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "message": "Board deleted" })))
}

fn members_json(store: &Store, board_id: i64) -> Result<serde_json::Value, crate::store::StoreError> {
    let members: Vec<serde_json::Value> = store
        .members_of(board_id)?
        .into_iter()
        .map(|m| {
            let (username, email) = match store.user(m.user_id) {
                Ok(user) => (Some(user.username), Some(user.email)),
                Err(_) => (None, None),
            };
            serde_json::json!({
                "id": m.id,
                "board_id": m.board_id,
                "user_id": m.user_id,
                "username": username,
                "email": email,
            })
        })
        .collect();
    Ok(serde_json::json!({ "members": members }))
}

pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.list_members";
    let store = lock_store(&state, target)?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let members = members_json(&store, board_id).map_err(|e| store_error_response(target, e))?;
    Ok(Json(members))
}

pub async fn add_members(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
    Json(body): Json<AddMembersBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.add_members";
    let user_ids = match body.user_ids {
        Some(ids) if !ids.is_empty() => ids,
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                target,
                "user_ids is required",
            ))
        }
    };
    let mut store = lock_store(&state, target)?;
    store
        .board_owner(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .add_members(board_id, &user_ids)
        .map_err(|e| store_error_response(target, e))?;
    let members = members_json(&store, board_id).map_err(|e| store_error_response(target, e))?;
    Ok((StatusCode::CREATED, Json(members)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((board_id, member_user_id)): Path<(i64, i64)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.remove_member";
    let mut store = lock_store(&state, target)?;
    store
        .board_owner(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .remove_member(board_id, member_user_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "message": "Member removed" })))
}

/// Boards a user belongs to through membership. Callers can only ask
/// about themselves.
pub async fn member_boards(
    State(state): State<AppState>,
    AuthUser(caller_id): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.member_boards";
    if caller_id != user_id {
        return Err(api_error(
            StatusCode::FORBIDDEN,
            target,
            "You do not have permission to access this board",
        ));
    }
    let store = lock_store(&state, target)?;
    let boards = store.member_boards(user_id);
    Ok(Json(serde_json::json!({ "boards": boards })))
}
