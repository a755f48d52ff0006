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
use tablero_core::types::List;

#[derive(Deserialize)]
pub struct CreateListBody {
    title: Option<String>,
    position: Option<i64>,
}

#[derive(Deserialize)]
pub struct UpdateListBody {
    title: Option<String>,
    board_id: Option<i64>,
    position: Option<i64>,
}

#[derive(Deserialize)]
pub struct MoveListBody {
    board_id: Option<i64>,
    position: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateListFromBody {
    title: Option<String>,
    board_id: Option<i64>,
    position: Option<i64>,
}

/// Serialize a list with its cards embedded in display order.
fn list_with_cards(store: &Store, list: &List) -> serde_json::Value {
    let cards = store.cards_of_list(list.id).unwrap_or_default();
    let mut value = serde_json::json!(list);
    if let Some(obj) = value.as_object_mut() {
        obj.insert("cards".to_string(), serde_json::json!(cards));
    }
    value
}

pub async fn list_lists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.list_lists";
    let store = lock_store(&state, target)?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let lists: Vec<serde_json::Value> = store
        .lists_of_board(board_id)
        .map_err(|e| store_error_response(target, e))?
        .iter()
        .map(|l| list_with_cards(&store, l))
        .collect();
    Ok(Json(serde_json::json!({ "lists": lists })))
}

pub async fn create_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(board_id): Path<i64>,
    Json(body): Json<CreateListBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.create_list";
    let title = match body.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, target, "Title is required")),
    };
    let mut store = lock_store(&state, target)?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let list = store
        .create_list(board_id, title, body.position)
        .map_err(|e| store_error_response(target, e))?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "list": list })),
    ))
}

pub async fn get_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.get_list";
    let store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let list = store
        .list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(
        serde_json::json!({ "list": list_with_cards(&store, &list) }),
    ))
}

pub async fn update_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<i64>,
    Json(body): Json<UpdateListBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.update_list";
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "Title cannot be empty",
        ));
    }
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    // Moving to another board needs access on the destination too.
    if let Some(new_board_id) = body.board_id {
        store
            .board_access(new_board_id, user_id)
            .map_err(|e| store_error_response(target, e))?;
    }
    let list = store
        .update_list(list_id, body.title, body.board_id, body.position)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "list": list })))
}

pub async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.delete_list";
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .delete_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "message": "List deleted" })))
}

pub async fn move_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<i64>,
    Json(body): Json<MoveListBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.move_list";
    if body.board_id.is_none() && body.position.is_none() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "board_id or position is required",
        ));
    }
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    if let Some(new_board_id) = body.board_id {
        store
            .board_access(new_board_id, user_id)
            .map_err(|e| store_error_response(target, e))?;
    }
    let list = store
        .move_list(list_id, body.board_id, body.position)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "list": list })))
}

/// Create a list with the destination board named in the body instead
/// of the path.
pub async fn create_list_from_body(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateListFromBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.create_list";
    let title = match body.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, target, "Title is required")),
    };
    let board_id = body.board_id.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, target, "board_id is required")
    })?;
    let mut store = lock_store(&state, target)?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let list = store
        .create_list(board_id, title, body.position)
        .map_err(|e| store_error_response(target, e))?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "list": list })),
    ))
}
