use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{api_error, lock_store, store_error_response, ApiError};
use crate::auth::AuthUser;
use crate::state::AppState;
use crate::store::CardChanges;

#[derive(Deserialize)]
pub struct UpdateCardBody {
    title: Option<String>,
    description: Option<String>,
    due_date: Option<DateTime<Utc>>,
    archived: Option<bool>,
    list_id: Option<i64>,
    position: Option<i64>,
}

#[derive(Deserialize)]
pub struct MoveCardBody {
    list_id: Option<i64>,
    position: Option<i64>,
}

#[derive(Deserialize)]
pub struct CreateCardBody {
    title: Option<String>,
    description: Option<String>,
    position: Option<i64>,
    due_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct CreateCardFromBody {
    title: Option<String>,
    description: Option<String>,
    list_id: Option<i64>,
    position: Option<i64>,
    due_date: Option<DateTime<Utc>>,
}

pub async fn list_cards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.list_cards";
    let store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let cards = store
        .cards_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "cards": cards })))
}

pub async fn create_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(list_id): Path<i64>,
    Json(body): Json<CreateCardBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.create_card";
    let title = match body.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, target, "Title is required")),
    };
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let card = store
        .create_card(list_id, title, body.description, body.position, body.due_date)
        .map_err(|e| store_error_response(target, e))?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "card": card })),
    ))
}

/// Create a card with the destination list named in the body instead
/// of the path.
pub async fn create_card_from_body(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateCardFromBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.create_card";
    let title = match body.title {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(api_error(StatusCode::BAD_REQUEST, target, "Title is required")),
    };
    let list_id = body.list_id.ok_or_else(|| {
        api_error(StatusCode::BAD_REQUEST, target, "list_id is required")
    })?;
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_list(list_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let card = store
        .create_card(list_id, title, body.description, body.position, body.due_date)
        .map_err(|e| store_error_response(target, e))?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "card": card })),
    ))
}

pub async fn get_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(card_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.get_card";
    let store = lock_store(&state, target)?;
    let board_id = store
        .board_of_card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let card = store
        .card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "card": card })))
}

pub async fn update_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(card_id): Path<i64>,
    Json(body): Json<UpdateCardBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.update_card";
    if body.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "Title cannot be empty",
        ));
    }
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    // Moving into a list on another board needs access there too.
    if let Some(new_list_id) = body.list_id {
        let dest_board_id = store
            .board_of_list(new_list_id)
            .map_err(|e| store_error_response(target, e))?;
        store
            .board_access(dest_board_id, user_id)
            .map_err(|e| store_error_response(target, e))?;
    }
    let changes = CardChanges {
        title: body.title,
        description: body.description,
        due_date: body.due_date,
        archived: body.archived,
        list_id: body.list_id,
        position: body.position,
    };
    let card = store
        .update_card(card_id, changes)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "card": card })))
}

pub async fn delete_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(card_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.delete_card";
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .delete_card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "message": "Card deleted" })))
}

pub async fn move_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(card_id): Path<i64>,
    Json(body): Json<MoveCardBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.move_card";
    if body.list_id.is_none() && body.position.is_none() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "list_id or position is required",
        ));
    }
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    if let Some(new_list_id) = body.list_id {
        let dest_board_id = store
            .board_of_list(new_list_id)
            .map_err(|e| store_error_response(target, e))?;
        store
            .board_access(dest_board_id, user_id)
            .map_err(|e| store_error_response(target, e))?;
    }
    let card = store
        .move_card(card_id, body.list_id, body.position)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "card": card })))
}

pub async fn archive_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(card_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_archived(state, user_id, card_id, true).await
}

pub async fn unarchive_card(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(card_id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    set_archived(state, user_id, card_id, false).await
}

async fn set_archived(
    state: AppState,
    user_id: i64,
    card_id: i64,
    archived: bool,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.archive_card";
    let mut store = lock_store(&state, target)?;
    let board_id = store
        .board_of_card(card_id)
        .map_err(|e| store_error_response(target, e))?;
    store
        .board_access(board_id, user_id)
        .map_err(|e| store_error_response(target, e))?;
    let card = store
        .set_card_archived(card_id, archived)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "card": card })))
}
