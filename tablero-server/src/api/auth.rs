use std::sync::OnceLock;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
};
use regex::Regex;
use serde::Deserialize;

use super::{api_error, lock_store, store_error_response, ApiError};
use crate::auth::{bearer_token, hash_password, verify_password, AuthUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    username: Option<String>,
    password: Option<String>,
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .unwrap_or_else(|e| panic!("invalid email pattern: {}", e))
    })
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let target = "tablero.api.register";
    let (username, email, password) = match (body.username, body.email, body.password) {
        (Some(u), Some(e), Some(p)) if !u.is_empty() && !e.is_empty() && !p.is_empty() => {
            (u, e, p)
        }
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                target,
                "Missing username, email, or password",
            ))
        }
    };
    if !email_regex().is_match(&email) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "Invalid email format",
        ));
    }
    if password.len() < 6 {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            target,
            "Password must be at least 6 characters",
        ));
    }

    let mut store = lock_store(&state, target)?;
    let user = store
        .create_user(username, email, hash_password(&password))
        .map_err(|e| store_error_response(target, e))?;

    let access_token = state
        .tokens
        .issue_access(user.id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, target, e.to_string()))?;
    let refresh_token = state
        .tokens
        .issue_refresh(user.id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, target, e.to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "user": user,
        })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.login";
    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                target,
                "Missing username or password",
            ))
        }
    };

    let store = lock_store(&state, target)?;
    let user = store
        .user_by_username(&username)
        .filter(|u| verify_password(&u.password_hash, &password))
        .ok_or_else(|| {
            api_error(
                StatusCode::UNAUTHORIZED,
                target,
                "Invalid username or password",
            )
        })?;

    let access_token = state
        .tokens
        .issue_access(user.id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, target, e.to_string()))?;
    let refresh_token = state
        .tokens
        .issue_refresh(user.id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, target, e.to_string()))?;

    log::info!("[auth] User {} logged in", user.id);
    Ok(Json(serde_json::json!({
        "access_token": access_token,
        "refresh_token": refresh_token,
        "user": user,
    })))
}

/// Exchange a refresh token for a fresh access token. The refresh token
/// rides in the Authorization header like an access token would.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.refresh";
    let token = bearer_token(&headers)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, target, "Missing bearer token"))?;
    let user_id = state
        .tokens
        .verify_refresh(token)
        .map_err(|e| api_error(StatusCode::UNAUTHORIZED, target, e.to_string()))?;

    let access_token = state
        .tokens
        .issue_access(user_id)
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, target, e.to_string()))?;
    Ok(Json(serde_json::json!({ "access_token": access_token })))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let target = "tablero.api.me";
    let store = lock_store(&state, target)?;
    let user = store
        .user(user_id)
        .map_err(|e| store_error_response(target, e))?;
    Ok(Json(serde_json::json!({ "user": user })))
}
