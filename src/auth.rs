use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{Json, extract::State, http::StatusCode};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::models::{LoginPayload, PublicUser, RegisterPayload, User};
use crate::utils::{db_error, db_error_with_context, validate_string_length};

/// Identity stored in the session cookie after a successful login.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
}

/// Resolves the acting user from the session, or fails with 401.
pub async fn get_current_user(session: &Session) -> Result<CurrentUser, (StatusCode, String)> {
    let user: Option<CurrentUser> = session
        .get(SESSION_USER_KEY)
        .await
        .map_err(|_| (StatusCode::UNAUTHORIZED, ERR_INVALID_SESSION.to_string()))?;

    user.ok_or((StatusCode::UNAUTHORIZED, ERR_UNAUTHORIZED.to_string()))
}

fn validate_username(username: &str) -> Result<(), (StatusCode, String)> {
    validate_string_length(username, "Username", MAX_USERNAME_LENGTH)?;
    if username.trim().len() < MIN_USERNAME_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Username must be at least {} characters", MIN_USERNAME_LENGTH),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), (StatusCode, String)> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

async fn find_user_by_name(
    app_state: &AppState,
    username: &str,
) -> Result<Option<User>, (StatusCode, String)> {
    let conn = app_state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, name, password_hash FROM users WHERE name = ?",
            [username],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query user"))?;

    if let Some(row) = rows.next().await.map_err(|_| db_error())? {
        let id: String = row.get(0).map_err(|_| db_error())?;
        let username: String = row.get(1).map_err(|_| db_error())?;
        let password_hash: String = row.get(2).map_err(|_| db_error())?;
        Ok(Some(User {
            id,
            username,
            password_hash,
        }))
    } else {
        Ok(None)
    }
}

pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    let username = payload.username.trim().to_string();

    if find_user_by_name(&app_state, &username).await?.is_some() {
        return Err((
            StatusCode::CONFLICT,
            "Username already taken".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    let user_id = Uuid::new_v4().to_string();

    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO users (id, name, password_hash) VALUES (?, ?, ?)",
        (user_id.as_str(), username.as_str(), hash.as_str()),
    )
    .await
    .map_err(|_| db_error_with_context("user creation failed"))?;

    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user_id,
            username,
        }),
    ))
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginPayload>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let invalid_credentials = || {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".to_string(),
        )
    };

    let user = find_user_by_name(&app_state, payload.username.trim())
        .await?
        .ok_or_else(invalid_credentials)?;

    let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Stored password hash is invalid".to_string(),
        )
    })?;

    Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| invalid_credentials())?;

    let current_user = CurrentUser {
        id: user.id.clone(),
        username: user.username.clone(),
    };

    session
        .insert(SESSION_USER_KEY, current_user)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to establish session".to_string(),
            )
        })?;

    Ok((
        StatusCode::OK,
        Json(PublicUser {
            id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn me(session: Session) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
    }))
}

pub async fn logout(session: Session) -> Result<StatusCode, (StatusCode, String)> {
    session.flush().await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to clear session".to_string(),
        )
    })?;
    Ok(StatusCode::NO_CONTENT)
}
