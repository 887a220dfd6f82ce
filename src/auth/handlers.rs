use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, Profile, RegisterRequest, UsersResponse},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::{check_login, hash_password},
        repo_types::NewUser,
    },
    dto::ApiResponse,
    error::{AppError, StoreError},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/me", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), AppError> {
    let Json(RegisterRequest {
        name,
        email,
        password,
    }) = payload?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::DuplicateUser);
    }

    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    // The unique index is authoritative when two registrations race.
    state
        .users
        .create(NewUser {
            name: &name,
            email: &email,
            password_hash: &password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict => {
                warn!(email = %email, "email registered concurrently");
                AppError::DuplicateUser
            }
            other => other.into(),
        })?;

    info!(email = %email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("User registered successfully")),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(LoginRequest { email, password }) = payload?;

    let user = state.users.find_by_email(&email).await?;

    // unknown emails still pay for a hash verification
    let stored = user.as_ref().map(|u| u.password_hash.clone());
    let ok = tokio::task::spawn_blocking(move || check_login(&password, stored.as_deref()))
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let user = match user {
        Some(user) if ok => user,
        Some(_) => {
            warn!(email = %email, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        None => {
            warn!(email = %email, "login unknown email");
            return Err(AppError::InvalidCredentials);
        }
    };

    let token = JwtKeys::from_ref(&state).sign(&user.email)?;

    info!(email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, AppError> {
    let users = state.users.list_public().await?;
    Ok(Json(UsersResponse {
        success: true,
        message: "Users retrieved successfully".into(),
        users,
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(email): AuthUser,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(ApiResponse::with_data(
        "Profile retrieved successfully",
        Profile {
            name: user.name,
            email: user.email,
        },
    )))
}
