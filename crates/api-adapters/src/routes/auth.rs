use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use domains::User;
use serde::Deserialize;
use services::{AuthSession, Registration};
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::{AuthUser, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterBody {
    #[validate(length(min = 3, max = 32, message = "username must be 3 to 32 characters"))]
    pub username: String,
    #[validate(email(message = "email is not valid"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(max = 64, message = "display name must be at most 64 characters"))]
    pub display_name: Option<String>,
}

/// `identifier` is a username or an email address.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginBody {
    #[serde(alias = "email", alias = "username")]
    #[validate(length(min = 1, message = "identifier is required"))]
    pub identifier: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

async fn register(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RegisterBody>,
) -> ApiResult<ApiResponse<AuthSession>> {
    let session = state
        .services
        .accounts
        .register(Registration {
            username: body.username,
            email: body.email,
            password: body.password,
            display_name: body.display_name,
        })
        .await?;
    Ok(ApiResponse::created(session).message("registered"))
}

async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<LoginBody>,
) -> ApiResult<ApiResponse<AuthSession>> {
    let session = state.services.accounts.login(&body.identifier, &body.password).await?;
    Ok(ApiResponse::ok(session).message("logged in"))
}

async fn me(State(state): State<AppState>, AuthUser(actor): AuthUser) -> ApiResult<ApiResponse<User>> {
    Ok(ApiResponse::ok(state.services.accounts.me(actor).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
}
