use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::Router;
use domains::{Follow, PageParams, Paged, ProfilePatch, PublicProfile, User};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::{AuthUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    #[validate(length(min = 1, max = 64))]
    pub display_name: Option<String>,
    #[validate(url(message = "avatarUrl must be a URL"))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
}

async fn profile(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<PublicProfile>> {
    Ok(ApiResponse::ok(state.services.accounts.profile(id).await?))
}

async fn update_me(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(body): ValidJson<ProfileBody>,
) -> ApiResult<ApiResponse<User>> {
    let patch = ProfilePatch {
        display_name: body.display_name,
        avatar_url: body.avatar_url,
        bio: body.bio,
    };
    let user = state.services.accounts.update_profile(actor, patch).await?;
    Ok(ApiResponse::ok(user).message("profile updated"))
}

async fn follow(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<Follow>> {
    Ok(ApiResponse::created(state.services.social.follow(actor, id).await?).message("followed"))
}

async fn unfollow(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.social.unfollow(actor, id).await?;
    Ok(ApiResponse::done("unfollowed"))
}

async fn followers(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<Follow>>> {
    Ok(ApiResponse::ok(state.services.social.followers(id, page.into()).await?))
}

async fn following(
    State(state): State<AppState>,
    PathParams(id): PathParams<Uuid>,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<Follow>>> {
    Ok(ApiResponse::ok(state.services.social.following(id, page.into()).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", patch(update_me))
        .route("/users/{id}", get(profile))
        .route("/users/{id}/follow", post(follow).delete(unfollow))
        .route("/users/{id}/followers", get(followers))
        .route("/users/{id}/following", get(following))
}
