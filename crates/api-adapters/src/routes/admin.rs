//! `/admin/*` moderation endpoints plus the user-facing movie-request
//! routes. Role checks live in `AdminService`; these handlers only shape
//! input and output.

use axum::extract::State;
use axum::routing::{delete, get, post, put};
use axum::Router;
use domains::{
    MediaRef, MovieRequest, PageParams, Paged, PlatformStats, RequestStatus, ReviewDecision, Role,
    User,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::parse_kind;
use crate::error::{ApiError, ApiResult};
use crate::extract::{AuthUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct BanBody {
    pub banned: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RoleBody {
    pub role: Role,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReviewBody {
    pub decision: ReviewDecision,
    #[validate(length(max = 1000))]
    pub admin_note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RequestBody {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// ── Users ───────────────────────────────────────────────────────────────────

async fn users(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<User>>> {
    Ok(ApiResponse::ok(state.services.admin.list_users(actor, page.into()).await?))
}

async fn ban(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<BanBody>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.services.admin.set_banned(actor, id, b.banned).await?;
    let message = if b.banned { "user banned" } else { "user unbanned" };
    Ok(ApiResponse::ok(user).message(message))
}

async fn set_role(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<RoleBody>,
) -> ApiResult<ApiResponse<User>> {
    let user = state.services.admin.set_role(actor, id, b.role).await?;
    Ok(ApiResponse::ok(user).message("role updated"))
}

// ── Content ─────────────────────────────────────────────────────────────────

async fn remove_media(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams((kind, id)): PathParams<(String, Uuid)>,
) -> ApiResult<ApiResponse<()>> {
    let target = MediaRef::new(parse_kind(&kind)?, id);
    state.services.admin.remove_media(actor, target).await?;
    Ok(ApiResponse::done("media removed"))
}

async fn remove_comment(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.admin.remove_comment(actor, id).await?;
    Ok(ApiResponse::done("comment removed"))
}

async fn stats(State(state): State<AppState>, AuthUser(actor): AuthUser) -> ApiResult<ApiResponse<PlatformStats>> {
    Ok(ApiResponse::ok(state.services.admin.stats(actor).await?))
}

// ── Movie requests ──────────────────────────────────────────────────────────

async fn list_requests(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(q): QueryParams<RequestQuery>,
) -> ApiResult<ApiResponse<Paged<MovieRequest>>> {
    let status = match q.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(
            RequestStatus::parse(s).ok_or_else(|| ApiError::BadRequest(format!("unknown status '{s}'")))?,
        ),
        None => None,
    };
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let requests = state.services.admin.list_requests(actor, status, page.into()).await?;
    Ok(ApiResponse::ok(requests))
}

async fn review(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<ReviewBody>,
) -> ApiResult<ApiResponse<MovieRequest>> {
    let request = state
        .services
        .admin
        .review_request(actor, id, b.decision, b.admin_note)
        .await?;
    Ok(ApiResponse::ok(request).message("request reviewed"))
}

async fn submit_request(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(b): ValidJson<RequestBody>,
) -> ApiResult<ApiResponse<MovieRequest>> {
    let request = state.services.admin.submit_request(actor, &b.title, b.note).await?;
    Ok(ApiResponse::created(request).message("request submitted"))
}

async fn my_requests(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<MovieRequest>>> {
    Ok(ApiResponse::ok(state.services.admin.my_requests(actor, page.into()).await?))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(my_requests).post(submit_request))
        .route("/admin/users", get(users))
        .route("/admin/users/{id}/ban", put(ban))
        .route("/admin/users/{id}/role", put(set_role))
        .route("/admin/media/{kind}/{id}", delete(remove_media))
        .route("/admin/comments/{id}", delete(remove_comment))
        .route("/admin/requests", get(list_requests))
        .route("/admin/requests/{id}/review", post(review))
        .route("/admin/stats", get(stats))
}
