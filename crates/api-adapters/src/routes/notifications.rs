use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use domains::{Notification, PageParams, Paged};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::extract::{AuthUser, PathParams, QueryParams};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread: bool,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

async fn list(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(q): QueryParams<NotificationQuery>,
) -> ApiResult<ApiResponse<Paged<Notification>>> {
    let page = PageParams {
        page: q.page,
        limit: q.limit,
    };
    let items = state.services.notifications.list(actor, q.unread, page.into()).await?;
    Ok(ApiResponse::ok(items))
}

async fn unread_count(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<ApiResponse<UnreadCount>> {
    let count = state.services.notifications.unread_count(actor).await?;
    Ok(ApiResponse::ok(UnreadCount { count }))
}

async fn mark_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.notifications.mark_read(actor, id).await?;
    Ok(ApiResponse::done("marked as read"))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
) -> ApiResult<ApiResponse<u64>> {
    let updated = state.services.notifications.mark_all_read(actor).await?;
    Ok(ApiResponse::ok(updated).message("all marked as read"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
}
