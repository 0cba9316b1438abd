use axum::extract::State;
use axum::routing::get;
use axum::Router;
use domains::{NewShort, PageParams, Paged, Short};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::{AuthUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortBody {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(url(message = "videoUrl must be a URL"))]
    pub video_url: String,
}

async fn feed(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<Short>>> {
    Ok(ApiResponse::ok(state.services.catalog.feed(page.into()).await?))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(b): ValidJson<ShortBody>,
) -> ApiResult<ApiResponse<Short>> {
    let input = NewShort {
        title: b.title,
        description: b.description,
        video_url: b.video_url,
    };
    Ok(ApiResponse::created(state.services.catalog.create_short(actor, input).await?))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<Uuid>) -> ApiResult<ApiResponse<Short>> {
    Ok(ApiResponse::ok(state.services.catalog.get_short(id).await?))
}

async fn destroy(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.catalog.delete_short(actor, id).await?;
    Ok(ApiResponse::done("deleted"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shorts", get(feed).post(create))
        .route("/shorts/{id}", get(show).delete(destroy))
}
