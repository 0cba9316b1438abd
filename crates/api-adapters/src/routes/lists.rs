use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::Router;
use domains::{ListPatch, MediaKind, MediaRef, PageParams, Paged, UserList};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::parse_kind;
use crate::error::ApiResult;
use crate::extract::{AuthUser, MaybeUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListBody {
    #[validate(length(min = 1, max = 100, message = "name must be 1 to 100 characters"))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListPatchBody {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ItemBody {
    pub kind: MediaKind,
    pub id: Uuid,
}

async fn mine(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<UserList>>> {
    Ok(ApiResponse::ok(state.services.social.my_lists(actor, page.into()).await?))
}

async fn public(
    State(state): State<AppState>,
    QueryParams(page): QueryParams<PageParams>,
) -> ApiResult<ApiResponse<Paged<UserList>>> {
    Ok(ApiResponse::ok(state.services.social.public_lists(page.into()).await?))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(b): ValidJson<ListBody>,
) -> ApiResult<ApiResponse<UserList>> {
    let list = state
        .services
        .social
        .create_list(actor, &b.name, b.description, b.is_public)
        .await?;
    Ok(ApiResponse::created(list))
}

async fn show(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<UserList>> {
    Ok(ApiResponse::ok(state.services.social.get_list(viewer, id).await?))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<ListPatchBody>,
) -> ApiResult<ApiResponse<UserList>> {
    let patch = ListPatch {
        name: b.name,
        description: b.description,
        is_public: b.is_public,
    };
    let list = state.services.social.update_list(actor, id, patch).await?;
    Ok(ApiResponse::ok(list).message("updated"))
}

async fn destroy(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.social.delete_list(actor, id).await?;
    Ok(ApiResponse::done("deleted"))
}

async fn add_item(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(b): ValidJson<ItemBody>,
) -> ApiResult<ApiResponse<UserList>> {
    let list = state
        .services
        .social
        .add_to_list(actor, id, MediaRef::new(b.kind, b.id))
        .await?;
    Ok(ApiResponse::created(list).message("added to list"))
}

async fn remove_item(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams((id, kind, media_id)): PathParams<(Uuid, String, Uuid)>,
) -> ApiResult<ApiResponse<UserList>> {
    let target = MediaRef::new(parse_kind(&kind)?, media_id);
    let list = state.services.social.remove_from_list(actor, id, target).await?;
    Ok(ApiResponse::ok(list).message("removed from list"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/lists", get(mine).post(create))
        .route("/lists/public", get(public))
        .route("/lists/{id}", get(show).patch(update).delete(destroy))
        .route("/lists/{id}/items", post(add_item))
        .route("/lists/{id}/items/{kind}/{media_id}", delete(remove_item))
}
