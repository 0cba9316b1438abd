use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use domains::search::MusicSearch;
use domains::{Music, NewMusic, Paged};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::{AuthUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MusicBody {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 200))]
    pub artist: String,
    #[validate(length(max = 200))]
    pub album: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub genre: String,
    #[validate(range(min = 1))]
    pub duration_seconds: Option<i32>,
    #[validate(url)]
    pub audio_url: Option<String>,
    #[validate(url)]
    pub cover_url: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<MusicSearch>,
) -> ApiResult<ApiResponse<Paged<Music>>> {
    Ok(ApiResponse::ok(state.services.catalog.search_music(&q).await?))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(b): ValidJson<MusicBody>,
) -> ApiResult<ApiResponse<Music>> {
    let input = NewMusic {
        title: b.title,
        artist: b.artist,
        album: b.album,
        genre: b.genre,
        duration_seconds: b.duration_seconds,
        audio_url: b.audio_url,
        cover_url: b.cover_url,
    };
    Ok(ApiResponse::created(state.services.catalog.create_music(actor, input).await?))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<Uuid>) -> ApiResult<ApiResponse<Music>> {
    Ok(ApiResponse::ok(state.services.catalog.get_music(id).await?))
}

async fn play(State(state): State<AppState>, PathParams(id): PathParams<Uuid>) -> ApiResult<ApiResponse<Music>> {
    Ok(ApiResponse::ok(state.services.catalog.record_play(id).await?).message("play recorded"))
}

async fn destroy(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.catalog.delete_music(actor, id).await?;
    Ok(ApiResponse::done("deleted"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/music", get(search).post(create))
        .route("/music/{id}", get(show).delete(destroy))
        .route("/music/{id}/play", post(play))
}
