pub mod admin;
pub mod auth;
pub mod engagement;
pub mod lists;
pub mod movies;
pub mod music;
pub mod notifications;
pub mod shorts;
pub mod users;

use axum::Router;
use domains::{MediaKind, Shelf};

use crate::error::ApiError;
use crate::state::AppState;

/// Everything mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(users::routes())
        .merge(movies::routes())
        .merge(music::routes())
        .merge(shorts::routes())
        .merge(engagement::routes())
        .merge(lists::routes())
        .merge(notifications::routes())
        .merge(admin::routes())
}

/// Plural collection segment: `movies`, `music`, `shorts`.
pub(crate) fn media_segment(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => "movies",
        MediaKind::Music => "music",
        MediaKind::Short => "shorts",
    }
}

pub(crate) fn parse_kind(segment: &str) -> Result<MediaKind, ApiError> {
    MediaKind::from_segment(segment).ok_or(ApiError::RouteNotFound)
}

pub(crate) fn parse_shelf(segment: &str) -> Result<Shelf, ApiError> {
    Shelf::parse(segment).ok_or(ApiError::RouteNotFound)
}
