//! Movie catalog: search, facets, trending, recommendations and CRUD.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use chrono::NaiveDate;
use domains::search::{MovieSearch, TrendingParams};
use domains::{ContentStatus, FacetCount, Movie, MoviePatch, NewMovie, Paged};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiResult;
use crate::extract::{AuthUser, PathParams, QueryParams, ValidJson};
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MovieBody {
    #[validate(length(min = 1, max = 200, message = "title must be 1 to 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    #[serde(default)]
    #[validate(length(max = 10, message = "a movie may have at most 10 genres"))]
    pub genres: Vec<String>,
    #[validate(length(min = 1, max = 50))]
    pub language: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub director: String,
    pub release_date: Option<NaiveDate>,
    #[validate(range(min = 1, message = "durationMinutes must be positive"))]
    pub duration_minutes: Option<i32>,
    pub status: Option<ContentStatus>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

impl From<MovieBody> for NewMovie {
    fn from(b: MovieBody) -> Self {
        NewMovie {
            title: b.title,
            description: b.description,
            genres: b.genres,
            language: b.language,
            director: b.director,
            release_date: b.release_date,
            duration_minutes: b.duration_minutes,
            status: b.status,
            poster_url: b.poster_url,
            video_url: b.video_url,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatchBody {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(length(max = 10))]
    pub genres: Option<Vec<String>>,
    #[validate(length(min = 1, max = 50))]
    pub language: Option<String>,
    #[validate(length(max = 200))]
    pub director: Option<String>,
    pub release_date: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub duration_minutes: Option<i32>,
    pub status: Option<ContentStatus>,
    #[validate(url)]
    pub poster_url: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
}

impl From<MoviePatchBody> for MoviePatch {
    fn from(b: MoviePatchBody) -> Self {
        MoviePatch {
            title: b.title,
            description: b.description,
            genres: b.genres,
            language: b.language,
            director: b.director,
            release_date: b.release_date,
            duration_minutes: b.duration_minutes,
            status: b.status,
            poster_url: b.poster_url,
            video_url: b.video_url,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

async fn search(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<MovieSearch>,
) -> ApiResult<ApiResponse<Paged<Movie>>> {
    Ok(ApiResponse::ok(state.services.catalog.search_movies(&q).await?))
}

async fn facets(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<MovieSearch>,
) -> ApiResult<ApiResponse<Vec<FacetCount>>> {
    Ok(ApiResponse::ok(state.services.catalog.movie_facets(&q).await?))
}

async fn trending(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<TrendingParams>,
) -> ApiResult<ApiResponse<Vec<Movie>>> {
    Ok(ApiResponse::ok(state.services.catalog.trending(params).await?))
}

async fn recommendations(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    QueryParams(params): QueryParams<LimitParams>,
) -> ApiResult<ApiResponse<Vec<Movie>>> {
    let movies = state.services.catalog.recommendations(actor, params.limit).await?;
    Ok(ApiResponse::ok(movies))
}

async fn create(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    ValidJson(body): ValidJson<MovieBody>,
) -> ApiResult<ApiResponse<Movie>> {
    let movie = state.services.catalog.create_movie(actor, body.into()).await?;
    Ok(ApiResponse::created(movie))
}

async fn show(State(state): State<AppState>, PathParams(id): PathParams<Uuid>) -> ApiResult<ApiResponse<Movie>> {
    Ok(ApiResponse::ok(state.services.catalog.get_movie(id).await?))
}

async fn update(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
    ValidJson(body): ValidJson<MoviePatchBody>,
) -> ApiResult<ApiResponse<Movie>> {
    let movie = state.services.catalog.update_movie(actor, id, body.into()).await?;
    Ok(ApiResponse::ok(movie).message("updated"))
}

async fn destroy(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    PathParams(id): PathParams<Uuid>,
) -> ApiResult<ApiResponse<()>> {
    state.services.catalog.delete_movie(actor, id).await?;
    Ok(ApiResponse::done("deleted"))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(search).post(create))
        .route("/movies/facets", get(facets))
        .route("/movies/trending", get(trending))
        .route("/movies/recommendations", get(recommendations))
        .route("/movies/{id}", get(show).patch(update).delete(destroy))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_body_rejects_blank_title_and_too_many_genres() {
        let body = MovieBody {
            title: String::new(),
            description: String::new(),
            genres: (0..11).map(|i| format!("g{i}")).collect(),
            language: "English".into(),
            director: String::new(),
            release_date: None,
            duration_minutes: Some(0),
            status: None,
            poster_url: Some("not a url".into()),
            video_url: None,
        };
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        for f in ["title", "genres", "duration_minutes", "poster_url"] {
            assert!(fields.contains_key(f), "missing error for {f}");
        }
    }

    #[test]
    fn patch_body_accepts_partial_updates() {
        let body: MoviePatchBody = serde_json::from_str(r#"{"title":"Heat","durationMinutes":170}"#).unwrap();
        assert!(body.validate().is_ok());
        let patch = MoviePatch::from(body);
        assert_eq!(patch.title.as_deref(), Some("Heat"));
        assert_eq!(patch.duration_minutes, Some(170));
        assert!(patch.genres.is_none());
    }
}
