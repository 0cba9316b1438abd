//! Movies, music and shorts: CRUD, search, facets, trending and
//! recommendations.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use domains::search::{MovieSearch, MusicSearch, TrendingParams};
use domains::{
    Actor, DomainError, FacetCount, HistoryRepo, MediaKind, MediaRef, Movie, MoviePatch, MovieRepo,
    Music, MusicRepo, NewMovie, NewMusic, NewShort, PageRequest, Paged, Result, Shelf, ShelfRepo,
    Short, ShortRepo,
};
use tracing::info;
use uuid::Uuid;

use crate::media::MediaCascade;
use crate::validate;
use crate::Repositories;

const MAX_GENRES: usize = 10;

pub struct CatalogService {
    movies: Arc<dyn MovieRepo>,
    music: Arc<dyn MusicRepo>,
    shorts: Arc<dyn ShortRepo>,
    shelves: Arc<dyn ShelfRepo>,
    history: Arc<dyn HistoryRepo>,
    cascade: MediaCascade,
}

impl CatalogService {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            movies: repos.movies.clone(),
            music: repos.music.clone(),
            shorts: repos.shorts.clone(),
            shelves: repos.shelves.clone(),
            history: repos.history.clone(),
            cascade: repos.cascade(),
        }
    }

    // ── Movies ──────────────────────────────────────────────────────────────

    pub async fn create_movie(&self, actor: Actor, input: NewMovie) -> Result<Movie> {
        let input = NewMovie {
            title: validate::required("title", &input.title, 200)?,
            description: input.description.trim().to_string(),
            language: validate::required("language", &input.language, 50)?,
            director: input.director.trim().to_string(),
            ..input
        };
        validate::positive("duration_minutes", input.duration_minutes)?;
        let movie = input.into_movie(actor.id);
        if movie.genres.len() > MAX_GENRES {
            return Err(DomainError::validation(format!(
                "a movie may have at most {MAX_GENRES} genres"
            )));
        }
        let movie = self.movies.insert(movie).await?;
        info!(movie_id = %movie.id, uploader = %actor.id, "movie created");
        Ok(movie)
    }

    /// Fetches a movie and counts the view.
    pub async fn get_movie(&self, id: Uuid) -> Result<Movie> {
        let mut movie = self.find_movie(id).await?;
        self.movies.increment_views(id).await?;
        movie.views += 1;
        Ok(movie)
    }

    pub async fn update_movie(&self, actor: Actor, id: Uuid, patch: MoviePatch) -> Result<Movie> {
        let mut movie = self.find_movie(id).await?;
        if !actor.can_manage(movie.uploader_id) {
            return Err(DomainError::forbidden("only the uploader or an admin may edit this movie"));
        }
        let patch = MoviePatch {
            title: patch.title.map(|t| validate::required("title", &t, 200)).transpose()?,
            language: patch
                .language
                .map(|l| validate::required("language", &l, 50))
                .transpose()?,
            description: patch.description.map(|d| d.trim().to_string()),
            director: patch.director.map(|d| d.trim().to_string()),
            ..patch
        };
        validate::positive("duration_minutes", patch.duration_minutes)?;
        patch.apply(&mut movie);
        if movie.genres.len() > MAX_GENRES {
            return Err(DomainError::validation(format!(
                "a movie may have at most {MAX_GENRES} genres"
            )));
        }
        self.movies.update(movie).await
    }

    pub async fn delete_movie(&self, actor: Actor, id: Uuid) -> Result<()> {
        let movie = self.find_movie(id).await?;
        if !actor.can_manage(movie.uploader_id) {
            return Err(DomainError::forbidden("only the uploader or an admin may delete this movie"));
        }
        self.movies.delete(id).await?;
        self.cascade.purge(MediaRef::movie(id)).await?;
        info!(movie_id = %id, by = %actor.id, "movie deleted");
        Ok(())
    }

    pub async fn search_movies(&self, search: &MovieSearch) -> Result<Paged<Movie>> {
        let plan = search.plan()?;
        self.movies.search(&plan).await
    }

    pub async fn movie_facets(&self, search: &MovieSearch) -> Result<Vec<FacetCount>> {
        let plan = search.plan()?;
        self.movies.genre_facets(&plan).await
    }

    pub async fn trending(&self, params: TrendingParams) -> Result<Vec<Movie>> {
        self.movies.trending(params.window(Utc::now())).await
    }

    /// Movies in the genres of the user's favorites, watchlist and history,
    /// minus anything already watched or favorited. Genres are ranked by how
    /// often they appear in those signals. Users without any signal get the
    /// trending list.
    pub async fn recommendations(&self, actor: Actor, limit: Option<u32>) -> Result<Vec<Movie>> {
        let limit = PageRequest::new(None, limit).limit();

        let favorites = self.shelves.targets(actor.id, Shelf::Favorites).await?;
        let watchlist = self.shelves.targets(actor.id, Shelf::Watchlist).await?;
        let watched = self.history.targets(actor.id).await?;

        let mut unique = HashSet::new();
        let exclude: Vec<Uuid> = movie_ids(favorites.into_iter().chain(watched))
            .filter(|id| unique.insert(*id))
            .collect();
        let mut signals = exclude.clone();
        signals.extend(movie_ids(watchlist).filter(|id| unique.insert(*id)));

        let mut weights: HashMap<String, (usize, String)> = HashMap::new();
        for id in &signals {
            if let Some(movie) = self.movies.get(*id).await? {
                for genre in movie.genres {
                    weights.entry(genre.to_lowercase()).or_insert((0, genre)).0 += 1;
                }
            }
        }

        if weights.is_empty() {
            let window = TrendingParams {
                days: None,
                limit: Some(limit),
            };
            return self.trending(window).await;
        }

        let mut ranked: Vec<(usize, String)> = weights.into_values().collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        let genres = ranked.into_iter().map(|(_, g)| g).collect();

        self.movies.in_genres(genres, exclude, limit).await
    }

    async fn find_movie(&self, id: Uuid) -> Result<Movie> {
        self.movies
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("movie", id))
    }

    // ── Music ───────────────────────────────────────────────────────────────

    pub async fn create_music(&self, actor: Actor, input: NewMusic) -> Result<Music> {
        let input = NewMusic {
            title: validate::required("title", &input.title, 200)?,
            artist: validate::required("artist", &input.artist, 200)?,
            genre: validate::required("genre", &input.genre, 50)?,
            album: validate::optional("album", input.album, 200)?,
            ..input
        };
        validate::positive("duration_seconds", input.duration_seconds)?;
        let track = self.music.insert(input.into_music(actor.id)).await?;
        info!(music_id = %track.id, uploader = %actor.id, "track created");
        Ok(track)
    }

    pub async fn get_music(&self, id: Uuid) -> Result<Music> {
        self.music
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("music", id))
    }

    pub async fn search_music(&self, search: &MusicSearch) -> Result<Paged<Music>> {
        self.music.search(&search.plan()).await
    }

    pub async fn record_play(&self, id: Uuid) -> Result<Music> {
        let mut track = self.get_music(id).await?;
        self.music.increment_plays(id).await?;
        track.plays += 1;
        Ok(track)
    }

    pub async fn delete_music(&self, actor: Actor, id: Uuid) -> Result<()> {
        let track = self.get_music(id).await?;
        if !actor.can_manage(track.uploader_id) {
            return Err(DomainError::forbidden("only the uploader or an admin may delete this track"));
        }
        self.music.delete(id).await?;
        self.cascade.purge(MediaRef::new(MediaKind::Music, id)).await
    }

    // ── Shorts ──────────────────────────────────────────────────────────────

    pub async fn create_short(&self, actor: Actor, input: NewShort) -> Result<Short> {
        let input = NewShort {
            title: validate::required("title", &input.title, 200)?,
            video_url: validate::required("video_url", &input.video_url, 2048)?,
            description: validate::optional("description", input.description, 2000)?,
        };
        let short = self.shorts.insert(input.into_short(actor.id)).await?;
        info!(short_id = %short.id, uploader = %actor.id, "short created");
        Ok(short)
    }

    pub async fn get_short(&self, id: Uuid) -> Result<Short> {
        let mut short = self
            .shorts
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("short", id))?;
        self.shorts.increment_views(id).await?;
        short.views += 1;
        Ok(short)
    }

    pub async fn feed(&self, page: PageRequest) -> Result<Paged<Short>> {
        self.shorts.feed(page).await
    }

    pub async fn delete_short(&self, actor: Actor, id: Uuid) -> Result<()> {
        let short = self
            .shorts
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found("short", id))?;
        if !actor.can_manage(short.uploader_id) {
            return Err(DomainError::forbidden("only the uploader or an admin may delete this short"));
        }
        self.shorts.delete(id).await?;
        self.cascade.purge(MediaRef::new(MediaKind::Short, id)).await
    }
}

fn movie_ids(targets: impl IntoIterator<Item = MediaRef>) -> impl Iterator<Item = Uuid> {
    targets
        .into_iter()
        .filter(|t| t.kind == MediaKind::Movie)
        .map(|t| t.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::search::TrendingWindow;
    use domains::{
        MockCommentRepo, MockFollowRepo, MockHistoryRepo, MockListRepo, MockMovieRepo,
        MockMovieRequestRepo, MockMusicRepo, MockNotificationRepo, MockRatingRepo, MockShelfRepo,
        MockShortRepo, MockUserRepo, Role,
    };

    struct Mocks {
        movies: MockMovieRepo,
        shelves: MockShelfRepo,
        history: MockHistoryRepo,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                movies: MockMovieRepo::new(),
                shelves: MockShelfRepo::new(),
                history: MockHistoryRepo::new(),
            }
        }

        fn build(self) -> CatalogService {
            let mut comments = MockCommentRepo::new();
            comments.expect_purge_target().returning(|_| Ok(0));
            let mut ratings = MockRatingRepo::new();
            ratings.expect_purge_target().returning(|_| Ok(0));
            let mut lists = MockListRepo::new();
            lists.expect_purge_target().returning(|_| Ok(0));
            let mut shelves = self.shelves;
            shelves.expect_purge_target().returning(|_| Ok(0));
            let mut history = self.history;
            history.expect_purge_target().returning(|_| Ok(0));

            CatalogService::new(&Repositories {
                users: Arc::new(MockUserRepo::new()),
                movies: Arc::new(self.movies),
                music: Arc::new(MockMusicRepo::new()),
                shorts: Arc::new(MockShortRepo::new()),
                comments: Arc::new(comments),
                ratings: Arc::new(ratings),
                shelves: Arc::new(shelves),
                history: Arc::new(history),
                follows: Arc::new(MockFollowRepo::new()),
                lists: Arc::new(lists),
                notifications: Arc::new(MockNotificationRepo::new()),
                requests: Arc::new(MockMovieRequestRepo::new()),
            })
        }
    }

    fn sample(uploader: Uuid, genres: &[&str]) -> Movie {
        NewMovie {
            title: "Arrival".into(),
            language: "English".into(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            ..Default::default()
        }
        .into_movie(uploader)
    }

    #[tokio::test]
    async fn create_movie_requires_title() {
        let svc = Mocks::new().build();
        let actor = Actor::new(Uuid::new_v4(), Role::User);
        let err = svc
            .create_movie(
                actor,
                NewMovie {
                    title: "  ".into(),
                    language: "English".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn update_movie_trims_and_validates_like_create() {
        let owner = Uuid::new_v4();
        let movie = sample(owner, &["Drama"]);
        let id = movie.id;
        let mut mocks = Mocks::new();
        mocks
            .movies
            .expect_get()
            .returning(move |_| Ok(Some(movie.clone())));
        mocks
            .movies
            .expect_update()
            .withf(|m: &Movie| m.title == "Arrival (2016)" && m.language == "English")
            .times(1)
            .returning(|m| Ok(m));
        let svc = mocks.build();
        let actor = Actor::new(owner, Role::User);

        let blank_language = MoviePatch {
            language: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(
            svc.update_movie(actor, id, blank_language).await,
            Err(DomainError::Validation(_))
        ));

        let patch = MoviePatch {
            title: Some("  Arrival (2016) ".into()),
            language: Some(" English".into()),
            ..Default::default()
        };
        let updated = svc.update_movie(actor, id, patch).await.unwrap();
        assert_eq!(updated.title, "Arrival (2016)");
    }

    #[tokio::test]
    async fn get_movie_counts_the_view() {
        let movie = sample(Uuid::new_v4(), &["Drama"]);
        let id = movie.id;
        let mut mocks = Mocks::new();
        mocks
            .movies
            .expect_get()
            .returning(move |_| Ok(Some(movie.clone())));
        mocks.movies.expect_increment_views().times(1).returning(|_| Ok(()));

        let got = mocks.build().get_movie(id).await.unwrap();
        assert_eq!(got.views, 1);
    }

    #[tokio::test]
    async fn strangers_cannot_delete_movies_but_admins_can() {
        let movie = sample(Uuid::new_v4(), &["Drama"]);
        let id = movie.id;
        let mut mocks = Mocks::new();
        mocks
            .movies
            .expect_get()
            .returning(move |_| Ok(Some(movie.clone())));
        mocks.movies.expect_delete().times(1).returning(|_| Ok(true));
        let svc = mocks.build();

        let stranger = Actor::new(Uuid::new_v4(), Role::User);
        assert!(matches!(
            svc.delete_movie(stranger, id).await,
            Err(DomainError::Forbidden(_))
        ));
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        svc.delete_movie(admin, id).await.unwrap();
    }

    #[tokio::test]
    async fn recommendations_fall_back_to_trending_without_signals() {
        let mut mocks = Mocks::new();
        mocks.shelves.expect_targets().returning(|_, _| Ok(vec![]));
        mocks.history.expect_targets().returning(|_| Ok(vec![]));
        mocks
            .movies
            .expect_trending()
            .withf(|w: &TrendingWindow| w.limit == 5)
            .times(1)
            .returning(|_| Ok(vec![]));

        let actor = Actor::new(Uuid::new_v4(), Role::User);
        let recs = mocks.build().recommendations(actor, Some(5)).await.unwrap();
        assert!(recs.is_empty());
    }

    #[tokio::test]
    async fn recommendations_use_dominant_genres_and_exclude_seen() {
        let fav = sample(Uuid::new_v4(), &["Sci-Fi", "Drama"]);
        let watched = sample(Uuid::new_v4(), &["sci-fi"]);
        let (fav_id, watched_id) = (fav.id, watched.id);

        let mut mocks = Mocks::new();
        mocks.shelves.expect_targets().returning(move |_, shelf| {
            Ok(match shelf {
                Shelf::Favorites => vec![MediaRef::movie(fav_id)],
                Shelf::Watchlist => vec![],
            })
        });
        mocks
            .history
            .expect_targets()
            .returning(move |_| Ok(vec![MediaRef::movie(watched_id), MediaRef::movie(fav_id)]));
        mocks.movies.expect_get().returning(move |id| {
            Ok(if id == fav_id {
                Some(fav.clone())
            } else {
                Some(watched.clone())
            })
        });
        mocks
            .movies
            .expect_in_genres()
            .withf(move |genres, exclude, limit| {
                genres.first().map(|g| g.eq_ignore_ascii_case("sci-fi")) == Some(true)
                    && exclude.len() == 2
                    && exclude.contains(&fav_id)
                    && exclude.contains(&watched_id)
                    && *limit == 20
            })
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let actor = Actor::new(Uuid::new_v4(), Role::User);
        mocks.build().recommendations(actor, None).await.unwrap();
    }

    #[tokio::test]
    async fn watchlisted_movies_inform_genres_but_stay_recommendable() {
        let fav = sample(Uuid::new_v4(), &["Sci-Fi"]);
        let queued = sample(Uuid::new_v4(), &["Western"]);
        let (fav_id, queued_id) = (fav.id, queued.id);

        let mut mocks = Mocks::new();
        mocks.shelves.expect_targets().returning(move |_, shelf| {
            Ok(match shelf {
                Shelf::Favorites => vec![MediaRef::movie(fav_id)],
                Shelf::Watchlist => vec![MediaRef::movie(queued_id)],
            })
        });
        mocks.history.expect_targets().returning(|_| Ok(vec![]));
        mocks.movies.expect_get().returning(move |id| {
            Ok(Some(if id == fav_id { fav.clone() } else { queued.clone() }))
        });
        mocks
            .movies
            .expect_in_genres()
            .withf(move |genres, exclude, _| {
                genres.len() == 2 && genres.contains(&"Western".to_string()) && exclude == &vec![fav_id]
            })
            .times(1)
            .returning(|_, _, _| Ok(vec![]));

        let actor = Actor::new(Uuid::new_v4(), Role::User);
        mocks.build().recommendations(actor, None).await.unwrap();
    }

    #[tokio::test]
    async fn invalid_search_never_reaches_storage() {
        let svc = Mocks::new().build();
        let search = MovieSearch {
            min_rating: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            svc.search_movies(&search).await,
            Err(DomainError::Validation(_))
        ));
    }
}
