use async_trait::async_trait;
use domains::search::{MusicPlan, MusicSort, SearchPlan, TrendingWindow};
use domains::{
    ContentStatus, DomainError, FacetCount, Movie, MovieRepo, Music, MusicRepo, PageRequest, Paged,
    RatingSummary, Result, Short, ShortRepo,
};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::search::{filtered, push_order_and_page, MOVIE_COLUMNS};
use super::{db_err, decode, to_u64, window, PgStore};

type RowResult<T> = std::result::Result<T, sqlx::Error>;

fn movie_from_row(row: &PgRow) -> RowResult<Movie> {
    Ok(Movie {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        genres: row.try_get("genres")?,
        language: row.try_get("language")?,
        director: row.try_get("director")?,
        release_date: row.try_get("release_date")?,
        duration_minutes: row.try_get("duration_minutes")?,
        status: decode(row, "status", ContentStatus::parse)?,
        rating_avg: row.try_get("rating_avg")?,
        rating_count: row.try_get("rating_count")?,
        views: row.try_get("views")?,
        poster_url: row.try_get("poster_url")?,
        video_url: row.try_get("video_url")?,
        uploader_id: row.try_get("uploader_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn movies_from_rows(rows: &[PgRow]) -> Result<Vec<Movie>> {
    rows.iter()
        .map(movie_from_row)
        .collect::<RowResult<_>>()
        .map_err(db_err)
}

const MUSIC_COLUMNS: &str = "id, title, artist, album, genre, duration_seconds, audio_url, \
                             cover_url, plays, uploader_id, created_at";

fn music_from_row(row: &PgRow) -> RowResult<Music> {
    Ok(Music {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        artist: row.try_get("artist")?,
        album: row.try_get("album")?,
        genre: row.try_get("genre")?,
        duration_seconds: row.try_get("duration_seconds")?,
        audio_url: row.try_get("audio_url")?,
        cover_url: row.try_get("cover_url")?,
        plays: row.try_get("plays")?,
        uploader_id: row.try_get("uploader_id")?,
        created_at: row.try_get("created_at")?,
    })
}

const SHORT_COLUMNS: &str = "id, title, description, video_url, views, uploader_id, created_at";

fn short_from_row(row: &PgRow) -> RowResult<Short> {
    Ok(Short {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        video_url: row.try_get("video_url")?,
        views: row.try_get("views")?,
        uploader_id: row.try_get("uploader_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl MovieRepo for PgStore {
    async fn insert(&self, movie: Movie) -> Result<Movie> {
        sqlx::query(&format!(
            "INSERT INTO movies ({MOVIE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)"
        ))
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(&movie.genres)
        .bind(&movie.language)
        .bind(&movie.director)
        .bind(movie.release_date)
        .bind(movie.duration_minutes)
        .bind(movie.status.as_str())
        .bind(movie.rating_avg)
        .bind(movie.rating_count)
        .bind(movie.views)
        .bind(&movie.poster_url)
        .bind(&movie.video_url)
        .bind(movie.uploader_id)
        .bind(movie.created_at)
        .bind(movie.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(movie)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Movie>> {
        let row = sqlx::query(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(movie_from_row).transpose().map_err(db_err)
    }

    async fn update(&self, movie: Movie) -> Result<Movie> {
        let result = sqlx::query(
            "UPDATE movies SET title = $2, description = $3, genres = $4, language = $5, \
             director = $6, release_date = $7, duration_minutes = $8, status = $9, \
             poster_url = $10, video_url = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.description)
        .bind(&movie.genres)
        .bind(&movie.language)
        .bind(&movie.director)
        .bind(movie.release_date)
        .bind(movie.duration_minutes)
        .bind(movie.status.as_str())
        .bind(&movie.poster_url)
        .bind(&movie.video_url)
        .bind(movie.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("movie", movie.id));
        }
        Ok(movie)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Paged<Movie>> {
        let mut qb = filtered(MOVIE_COLUMNS, None, plan);
        push_order_and_page(&mut qb, plan);
        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        let items = movies_from_rows(&rows)?;

        let total: i64 = filtered("COUNT(*)", None, plan)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(items, to_u64(total), plan.page()))
    }

    async fn genre_facets(&self, plan: &SearchPlan) -> Result<Vec<FacetCount>> {
        let mut qb = filtered("min(g) AS genre, COUNT(*) AS count", Some("unnest(movies.genres) g"), plan);
        qb.push(" GROUP BY lower(g) ORDER BY count DESC, genre ASC");
        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter()
            .map(|row| -> RowResult<FacetCount> {
                Ok(FacetCount {
                    genre: row.try_get("genre")?,
                    count: to_u64(row.try_get("count")?),
                })
            })
            .collect::<RowResult<_>>()
            .map_err(db_err)
    }

    async fn trending(&self, window: TrendingWindow) -> Result<Vec<Movie>> {
        let rows = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE status = $1 AND created_at >= $2 \
             ORDER BY views DESC, rating_avg DESC, id ASC LIMIT $3"
        ))
        .bind(ContentStatus::Published.as_str())
        .bind(window.since)
        .bind(i64::from(window.limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        movies_from_rows(&rows)
    }

    async fn in_genres(&self, genres: Vec<String>, exclude: Vec<Uuid>, limit: u32) -> Result<Vec<Movie>> {
        let genres: Vec<String> = genres.iter().map(|g| g.to_lowercase()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE status = $1 AND NOT (id = ANY($2)) \
             AND EXISTS (SELECT 1 FROM unnest(movies.genres) mg WHERE lower(mg) = ANY($3)) \
             ORDER BY rating_avg DESC, views DESC, id ASC LIMIT $4"
        ))
        .bind(ContentStatus::Published.as_str())
        .bind(&exclude)
        .bind(&genres)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        movies_from_rows(&rows)
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE movies SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("movie", id));
        }
        Ok(())
    }

    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> Result<()> {
        let result = sqlx::query("UPDATE movies SET rating_avg = $2, rating_count = $3 WHERE id = $1")
            .bind(id)
            .bind(summary.average)
            .bind(summary.count)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("movie", id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(to_u64(n))
    }
}

/// `WHERE` clause shared by the music page query and its count.
fn music_filtered<'a>(select: &str, plan: &MusicPlan) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM music WHERE TRUE"));
    if let Some(genre) = &plan.genre {
        qb.push(" AND lower(genre) = lower(").push_bind(genre.clone()).push(")");
    }
    if let Some(artist) = &plan.artist {
        qb.push(" AND strpos(lower(artist), ").push_bind(artist.clone()).push(") > 0");
    }
    if let Some(q) = &plan.q {
        qb.push(" AND (strpos(lower(title), ")
            .push_bind(q.clone())
            .push(") > 0 OR strpos(lower(artist), ")
            .push_bind(q.clone())
            .push(") > 0 OR strpos(lower(coalesce(album, '')), ")
            .push_bind(q.clone())
            .push(") > 0)");
    }
    qb
}

#[async_trait]
impl MusicRepo for PgStore {
    async fn insert(&self, music: Music) -> Result<Music> {
        sqlx::query(&format!(
            "INSERT INTO music ({MUSIC_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"
        ))
        .bind(music.id)
        .bind(&music.title)
        .bind(&music.artist)
        .bind(&music.album)
        .bind(&music.genre)
        .bind(music.duration_seconds)
        .bind(&music.audio_url)
        .bind(&music.cover_url)
        .bind(music.plays)
        .bind(music.uploader_id)
        .bind(music.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(music)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Music>> {
        let row = sqlx::query(&format!("SELECT {MUSIC_COLUMNS} FROM music WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(music_from_row).transpose().map_err(db_err)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM music WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, plan: &MusicPlan) -> Result<Paged<Music>> {
        let (limit, offset) = window(plan.page);
        let mut qb = music_filtered(MUSIC_COLUMNS, plan);
        qb.push(match plan.sort {
            MusicSort::Newest => " ORDER BY created_at DESC, id ASC",
            MusicSort::MostPlayed => " ORDER BY plays DESC, id ASC",
        });
        qb.push(" LIMIT ").push_bind(limit).push(" OFFSET ").push_bind(offset);
        let rows = qb.build().fetch_all(&self.pool).await.map_err(db_err)?;
        let items = rows
            .iter()
            .map(music_from_row)
            .collect::<RowResult<_>>()
            .map_err(db_err)?;

        let total: i64 = music_filtered("COUNT(*)", plan)
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(Paged::new(items, to_u64(total), plan.page))
    }

    async fn increment_plays(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE music SET plays = plays + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("music", id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM music")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(to_u64(n))
    }
}

#[async_trait]
impl ShortRepo for PgStore {
    async fn insert(&self, short: Short) -> Result<Short> {
        sqlx::query(&format!("INSERT INTO shorts ({SHORT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"))
            .bind(short.id)
            .bind(&short.title)
            .bind(&short.description)
            .bind(&short.video_url)
            .bind(short.views)
            .bind(short.uploader_id)
            .bind(short.created_at)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(short)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Short>> {
        let row = sqlx::query(&format!("SELECT {SHORT_COLUMNS} FROM shorts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(short_from_row).transpose().map_err(db_err)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM shorts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn feed(&self, page: PageRequest) -> Result<Paged<Short>> {
        let (limit, offset) = window(page);
        let rows = sqlx::query(&format!(
            "SELECT {SHORT_COLUMNS} FROM shorts ORDER BY created_at DESC, id ASC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        let items = rows
            .iter()
            .map(short_from_row)
            .collect::<RowResult<_>>()
            .map_err(db_err)?;
        let total = ShortRepo::count(self).await?;
        Ok(Paged::new(items, total, page))
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE shorts SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("short", id));
        }
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shorts")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(to_u64(n))
    }
}
