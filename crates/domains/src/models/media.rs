use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which catalog a piece of media lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Music,
    Short,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Music => "music",
            MediaKind::Short => "short",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "movie" => Some(MediaKind::Movie),
            "music" => Some(MediaKind::Music),
            "short" => Some(MediaKind::Short),
            _ => None,
        }
    }

    /// Parses the plural URL segment (`movies`, `music`, `shorts`).
    pub fn from_segment(s: &str) -> Option<Self> {
        match s {
            "movies" => Some(MediaKind::Movie),
            "music" => Some(MediaKind::Music),
            "shorts" => Some(MediaKind::Short),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Polymorphic pointer at a movie, track or short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub id: Uuid,
}

impl MediaRef {
    pub fn new(kind: MediaKind, id: Uuid) -> Self {
        Self { kind, id }
    }

    pub fn movie(id: Uuid) -> Self {
        Self::new(MediaKind::Movie, id)
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Some(ContentStatus::Draft),
            "published" => Some(ContentStatus::Published),
            "archived" => Some(ContentStatus::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub genres: Vec<String>,
    pub language: String,
    pub director: String,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub status: ContentStatus,
    pub rating_avg: f64,
    pub rating_count: i64,
    pub views: i64,
    pub poster_url: Option<String>,
    pub video_url: Option<String>,
    pub uploader_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    pub fn has_genre(&self, genre: &str) -> bool {
        self.genres.iter().any(|g| g.eq_ignore_ascii_case(genre))
    }
}

/// Fields accepted when creating a movie.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub description: String,
    pub genres: Vec<String>,
    pub language: String,
    pub director: String,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ContentStatus>,
    pub poster_url: Option<String>,
    pub video_url: Option<String>,
}

impl NewMovie {
    pub fn into_movie(self, uploader_id: Uuid) -> Movie {
        let now = Utc::now();
        Movie {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            genres: normalize_genres(self.genres),
            language: self.language,
            director: self.director,
            release_date: self.release_date,
            duration_minutes: self.duration_minutes,
            status: self.status.unwrap_or_default(),
            rating_avg: 0.0,
            rating_count: 0,
            views: 0,
            poster_url: self.poster_url,
            video_url: self.video_url,
            uploader_id,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genres: Option<Vec<String>>,
    pub language: Option<String>,
    pub director: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub status: Option<ContentStatus>,
    pub poster_url: Option<String>,
    pub video_url: Option<String>,
}

impl MoviePatch {
    pub fn apply(self, movie: &mut Movie) {
        if let Some(v) = self.title {
            movie.title = v;
        }
        if let Some(v) = self.description {
            movie.description = v;
        }
        if let Some(v) = self.genres {
            movie.genres = normalize_genres(v);
        }
        if let Some(v) = self.language {
            movie.language = v;
        }
        if let Some(v) = self.director {
            movie.director = v;
        }
        if self.release_date.is_some() {
            movie.release_date = self.release_date;
        }
        if self.duration_minutes.is_some() {
            movie.duration_minutes = self.duration_minutes;
        }
        if let Some(v) = self.status {
            movie.status = v;
        }
        if self.poster_url.is_some() {
            movie.poster_url = self.poster_url;
        }
        if self.video_url.is_some() {
            movie.video_url = self.video_url;
        }
        movie.updated_at = Utc::now();
    }
}

/// Trims, drops blanks and de-duplicates genres case-insensitively,
/// keeping the first spelling seen.
pub fn normalize_genres(genres: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(genres.len());
    for g in genres {
        let g = g.trim();
        if g.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(g)) {
            continue;
        }
        out.push(g.to_string());
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: String,
    pub duration_seconds: Option<i32>,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
    pub plays: i64,
    pub uploader_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewMusic {
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub genre: String,
    pub duration_seconds: Option<i32>,
    pub audio_url: Option<String>,
    pub cover_url: Option<String>,
}

impl NewMusic {
    pub fn into_music(self, uploader_id: Uuid) -> Music {
        Music {
            id: Uuid::new_v4(),
            title: self.title,
            artist: self.artist,
            album: self.album,
            genre: self.genre,
            duration_seconds: self.duration_seconds,
            audio_url: self.audio_url,
            cover_url: self.cover_url,
            plays: 0,
            uploader_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Short {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
    pub views: i64,
    pub uploader_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewShort {
    pub title: String,
    pub description: Option<String>,
    pub video_url: String,
}

impl NewShort {
    pub fn into_short(self, uploader_id: Uuid) -> Short {
        Short {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            video_url: self.video_url,
            views: 0,
            uploader_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FacetCount {
    pub genre: String,
    pub count: u64,
}
