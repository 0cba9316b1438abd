//! # Search plans
//!
//! Turns optional, user-supplied filter fields into a [`SearchPlan`]: a
//! conjunction of predicates, a whitelisted sort and a clamped page.
//! Storage adapters either evaluate the plan directly (memory) or render
//! it to SQL (postgres); neither re-validates its input.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::errors::{DomainError, Result};
use crate::models::{ContentStatus, Movie, Music};
use crate::pagination::PageRequest;

pub const MAX_RATING: f64 = 10.0;
pub const DEFAULT_TRENDING_DAYS: u32 = 7;
pub const MAX_TRENDING_DAYS: u32 = 90;

/// A single filter condition. A plan matches a movie when every predicate does.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    GenreIs(String),
    LanguageIs(String),
    RatingAtLeast(f64),
    StatusIs(ContentStatus),
    ReleasedOnOrAfter(NaiveDate),
    ReleasedOnOrBefore(NaiveDate),
    DirectorContains(String),
    ReleasedInYear(i32),
    /// Whitespace-separated, lowercased terms; any term may match.
    TextMatches(Vec<String>),
}

impl Predicate {
    pub fn matches(&self, m: &Movie) -> bool {
        match self {
            Predicate::GenreIs(g) => m.has_genre(g),
            Predicate::LanguageIs(l) => m.language.eq_ignore_ascii_case(l),
            Predicate::RatingAtLeast(min) => m.rating_avg >= *min,
            Predicate::StatusIs(s) => m.status == *s,
            Predicate::ReleasedOnOrAfter(d) => m.release_date.is_some_and(|r| r >= *d),
            Predicate::ReleasedOnOrBefore(d) => m.release_date.is_some_and(|r| r <= *d),
            Predicate::DirectorContains(s) => m.director.to_lowercase().contains(&s.to_lowercase()),
            Predicate::ReleasedInYear(y) => m.release_date.is_some_and(|r| r.year() == *y),
            Predicate::TextMatches(terms) => text_score(terms, m) > 0,
        }
    }
}

/// Weighted term-occurrence count: title 3, director 2, description 1.
pub fn text_score(terms: &[String], m: &Movie) -> u32 {
    let title = m.title.to_lowercase();
    let director = m.director.to_lowercase();
    let description = m.description.to_lowercase();
    terms
        .iter()
        .map(|t| {
            let hits = |haystack: &str| haystack.matches(t.as_str()).count() as u32;
            hits(&title) * 3 + hits(&director) * 2 + hits(&description)
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Title,
    Rating,
    Views,
    ReleaseDate,
}

impl SortField {
    /// Whitelist lookup. Unknown fields are rejected here and the caller
    /// falls back to `CreatedAt`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" | "createdAt" => Some(SortField::CreatedAt),
            "title" => Some(SortField::Title),
            "rating" => Some(SortField::Rating),
            "views" => Some(SortField::Views),
            "release_date" | "releaseDate" => Some(SortField::ReleaseDate),
            _ => None,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::Rating => "rating_avg",
            SortField::Views => "views",
            SortField::ReleaseDate => "release_date",
        }
    }

    fn compare(&self, a: &Movie, b: &Movie) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortField::Rating => a.rating_avg.total_cmp(&b.rating_avg),
            SortField::Views => a.views.cmp(&b.views),
            SortField::ReleaseDate => a.release_date.cmp(&b.release_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Best text match first. Only present when the plan has a text query.
    Relevance,
    Field(SortField, SortOrder),
}

/// Raw movie search parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieSearch {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub min_rating: Option<f64>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub director: Option<String>,
    pub year: Option<i32>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl MovieSearch {
    pub fn plan(&self) -> Result<SearchPlan> {
        let mut predicates = Vec::new();

        if let Some(g) = present(&self.genre) {
            predicates.push(Predicate::GenreIs(g.to_string()));
        }
        if let Some(l) = present(&self.language) {
            predicates.push(Predicate::LanguageIs(l.to_string()));
        }
        if let Some(min) = self.min_rating {
            if !(0.0..=MAX_RATING).contains(&min) {
                return Err(DomainError::validation("min_rating must be between 0 and 10"));
            }
            predicates.push(Predicate::RatingAtLeast(min));
        }
        if let Some(s) = present(&self.status) {
            let status = ContentStatus::parse(s)
                .ok_or_else(|| DomainError::validation(format!("unknown status '{s}'")))?;
            predicates.push(Predicate::StatusIs(status));
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(DomainError::validation("date_from must not be after date_to"));
            }
        }
        if let Some(from) = self.date_from {
            predicates.push(Predicate::ReleasedOnOrAfter(from));
        }
        if let Some(to) = self.date_to {
            predicates.push(Predicate::ReleasedOnOrBefore(to));
        }
        if let Some(d) = present(&self.director) {
            predicates.push(Predicate::DirectorContains(d.to_string()));
        }
        if let Some(y) = self.year {
            if !(1..=9999).contains(&y) {
                return Err(DomainError::validation("year must be between 1 and 9999"));
            }
            predicates.push(Predicate::ReleasedInYear(y));
        }

        let mut sort = Vec::with_capacity(2);
        if let Some(q) = present(&self.q) {
            let terms: Vec<String> = q.split_whitespace().map(str::to_lowercase).collect();
            predicates.push(Predicate::TextMatches(terms));
            sort.push(SortKey::Relevance);
        }

        let field = present(&self.sort_by)
            .and_then(SortField::parse)
            .unwrap_or(SortField::CreatedAt);
        let order = present(&self.order).map(SortOrder::parse).unwrap_or_default();
        sort.push(SortKey::Field(field, order));

        Ok(SearchPlan {
            predicates,
            sort,
            page: PageRequest::new(self.page, self.limit),
        })
    }
}

/// A validated movie query, ready for any storage adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPlan {
    predicates: Vec<Predicate>,
    sort: Vec<SortKey>,
    page: PageRequest,
}

impl SearchPlan {
    /// Matches everything, newest first.
    pub fn all(page: PageRequest) -> Self {
        Self {
            predicates: Vec::new(),
            sort: vec![SortKey::Field(SortField::CreatedAt, SortOrder::Desc)],
            page,
        }
    }

    pub fn with_predicate(mut self, p: Predicate) -> Self {
        self.predicates.push(p);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn page(&self) -> PageRequest {
        self.page
    }

    pub fn text_terms(&self) -> Option<&[String]> {
        self.predicates.iter().find_map(|p| match p {
            Predicate::TextMatches(terms) => Some(terms.as_slice()),
            _ => None,
        })
    }

    pub fn matches(&self, m: &Movie) -> bool {
        self.predicates.iter().all(|p| p.matches(m))
    }

    /// Total order used by in-process evaluation; ties break on id.
    pub fn compare(&self, a: &Movie, b: &Movie) -> Ordering {
        for key in &self.sort {
            let ord = match key {
                SortKey::Relevance => match self.text_terms() {
                    Some(terms) => text_score(terms, b).cmp(&text_score(terms, a)),
                    None => Ordering::Equal,
                },
                SortKey::Field(field, order) => order.apply(field.compare(a, b)),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.id.cmp(&b.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MusicSort {
    Newest,
    MostPlayed,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MusicSearch {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub sort_by: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl MusicSearch {
    pub fn plan(&self) -> MusicPlan {
        MusicPlan {
            q: present(&self.q).map(str::to_lowercase),
            genre: present(&self.genre).map(str::to_string),
            artist: present(&self.artist).map(str::to_lowercase),
            sort: match present(&self.sort_by) {
                Some("plays") => MusicSort::MostPlayed,
                _ => MusicSort::Newest,
            },
            page: PageRequest::new(self.page, self.limit),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicPlan {
    pub q: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub sort: MusicSort,
    pub page: PageRequest,
}

impl MusicPlan {
    pub fn matches(&self, m: &Music) -> bool {
        if let Some(g) = &self.genre {
            if !m.genre.eq_ignore_ascii_case(g) {
                return false;
            }
        }
        if let Some(a) = &self.artist {
            if !m.artist.to_lowercase().contains(a) {
                return false;
            }
        }
        if let Some(q) = &self.q {
            let album = m.album.as_deref().unwrap_or_default().to_lowercase();
            return m.title.to_lowercase().contains(q)
                || m.artist.to_lowercase().contains(q)
                || album.contains(q);
        }
        true
    }

    pub fn compare(&self, a: &Music, b: &Music) -> Ordering {
        let ord = match self.sort {
            MusicSort::Newest => b.created_at.cmp(&a.created_at),
            MusicSort::MostPlayed => b.plays.cmp(&a.plays),
        };
        ord.then_with(|| a.id.cmp(&b.id))
    }
}

/// Trending window: published movies created since `since`, most viewed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendingWindow {
    pub since: DateTime<Utc>,
    pub limit: u32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TrendingParams {
    pub days: Option<u32>,
    pub limit: Option<u32>,
}

impl TrendingParams {
    pub fn window(&self, now: DateTime<Utc>) -> TrendingWindow {
        let days = self.days.unwrap_or(DEFAULT_TRENDING_DAYS).clamp(1, MAX_TRENDING_DAYS);
        TrendingWindow {
            since: now - Duration::days(i64::from(days)),
            limit: PageRequest::new(None, self.limit).limit(),
        }
    }
}

/// In-process trending order: views desc, then rating desc, then id.
pub fn trending_order(a: &Movie, b: &Movie) -> Ordering {
    b.views
        .cmp(&a.views)
        .then_with(|| b.rating_avg.total_cmp(&a.rating_avg))
        .then_with(|| a.id.cmp(&b.id))
}

/// In-process recommendation order: rating desc, then views desc, then id.
pub fn recommendation_order(a: &Movie, b: &Movie) -> Ordering {
    b.rating_avg
        .total_cmp(&a.rating_avg)
        .then_with(|| b.views.cmp(&a.views))
        .then_with(|| a.id.cmp(&b.id))
}
