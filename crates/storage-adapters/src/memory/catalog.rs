use std::collections::HashMap;

use async_trait::async_trait;
use domains::search::{recommendation_order, trending_order, MusicPlan, SearchPlan, TrendingWindow};
use domains::{
    ContentStatus, DomainError, FacetCount, Movie, MovieRepo, Music, MusicRepo, PageRequest, Paged,
    RatingSummary, Result, Short, ShortRepo,
};
use uuid::Uuid;

use super::{page_of, MemoryStore};

#[async_trait]
impl MovieRepo for MemoryStore {
    async fn insert(&self, movie: Movie) -> Result<Movie> {
        self.movies.insert(movie.id, movie.clone());
        Ok(movie)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Movie>> {
        Ok(self.movies.get(&id).map(|m| m.value().clone()))
    }

    async fn update(&self, movie: Movie) -> Result<Movie> {
        match self.movies.get_mut(&movie.id) {
            Some(mut slot) => {
                *slot = movie.clone();
                Ok(movie)
            }
            None => Err(DomainError::not_found("movie", movie.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.movies.remove(&id).is_some())
    }

    async fn search(&self, plan: &SearchPlan) -> Result<Paged<Movie>> {
        Ok(page_of(
            &self.movies,
            plan.page(),
            |m| plan.matches(m),
            |a, b| plan.compare(a, b),
        ))
    }

    async fn genre_facets(&self, plan: &SearchPlan) -> Result<Vec<FacetCount>> {
        // lowercased genre -> (first spelling seen, count)
        let mut counts: HashMap<String, (String, u64)> = HashMap::new();
        for entry in self.movies.iter() {
            let movie = entry.value();
            if !plan.matches(movie) {
                continue;
            }
            for genre in &movie.genres {
                counts
                    .entry(genre.to_lowercase())
                    .or_insert_with(|| (genre.clone(), 0))
                    .1 += 1;
            }
        }
        let mut facets: Vec<FacetCount> = counts
            .into_values()
            .map(|(genre, count)| FacetCount { genre, count })
            .collect();
        facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
        Ok(facets)
    }

    async fn trending(&self, window: TrendingWindow) -> Result<Vec<Movie>> {
        let mut movies: Vec<Movie> = self
            .movies
            .iter()
            .filter(|e| e.status == ContentStatus::Published && e.created_at >= window.since)
            .map(|e| e.value().clone())
            .collect();
        movies.sort_by(trending_order);
        movies.truncate(window.limit as usize);
        Ok(movies)
    }

    async fn in_genres(&self, genres: Vec<String>, exclude: Vec<Uuid>, limit: u32) -> Result<Vec<Movie>> {
        let mut movies: Vec<Movie> = self
            .movies
            .iter()
            .filter(|e| {
                e.status == ContentStatus::Published
                    && !exclude.contains(&e.id)
                    && genres.iter().any(|g| e.has_genre(g))
            })
            .map(|e| e.value().clone())
            .collect();
        movies.sort_by(recommendation_order);
        movies.truncate(limit as usize);
        Ok(movies)
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        match self.movies.get_mut(&id) {
            Some(mut m) => {
                m.views += 1;
                Ok(())
            }
            None => Err(DomainError::not_found("movie", id)),
        }
    }

    async fn set_rating_summary(&self, id: Uuid, summary: RatingSummary) -> Result<()> {
        match self.movies.get_mut(&id) {
            Some(mut m) => {
                m.rating_avg = summary.average;
                m.rating_count = summary.count;
                Ok(())
            }
            None => Err(DomainError::not_found("movie", id)),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.movies.len() as u64)
    }
}

#[async_trait]
impl MusicRepo for MemoryStore {
    async fn insert(&self, music: Music) -> Result<Music> {
        self.music.insert(music.id, music.clone());
        Ok(music)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Music>> {
        Ok(self.music.get(&id).map(|m| m.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.music.remove(&id).is_some())
    }

    async fn search(&self, plan: &MusicPlan) -> Result<Paged<Music>> {
        Ok(page_of(
            &self.music,
            plan.page,
            |m| plan.matches(m),
            |a, b| plan.compare(a, b),
        ))
    }

    async fn increment_plays(&self, id: Uuid) -> Result<()> {
        match self.music.get_mut(&id) {
            Some(mut m) => {
                m.plays += 1;
                Ok(())
            }
            None => Err(DomainError::not_found("music", id)),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.music.len() as u64)
    }
}

#[async_trait]
impl ShortRepo for MemoryStore {
    async fn insert(&self, short: Short) -> Result<Short> {
        self.shorts.insert(short.id, short.clone());
        Ok(short)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Short>> {
        Ok(self.shorts.get(&id).map(|s| s.value().clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.shorts.remove(&id).is_some())
    }

    async fn feed(&self, page: PageRequest) -> Result<Paged<Short>> {
        Ok(page_of(&self.shorts, page, |_| true, |a, b| {
            b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id))
        }))
    }

    async fn increment_views(&self, id: Uuid) -> Result<()> {
        match self.shorts.get_mut(&id) {
            Some(mut s) => {
                s.views += 1;
                Ok(())
            }
            None => Err(DomainError::not_found("short", id)),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.shorts.len() as u64)
    }
}
