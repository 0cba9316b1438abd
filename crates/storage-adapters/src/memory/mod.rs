//! # In-memory store
//!
//! A single [`MemoryStore`] implements every repository port. Each entity
//! lives in its own `DashMap`; uniqueness constraints are enforced through
//! the map's entry API so concurrent inserts of the same key cannot both
//! succeed.

use std::cmp::Ordering;

use dashmap::DashMap;
use domains::{
    Comment, Follow, HistoryEntry, MediaRef, Movie, MovieRequest, Music, Notification, PageRequest,
    Paged, Rating, Shelf, ShelfEntry, Short, User, UserList,
};
use uuid::Uuid;

mod catalog;
mod engagement;
mod social;
mod users;

#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// Lowercased `u:<username>` and `e:<email>` keys pointing at user ids.
    logins: DashMap<String, Uuid>,
    movies: DashMap<Uuid, Movie>,
    music: DashMap<Uuid, Music>,
    shorts: DashMap<Uuid, Short>,
    comments: DashMap<Uuid, Comment>,
    ratings: DashMap<(Uuid, MediaRef), Rating>,
    shelves: DashMap<(Uuid, Shelf, MediaRef), ShelfEntry>,
    history: DashMap<(Uuid, MediaRef), HistoryEntry>,
    follows: DashMap<(Uuid, Uuid), Follow>,
    lists: DashMap<Uuid, UserList>,
    notifications: DashMap<Uuid, Notification>,
    requests: DashMap<Uuid, MovieRequest>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Collects matching values, orders them and cuts out one page.
fn page_of<K, V, F, C>(map: &DashMap<K, V>, page: PageRequest, mut keep: F, cmp: C) -> Paged<V>
where
    K: Eq + std::hash::Hash,
    V: Clone,
    F: FnMut(&V) -> bool,
    C: FnMut(&V, &V) -> Ordering,
{
    let mut items: Vec<V> = map
        .iter()
        .filter(|e| keep(e.value()))
        .map(|e| e.value().clone())
        .collect();
    items.sort_by(cmp);
    let total = items.len() as u64;
    Paged::new(page.slice(&items), total, page)
}

/// Removes every entry whose value matches and returns how many went.
fn purge<K, V, F>(map: &DashMap<K, V>, mut matches: F) -> u64
where
    K: Eq + std::hash::Hash,
    F: FnMut(&V) -> bool,
{
    let mut removed = 0;
    map.retain(|_, v| {
        let hit = matches(v);
        removed += u64::from(hit);
        !hit
    });
    removed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn purge_counts_only_what_it_removed_while_others_insert() {
        let map: Arc<DashMap<u32, bool>> = Arc::new((0..1_000).map(|k| (k, k % 2 == 0)).collect());

        let writer = {
            let map = Arc::clone(&map);
            thread::spawn(move || {
                for k in 1_000..5_000 {
                    map.insert(k, false);
                }
            })
        };
        let removed = purge(&map, |stale| *stale);
        writer.join().unwrap();

        assert_eq!(removed, 500);
        assert_eq!(map.len(), 4_500);
    }
}
