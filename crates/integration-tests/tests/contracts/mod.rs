//! Behaviour every storage backend must share. Each check takes a fresh
//! [`Repositories`] bundle and drives it only through the port traits, so
//! the in-memory store and postgres run the same assertions.
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};
use domains::search::MovieSearch;
use domains::{
    ContentStatus, DomainError, Follow, HistoryEntry, ListItem, MediaRef, Movie, MovieRequest,
    NewMovie, PageRequest, Rating, RatingSummary, RequestStatus, Shelf, ShelfEntry, User, UserList,
};
use services::Repositories;
use uuid::Uuid;

pub fn user(name: &str) -> User {
    User::new(
        name.into(),
        format!("{name}@example.com"),
        "hash".into(),
        name.into(),
    )
}

async fn seed_user(repos: &Repositories, name: &str) -> Uuid {
    repos.users.insert(user(name)).await.unwrap().id
}

fn movie(uploader: Uuid, title: &str, genres: &[&str]) -> Movie {
    NewMovie {
        title: title.into(),
        language: "English".into(),
        genres: genres.iter().map(|g| g.to_string()).collect(),
        ..Default::default()
    }
    .into_movie(uploader)
}

pub async fn usernames_and_emails_are_unique_ignoring_case(repos: &Repositories) {
    let users = &repos.users;
    users.insert(user("Ada")).await.unwrap();

    let same_name = users.insert(user("ada")).await;
    assert!(matches!(same_name, Err(DomainError::Conflict(_))));

    let mut same_email = user("lovelace");
    same_email.email = "ADA@example.com".into();
    assert!(matches!(users.insert(same_email).await, Err(DomainError::Conflict(_))));

    // a failed insert must not leave its username claimed
    let mut retry = user("lovelace");
    retry.email = "lovelace@example.com".into();
    users.insert(retry).await.unwrap();

    assert!(users.find_by_login("ADA").await.unwrap().is_some());
    assert!(users.find_by_login("Ada@Example.com").await.unwrap().is_some());
    assert_eq!(users.count().await.unwrap(), 2);
}

pub async fn search_pages_report_totals_over_all_matches(repos: &Repositories) {
    let uploader = seed_user(repos, "archivist").await;
    for year in 2000..2025 {
        let mut film = movie(uploader, &format!("Film {year}"), &["Drama"]);
        film.release_date = NaiveDate::from_ymd_opt(year, 6, 1);
        repos.movies.insert(film).await.unwrap();
    }

    let search = MovieSearch {
        sort_by: Some("release_date".into()),
        order: Some("asc".into()),
        page: Some(3),
        limit: Some(10),
        ..Default::default()
    };
    let page = repos.movies.search(&search.plan().unwrap()).await.unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].title, "Film 2020");

    let facets = repos.movies.genre_facets(&search.plan().unwrap()).await.unwrap();
    assert_eq!(facets.len(), 1);
    assert_eq!(facets[0].count, 25);

    let year = MovieSearch {
        year: Some(2003),
        ..Default::default()
    };
    let page = repos.movies.search(&year.plan().unwrap()).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].title, "Film 2003");
}

pub async fn text_search_weighs_title_over_director_over_description(repos: &Repositories) {
    let uploader = seed_user(repos, "critic").await;
    let mut by_description = movie(uploader, "Dune", &["Sci-Fi"]);
    by_description.description = "Spice and sand".into();
    let mut by_director = movie(uploader, "Noir", &["Crime"]);
    by_director.director = "Spice Lee".into();
    let by_title = movie(uploader, "Spice World", &["Comedy"]);
    let unrelated = movie(uploader, "Heat", &["Crime"]);
    for m in [by_description, by_director, by_title, unrelated] {
        repos.movies.insert(m).await.unwrap();
    }

    let search = MovieSearch {
        q: Some("SPICE".into()),
        ..Default::default()
    };
    let page = repos.movies.search(&search.plan().unwrap()).await.unwrap();
    let titles: Vec<_> = page.items.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Spice World", "Noir", "Dune"]);
    assert_eq!(page.total, 3);
}

pub async fn genre_matches_exclude_seen_movies(repos: &Repositories) {
    let uploader = seed_user(repos, "curator").await;
    let seen = repos
        .movies
        .insert(movie(uploader, "Arrival", &["Sci-Fi", "Drama"]))
        .await
        .unwrap();
    let mut draft = movie(uploader, "Unfinished", &["Sci-Fi"]);
    draft.status = ContentStatus::Draft;
    repos.movies.insert(draft).await.unwrap();
    let dune = repos.movies.insert(movie(uploader, "Dune", &["sci-fi"])).await.unwrap();
    repos.movies.insert(movie(uploader, "Heat", &["Crime"])).await.unwrap();
    repos
        .movies
        .set_rating_summary(dune.id, RatingSummary { average: 9.0, count: 1 })
        .await
        .unwrap();

    let recs = repos
        .movies
        .in_genres(vec!["SCI-FI".into()], vec![seen.id], 10)
        .await
        .unwrap();
    let titles: Vec<_> = recs.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune"]);
}

pub async fn engagement_is_unique_per_user_and_target(repos: &Repositories) {
    let fan = seed_user(repos, "fan").await;
    let star = seed_user(repos, "star").await;
    let film = repos.movies.insert(movie(star, "Ran", &["Drama"])).await.unwrap();
    let target = MediaRef::movie(film.id);

    repos.ratings.insert(Rating::new(fan, target, 8, None)).await.unwrap();
    let again = repos.ratings.insert(Rating::new(fan, target, 3, None)).await;
    assert!(matches!(again, Err(DomainError::Conflict(_))));
    repos.ratings.insert(Rating::new(star, target, 5, None)).await.unwrap();
    let summary = repos.ratings.summary(target).await.unwrap();
    assert_eq!((summary.average, summary.count), (6.5, 2));

    repos
        .shelves
        .add(ShelfEntry::new(fan, Shelf::Favorites, target))
        .await
        .unwrap();
    let dup = repos.shelves.add(ShelfEntry::new(fan, Shelf::Favorites, target)).await;
    assert!(matches!(dup, Err(DomainError::Conflict(_))));
    repos
        .shelves
        .add(ShelfEntry::new(fan, Shelf::Watchlist, target))
        .await
        .unwrap();

    let follow = || Follow {
        follower_id: fan,
        followee_id: star,
        created_at: Utc::now(),
    };
    repos.follows.insert(follow()).await.unwrap();
    assert!(matches!(
        repos.follows.insert(follow()).await,
        Err(DomainError::Conflict(_))
    ));
    assert_eq!(repos.follows.counts(star).await.unwrap(), (1, 0));

    let first = repos
        .history
        .upsert(HistoryEntry::new(fan, target, 60, false))
        .await
        .unwrap();
    let second = repos
        .history
        .upsert(HistoryEntry::new(fan, target, 900, true))
        .await
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.progress_seconds, 900);

    assert_eq!(repos.shelves.purge_target(target).await.unwrap(), 2);
    assert_eq!(repos.ratings.purge_target(target).await.unwrap(), 2);
    assert_eq!(repos.history.purge_target(target).await.unwrap(), 1);
    assert!(repos.shelves.targets(fan, Shelf::Favorites).await.unwrap().is_empty());
}

pub async fn list_items_are_unique_and_purged_with_their_media(repos: &Repositories) {
    let owner = seed_user(repos, "noir_fan").await;
    let list = repos
        .lists
        .insert(UserList::new(owner, "Noir".into(), None, true))
        .await
        .unwrap();
    let target = MediaRef::movie(Uuid::new_v4());
    let item = || ListItem {
        target,
        added_at: Utc::now(),
    };

    repos.lists.add_item(list.id, item()).await.unwrap();
    assert!(matches!(
        repos.lists.add_item(list.id, item()).await,
        Err(DomainError::Conflict(_))
    ));
    assert!(matches!(
        repos.lists.add_item(Uuid::new_v4(), item()).await,
        Err(DomainError::NotFound { .. })
    ));

    assert_eq!(repos.lists.purge_target(target).await.unwrap(), 1);
    let list = repos.lists.get(list.id).await.unwrap().unwrap();
    assert!(list.items.is_empty());
    assert!(!repos.lists.remove_item(list.id, target).await.unwrap());
}

pub async fn movie_requests_filter_by_status_and_requester(repos: &Repositories) {
    let alice = seed_user(repos, "alice").await;
    let bob = seed_user(repos, "bob").await;
    repos
        .requests
        .insert(MovieRequest::new(alice, "Pather Panchali".into(), None))
        .await
        .unwrap();
    let mut done = MovieRequest::new(bob, "Charulata".into(), None);
    done.status = RequestStatus::Approved;
    repos.requests.insert(done).await.unwrap();

    assert_eq!(repos.requests.count(None).await.unwrap(), 2);
    assert_eq!(repos.requests.count(Some(RequestStatus::Pending)).await.unwrap(), 1);
    let bobs = repos
        .requests
        .list(None, Some(bob), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(bobs.total, 1);
    assert_eq!(bobs.items[0].title, "Charulata");
}
