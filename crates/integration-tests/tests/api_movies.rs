mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::{json, Value};

async fn seeded() -> (TestApp, String) {
    let app = TestApp::new();
    let (token, _) = app.register("curator").await;
    let movies = [
        json!({"title": "Arrival", "genres": ["Sci-Fi", "Drama"], "director": "Denis Villeneuve",
               "releaseDate": "2016-11-11", "description": "Linguist meets heptapods"}),
        json!({"title": "Dune", "genres": ["Sci-Fi"], "director": "Denis Villeneuve",
               "releaseDate": "2021-10-22", "description": "Spice and sand"}),
        json!({"title": "Heat", "genres": ["Crime", "Thriller"], "director": "Michael Mann",
               "releaseDate": "1995-12-15", "description": "A heist in Los Angeles"}),
        json!({"title": "Amélie", "genres": ["Comedy"], "director": "Jean-Pierre Jeunet",
               "language": "French", "releaseDate": "2001-04-25"}),
    ];
    for m in movies {
        app.create_movie(&token, m).await;
    }
    (app, token)
}

fn titles(v: &Value) -> Vec<&str> {
    v["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn filters_combine_with_and() {
    let (app, _) = seeded().await;

    let res = app
        .get("/api/v1/movies?genre=sci-fi&director=villeneuve&year=2021", None)
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(titles(res.data()), vec!["Dune"]);

    let res = app.get("/api/v1/movies?language=french", None).await;
    assert_eq!(titles(res.data()), vec!["Amélie"]);

    let res = app
        .get("/api/v1/movies?date_from=2000-01-01&date_to=2017-01-01&sort_by=release_date&order=asc", None)
        .await;
    assert_eq!(titles(res.data()), vec!["Amélie", "Arrival"]);
}

#[tokio::test]
async fn text_query_ranks_by_relevance() {
    let (app, _) = seeded().await;
    let res = app.get("/api/v1/movies?q=heist", None).await;
    assert_eq!(titles(res.data()), vec!["Heat"]);

    // title hits outweigh description hits
    let res = app.get("/api/v1/movies?q=dune%20spice", None).await;
    assert_eq!(titles(res.data())[0], "Dune");
}

#[tokio::test]
async fn pagination_is_clamped() {
    let (app, _) = seeded().await;

    let res = app.get("/api/v1/movies?limit=500", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["limit"], 100);
    assert_eq!(res.data()["total"], 4);

    let res = app.get("/api/v1/movies?limit=0&page=0", None).await;
    assert_eq!(res.data()["limit"], 1);
    assert_eq!(res.data()["page"], 1);
    assert_eq!(res.data()["totalPages"], 4);
    assert_eq!(res.data()["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bad_search_input_is_rejected() {
    let (app, _) = seeded().await;

    let inverted = app
        .get("/api/v1/movies?date_from=2020-01-01&date_to=2010-01-01", None)
        .await;
    assert_eq!(inverted.status, StatusCode::BAD_REQUEST);

    let unparsable = app.get("/api/v1/movies?limit=lots", None).await;
    assert_eq!(unparsable.status, StatusCode::BAD_REQUEST);

    // unknown sort fields fall back instead of failing
    let fallback = app.get("/api/v1/movies?sort_by=password_hash", None).await;
    assert_eq!(fallback.status, StatusCode::OK);
}

#[tokio::test]
async fn facets_count_genres_under_the_same_filters() {
    let (app, _) = seeded().await;
    let res = app.get("/api/v1/movies/facets?director=villeneuve", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.data(),
        &json!([{"genre": "Sci-Fi", "count": 2}, {"genre": "Drama", "count": 1}])
    );
}

#[tokio::test]
async fn viewing_counts_and_feeds_trending() {
    let (app, token) = seeded().await;
    let heat = app
        .create_movie(&token, json!({"title": "Heat 2", "genres": ["Crime"]}))
        .await;

    for _ in 0..3 {
        let res = app.get(&format!("/api/v1/movies/{heat}"), None).await;
        assert_eq!(res.status, StatusCode::OK);
    }
    let res = app.get(&format!("/api/v1/movies/{heat}"), None).await;
    assert_eq!(res.data()["views"], 4);

    let trending = app.get("/api/v1/movies/trending?limit=2", None).await;
    let list = trending.data().as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["title"], "Heat 2");
}

#[tokio::test]
async fn recommendations_follow_favorite_genres() {
    let (app, _) = seeded().await;
    let (viewer, _) = app.register("viewer").await;

    let search = app.get("/api/v1/movies?q=arrival", None).await;
    let arrival = search.data()["items"][0]["id"].as_str().unwrap().to_string();
    let fav = app
        .post(&format!("/api/v1/me/favorites/movies/{arrival}"), Some(&viewer), json!({}))
        .await;
    assert_eq!(fav.status, StatusCode::CREATED);

    let res = app.get("/api/v1/movies/recommendations", Some(&viewer)).await;
    assert_eq!(res.status, StatusCode::OK);
    let recommended: Vec<&str> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert!(recommended.contains(&"Dune"));
    assert!(!recommended.contains(&"Arrival"));
    assert!(!recommended.contains(&"Amélie"));

    assert_eq!(
        app.get("/api/v1/movies/recommendations", None).await.status,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn watchlisted_movies_can_still_be_recommended() {
    let (app, _) = seeded().await;
    let (viewer, _) = app.register("viewer").await;

    let id_of = |res: &common::Response| res.data()["items"][0]["id"].as_str().unwrap().to_string();
    let arrival = id_of(&app.get("/api/v1/movies?q=arrival", None).await);
    let dune = id_of(&app.get("/api/v1/movies?q=dune", None).await);

    app.post(&format!("/api/v1/me/favorites/movies/{arrival}"), Some(&viewer), json!({}))
        .await;
    let queued = app
        .post(&format!("/api/v1/me/watchlist/movies/{dune}"), Some(&viewer), json!({}))
        .await;
    assert_eq!(queued.status, StatusCode::CREATED);

    let res = app.get("/api/v1/movies/recommendations", Some(&viewer)).await;
    let recommended: Vec<&str> = res
        .data()
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap())
        .collect();
    assert_eq!(recommended, vec!["Dune"]);
}

#[tokio::test]
async fn only_the_uploader_or_an_admin_may_edit() {
    let (app, owner) = seeded().await;
    let id = app.create_movie(&owner, json!({"title": "Draft"})).await;
    let (stranger, stranger_id) = app.register("stranger").await;

    let patch = json!({"title": "Hijacked"});
    let uri = format!("/api/v1/movies/{id}");
    let res = app.call(Method::PATCH, &uri, Some(&stranger), Some(patch.clone())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app
        .call(Method::PATCH, &uri, Some(&owner), Some(json!({"title": "Final Cut"})))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["title"], "Final Cut");

    app.make_admin(stranger_id).await;
    assert_eq!(app.delete(&uri, Some(&stranger)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_ids_and_bodies_are_bad_requests() {
    let (app, token) = seeded().await;
    assert_eq!(
        app.get("/api/v1/movies/not-a-uuid", None).await.status,
        StatusCode::BAD_REQUEST
    );

    let res = app
        .post("/api/v1/movies", Some(&token), json!({"title": "", "language": "English"}))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "title");
}
