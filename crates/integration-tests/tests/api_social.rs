mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn following_is_counted_and_notified() {
    let app = TestApp::new();
    let (alice, alice_id) = app.register("alice").await;
    let (bob, bob_id) = app.register("bob").await;
    let uri = format!("/api/v1/users/{bob_id}/follow");

    let res = app.post(&uri, Some(&alice), json!({})).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["message"], "followed");
    assert_eq!(app.post(&uri, Some(&alice), json!({})).await.status, StatusCode::CONFLICT);

    let profile = app.get(&format!("/api/v1/users/{bob_id}"), None).await;
    assert_eq!(profile.data()["followers"], 1);
    assert_eq!(profile.data()["following"], 0);

    let followers = app.get(&format!("/api/v1/users/{bob_id}/followers"), None).await;
    assert_eq!(followers.data()["items"][0]["followerId"], alice_id.to_string());
    let following = app.get(&format!("/api/v1/users/{alice_id}/following"), None).await;
    assert_eq!(following.data()["total"], 1);

    let inbox = app.get("/api/v1/notifications", Some(&bob)).await;
    assert_eq!(inbox.data()["total"], 1);
    let note = &inbox.data()["items"][0];
    assert_eq!(note["kind"], "follow");
    assert_eq!(note["actorId"], alice_id.to_string());
    assert!(note["message"].as_str().unwrap().ends_with("started following you"));

    assert_eq!(app.delete(&uri, Some(&alice)).await.status, StatusCode::OK);
    assert_eq!(app.delete(&uri, Some(&alice)).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_cannot_follow_themselves_or_ghosts() {
    let app = TestApp::new();
    let (token, id) = app.register("narcissus").await;

    let me = app.post(&format!("/api/v1/users/{id}/follow"), Some(&token), json!({})).await;
    assert_eq!(me.status, StatusCode::BAD_REQUEST);

    let ghost = app
        .post(&format!("/api/v1/users/{}/follow", uuid::Uuid::new_v4()), Some(&token), json!({}))
        .await;
    assert_eq!(ghost.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_updates_are_validated() {
    let app = TestApp::new();
    let (token, _) = app.register("painter").await;

    let res = app
        .call(
            Method::PATCH,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({"displayName": "The Painter", "bio": "oils"})),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["displayName"], "The Painter");
    assert_eq!(res.data()["bio"], "oils");

    let bad = app
        .call(
            Method::PATCH,
            "/api/v1/users/me",
            Some(&token),
            Some(json!({"avatarUrl": "not a url"})),
        )
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["errors"][0]["field"], "avatarUrl");
}

#[tokio::test]
async fn private_lists_are_hidden_from_others() {
    let app = TestApp::new();
    let (owner, _) = app.register("owner").await;
    let (other, _) = app.register("other").await;

    let res = app
        .post("/api/v1/lists", Some(&owner), json!({"name": "Guilty pleasures"}))
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.data()["isPublic"], false);
    let uri = format!("/api/v1/lists/{}", res.data()["id"].as_str().unwrap());

    assert_eq!(app.get(&uri, Some(&owner)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&other)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, Some(&other)).await.status, StatusCode::NOT_FOUND);

    let published = app
        .call(Method::PATCH, &uri, Some(&owner), Some(json!({"isPublic": true})))
        .await;
    assert_eq!(published.status, StatusCode::OK);
    assert_eq!(app.get(&uri, None).await.status, StatusCode::OK);

    let forbidden = app
        .call(Method::PATCH, &uri, Some(&other), Some(json!({"name": "mine now"})))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let public = app.get("/api/v1/lists/public", None).await;
    assert_eq!(public.data()["total"], 1);
    let mine = app.get("/api/v1/lists", Some(&other)).await;
    assert_eq!(mine.data()["total"], 0);
}

#[tokio::test]
async fn list_items_are_unique_and_must_exist() {
    let app = TestApp::new();
    let (token, _) = app.register("curator").await;
    let movie = app.create_movie(&token, json!({"title": "Paris, Texas"})).await;

    let res = app
        .post("/api/v1/lists", Some(&token), json!({"name": "Road movies", "isPublic": true}))
        .await;
    let list_id = res.data()["id"].as_str().unwrap().to_string();
    let items = format!("/api/v1/lists/{list_id}/items");

    let added = app.post(&items, Some(&token), json!({"kind": "movie", "id": movie})).await;
    assert_eq!(added.status, StatusCode::CREATED);
    assert_eq!(added.data()["items"].as_array().unwrap().len(), 1);

    let dup = app.post(&items, Some(&token), json!({"kind": "movie", "id": movie})).await;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let missing = app
        .post(&items, Some(&token), json!({"kind": "music", "id": uuid::Uuid::new_v4()}))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let removed = app.delete(&format!("{items}/movies/{movie}"), Some(&token)).await;
    assert_eq!(removed.status, StatusCode::OK);
    assert!(removed.data()["items"].as_array().unwrap().is_empty());
    assert_eq!(
        app.delete(&format!("{items}/movies/{movie}"), Some(&token)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn notifications_can_be_read_one_or_all() {
    let app = TestApp::new();
    let (star, star_id) = app.register("star").await;
    for fan in ["fan1", "fan2", "fan3"] {
        let (token, _) = app.register(fan).await;
        app.post(&format!("/api/v1/users/{star_id}/follow"), Some(&token), json!({}))
            .await;
    }

    let count = app.get("/api/v1/notifications/unread-count", Some(&star)).await;
    assert_eq!(count.data()["count"], 3);

    let inbox = app.get("/api/v1/notifications?limit=1", Some(&star)).await;
    assert_eq!(inbox.data()["totalPages"], 3);
    let first = inbox.data()["items"][0]["id"].as_str().unwrap().to_string();

    let read = app
        .post(&format!("/api/v1/notifications/{first}/read"), Some(&star), json!({}))
        .await;
    assert_eq!(read.status, StatusCode::OK);
    let unread = app.get("/api/v1/notifications?unread=true", Some(&star)).await;
    assert_eq!(unread.data()["total"], 2);

    let all = app.post("/api/v1/notifications/read-all", Some(&star), json!({})).await;
    assert_eq!(all.data(), &json!(2));
    let count = app.get("/api/v1/notifications/unread-count", Some(&star)).await;
    assert_eq!(count.data()["count"], 0);

    // someone else's notification looks missing
    let (stranger, _) = app.register("stranger").await;
    let res = app
        .post(&format!("/api/v1/notifications/{first}/read"), Some(&stranger), json!({}))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
