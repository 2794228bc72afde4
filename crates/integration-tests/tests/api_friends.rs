//! Friends directory and read-only friend decks.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use card_ledger_integration_tests::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_add_list_remove_friend() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .post(
            "/api/friends",
            "alice",
            json!({ "friend_id": "bob", "display_name": "Bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "friend_id": "bob", "display_name": "Bob" }));

    ctx.post(
        "/api/friends",
        "alice",
        json!({ "friend_id": "carol", "display_name": "Carol" }),
    )
    .await;

    let (status, friends) = ctx.get("/api/friends", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        friends,
        json!([
            { "friend_id": "bob", "display_name": "Bob" },
            { "friend_id": "carol", "display_name": "Carol" },
        ])
    );

    let (status, _) = ctx.delete("/api/friends/bob", "alice").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx.delete("/api/friends/bob", "alice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, friends) = ctx.get("/api/friends", Some("alice")).await;
    assert_eq!(friends.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_links_are_one_directional() {
    let ctx = TestContext::new();
    ctx.post("/api/friends", "alice", json!({ "friend_id": "bob" }))
        .await;

    let (_, friends) = ctx.get("/api/friends", Some("bob")).await;
    assert_eq!(friends, json!([]));
}

#[tokio::test]
async fn test_readding_renames() {
    let ctx = TestContext::new();
    ctx.post(
        "/api/friends",
        "alice",
        json!({ "friend_id": "bob", "display_name": "Bob" }),
    )
    .await;
    let (status, body) = ctx
        .post(
            "/api/friends",
            "alice",
            json!({ "friend_id": "bob", "display_name": "Captain Bob" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["display_name"], "Captain Bob");

    let (_, friends) = ctx.get("/api/friends", Some("alice")).await;
    assert_eq!(friends.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cannot_befriend_yourself() {
    let ctx = TestContext::new();
    let (status, body) = ctx
        .post("/api/friends", "alice", json!({ "friend_id": "alice" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cannot add yourself as a friend");
}

#[tokio::test]
async fn test_friend_deck_is_read_only_view() {
    let ctx = TestContext::new();
    ctx.post(
        "/api/deck/cards",
        "bob",
        json!({ "card_id": "OP01-024", "delta": 2 }),
    )
    .await;
    ctx.post(
        "/api/deck/cards",
        "bob",
        json!({ "card_id": "OP01-001", "delta": 1 }),
    )
    .await;
    ctx.post(
        "/api/friends",
        "alice",
        json!({ "friend_id": "bob", "display_name": "Bob" }),
    )
    .await;

    let (status, screen) = ctx
        .get("/api/friends/bob/deck?sort=name", Some("alice"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(screen["mode"], "read_only");
    assert_eq!(screen["owner_id"], "bob");
    assert_eq!(screen["display_name"], "Bob");
    assert_eq!(screen["cards"]["items"][0]["name"], "Monkey.D.Luffy");
    assert_eq!(screen["cards"]["items"][1]["name"], "Roronoa Zoro");
}

#[tokio::test]
async fn test_stranger_deck_is_hidden() {
    let ctx = TestContext::new();
    ctx.post(
        "/api/deck/cards",
        "bob",
        json!({ "card_id": "OP01-024", "delta": 1 }),
    )
    .await;

    let (status, _) = ctx.get("/api/friends/bob/deck", Some("alice")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_friends_require_owner() {
    let ctx = TestContext::new();
    let (status, _) = ctx.get("/api/friends", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_friend_deck_cannot_be_saved() {
    let ctx = TestContext::new();
    ctx.post(
        "/api/deck/cards",
        "bob",
        json!({ "card_id": "OP01-024", "delta": 2 }),
    )
    .await;
    let edit = json!({ "items": [{ "card_id": "OP01-024", "quantity": 0 }] });

    let (status, _) = ctx.put("/api/friends/bob/deck", "alice", edit.clone()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.post("/api/friends", "alice", json!({ "friend_id": "bob" }))
        .await;
    let (status, body) = ctx.put("/api/friends/bob/deck", "alice", edit).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "this deck is read-only");

    let (_, screen) = ctx.get("/api/deck", Some("bob")).await;
    assert_eq!(screen["cards"]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_store_outage_on_friends() {
    let ctx = TestContext::new();
    ctx.post(
        "/api/friends",
        "alice",
        json!({ "friend_id": "bob", "display_name": "Bob" }),
    )
    .await;
    ctx.store.set_unavailable(true);

    let (status, body) = ctx.get("/api/friends", Some("alice")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Card storage is unavailable");

    let (status, _) = ctx
        .post("/api/friends", "alice", json!({ "friend_id": "carol" }))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = ctx.delete("/api/friends/bob", "alice").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, screen) = ctx.get("/api/friends/bob/deck", Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(screen["status"], "loading");
    assert_eq!(screen["mode"], "read_only");
    assert_eq!(screen["cards"]["total_items"], 0);
    assert_eq!(screen["notifications"][0]["level"], "error");

    ctx.store.set_unavailable(false);
    let (_, friends) = ctx.get("/api/friends", Some("alice")).await;
    assert_eq!(friends, json!([{ "friend_id": "bob", "display_name": "Bob" }]));
}
