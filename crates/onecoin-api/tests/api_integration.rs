//! Router-level tests: bearer auth, ownership checks and the relationship
//! endpoints driven through the real axum `Router`.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::Duration;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use onecoin_api::{AppStateInner, TokenService, router};
use onecoin_db::Database;

fn app() -> Router {
    let state = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        tokens: TokenService::new("integration-secret", Duration::hours(1)),
        admin_emails: vec!["root@example.com".to_string()],
    });
    router(state)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Register an account and return (id, token).
async fn register(app: &Router, username: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "password123",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {username}: {body}");
    (
        body["user_id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn create_post(app: &Router, token: &str, privacy: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/posts",
        Some(token),
        Some(json!({ "title": "hello", "content": "first", "privacy": privacy })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn missing_or_bad_token_is_rejected_before_handlers() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    let (status, _) = send(&app, "GET", "/api/posts", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenService::new("someone-else", Duration::hours(1))
        .issue(uuid::Uuid::new_v4(), onecoin_types::models::Role::Admin)
        .unwrap();
    let (status, _) = send(&app, "GET", "/api/posts", Some(&foreign), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_and_login() {
    let app = app();
    let (id, _) = register(&app, "maria").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "maria@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], id.as_str());
    assert_eq!(body["role"], "user");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "maria@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "maria", "email": "other@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "shorty", "email": "shorty@example.com", "password": "short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn emails_are_case_insensitive() {
    let app = app();
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "ROOTUSER", "email": "Root@Example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "root@example.COM", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");

    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "imposter", "email": "ROOT@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn username_length_counts_characters() {
    let app = app();
    // Three characters, six bytes.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "ñoñ", "email": "nono@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Twenty characters, forty bytes.
    let (status, _) = send(
        &app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "username": "ñ".repeat(20), "email": "long@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn strangers_only_see_public_profiles() {
    let app = app();
    let (alice_id, alice) = register(&app, "alice").await;
    let (bob_id, bob) = register(&app, "bob").await;
    let (_, carol) = register(&app, "carol").await;
    let (_, admin) = register(&app, "root").await;

    let (_, body) = send(
        &app,
        "POST",
        "/api/relationships/friend-requests",
        Some(&bob),
        Some(json!({ "target_id": alice_id })),
    )
    .await;
    let request_uri = format!("/api/relationships/friend-requests/{}", body["id"].as_str().unwrap());
    send(&app, "PUT", &request_uri, Some(&alice), Some(json!({ "decision": "accept" }))).await;

    let alice_uri = format!("/api/auth/users/{alice_id}");

    let (status, _) = send(&app, "GET", &format!("{alice_uri}/friends"), Some(&carol), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", &alice_uri, Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    for hidden in ["friends", "email", "phone", "ruc_enterprise", "settings", "role"] {
        assert!(body.get(hidden).is_none(), "{hidden} leaked to a stranger");
    }

    let (_, body) = send(&app, "GET", &alice_uri, Some(&alice), None).await;
    assert_eq!(body["friends"], json!([bob_id]));
    assert_eq!(body["email"], "alice@example.com");

    let (_, body) = send(&app, "GET", &alice_uri, Some(&admin), None).await;
    assert_eq!(body["friends"], json!([bob_id]));

    let (status, body) = send(&app, "GET", "/api/auth/users", Some(&carol), None).await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 4);
    for profile in listed {
        if profile["username"] == "carol" {
            assert_eq!(profile["email"], "carol@example.com");
        } else {
            assert!(profile.get("email").is_none());
            assert!(profile.get("friends").is_none());
        }
    }
}

#[tokio::test]
async fn post_edits_require_owner_or_admin() {
    let app = app();
    let (_, owner) = register(&app, "owner").await;
    let (_, stranger) = register(&app, "stranger").await;
    let (_, admin) = register(&app, "root").await;
    let post_id = create_post(&app, &owner, "public").await;
    let uri = format!("/api/posts/{post_id}");

    let (status, _) = send(&app, "PUT", &uri, Some(&stranger), Some(json!({ "title": "mine now" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &uri, Some(&owner), Some(json!({ "title": "edited" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "edited");

    let (status, body) = send(&app, "PUT", &uri, Some(&admin), Some(json!({ "content": "moderated" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "moderated");
    assert_eq!(body["title"], "edited");

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/posts/{}", uuid::Uuid::new_v4()),
        Some(&owner),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_edits_require_owner_or_admin() {
    let app = app();
    let (_, author) = register(&app, "author").await;
    let (_, stranger) = register(&app, "stranger").await;
    let post_id = create_post(&app, &author, "public").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/comments",
        Some(&stranger),
        Some(json!({ "post_id": post_id, "content": "nice" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment_uri = format!("/api/comments/{}", body["id"].as_str().unwrap());

    let (status, _) = send(&app, "PUT", &comment_uri, Some(&author), Some(json!({ "content": "rude" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &comment_uri, Some(&stranger), Some(json!({ "content": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");

    let (status, body) = send(&app, "PUT", &comment_uri, Some(&stranger), Some(json!({ "content": "very nice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "very nice");

    let (status, body) = send(&app, "GET", &format!("/api/comments/post/{post_id}"), Some(&author), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn like_toggle_scenario() {
    let app = app();
    let (_, u1) = register(&app, "user1").await;
    let (u2_id, u2) = register(&app, "user2").await;
    let (u3_id, u3) = register(&app, "user3").await;
    let post_id = create_post(&app, &u1, "public").await;
    let uri = format!("/api/posts/{post_id}/likes");

    let (status, body) = send(&app, "PUT", &uri, Some(&u2), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "added");
    assert_eq!(body["likes_count"], 1);
    assert_eq!(body["liker_ids"], json!([u2_id]));

    let (_, body) = send(&app, "PUT", &uri, Some(&u2), None).await;
    assert_eq!(body["outcome"], "removed");
    assert_eq!(body["likes_count"], 0);

    let (_, body) = send(&app, "PUT", &uri, Some(&u3), None).await;
    assert_eq!(body["outcome"], "added");
    assert_eq!(body["likes_count"], 1);

    let (status, body) = send(&app, "GET", &uri, Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], u3_id.as_str());
    assert_eq!(body[0]["username"], "user3");

    let (_, body) = send(&app, "GET", &format!("/api/posts/{post_id}"), Some(&u1), None).await;
    assert_eq!(body["likes_count"], body["liker_ids"].as_array().unwrap().len());

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/posts/{}/likes", uuid::Uuid::new_v4()),
        Some(&u2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn friend_request_lifecycle() {
    let app = app();
    let (u1_id, u1) = register(&app, "user1").await;
    let (u2_id, u2) = register(&app, "user2").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/relationships/friend-requests",
        Some(&u1),
        Some(json!({ "target_id": u2_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    let request_uri = format!("/api/relationships/friend-requests/{}", body["id"].as_str().unwrap());

    let (status, _) = send(
        &app,
        "POST",
        "/api/relationships/friend-requests",
        Some(&u1),
        Some(json!({ "target_id": u2_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/api/relationships/friend-requests",
        Some(&u1),
        Some(json!({ "target_id": u1_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "GET",
        "/api/relationships/friend-requests?role=received",
        Some(&u2),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["proposer_id"], u1_id.as_str());

    // Someone else's inbox is off limits.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/relationships/friend-requests?role=received&account_id={u2_id}"),
        Some(&u1),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PUT", &request_uri, Some(&u1), Some(json!({ "decision": "accept" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PUT", &request_uri, Some(&u2), Some(json!({ "decision": "accept" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    let (status, _) = send(&app, "PUT", &request_uri, Some(&u2), Some(json!({ "decision": "reject" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", &format!("/api/auth/users/{u1_id}/friends"), Some(&u1), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], u2_id.as_str());

    let (_, body) = send(&app, "GET", &format!("/api/auth/users/{u2_id}"), Some(&u2), None).await;
    assert_eq!(body["friends"], json!([u1_id]));
    assert!(body.get("password").is_none());

    // Friends cannot re-propose; after unfriending they can.
    let propose_again = json!({ "target_id": u2_id });
    let (status, _) = send(&app, "POST", "/api/relationships/friend-requests", Some(&u1), Some(propose_again.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, "DELETE", &format!("/api/auth/users/{u1_id}/friends/{u2_id}"), Some(&u1), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "POST", "/api/relationships/friend-requests", Some(&u1), Some(propose_again)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
}

#[tokio::test]
async fn message_permissions_follow_sender_and_recipient() {
    let app = app();
    let (_, alice) = register(&app, "alice").await;
    let (bob_id, bob) = register(&app, "bob").await;
    let (_, eve) = register(&app, "eve").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/messages",
        Some(&alice),
        Some(json!({ "recipient_id": bob_id, "content": "hola" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["read"], false);
    let uri = format!("/api/messages/{}", body["id"].as_str().unwrap());

    let (status, _) = send(&app, "GET", &uri, Some(&eve), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "PATCH", &format!("{uri}/read"), Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "PATCH", &format!("{uri}/read"), Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["read"], true);

    let (status, _) = send(&app, "PUT", &uri, Some(&bob), Some(json!({ "content": "forged" }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/messages", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/messages", Some(&eve), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = send(&app, "DELETE", &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn private_posts_are_hidden_from_strangers() {
    let app = app();
    let (owner_id, owner) = register(&app, "owner").await;
    let (_, stranger) = register(&app, "stranger").await;
    let post_id = create_post(&app, &owner, "private").await;

    let (status, _) = send(&app, "GET", &format!("/api/posts/{post_id}"), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, "GET", &format!("/api/posts/user/{owner_id}"), Some(&stranger), None).await;
    assert!(body.as_array().unwrap().is_empty());

    let (_, body) = send(&app, "GET", &format!("/api/posts/user/{owner_id}"), Some(&owner), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
