//! REST surface: bearer authentication, the ownership guard, the relationship
//! engine and the handlers that sit on top of them.

pub mod auth;
pub mod comments;
pub mod credentials;
pub mod error;
pub mod friend_requests;
pub mod guard;
pub mod messages;
pub mod middleware;
pub mod posts;
pub mod relationships;
pub mod token;
pub mod users;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
};

pub use auth::{AppState, AppStateInner};
pub use error::{ApiError, ApiResult};
pub use token::{AuthError, TokenService};

/// All `/api` routes. Everything except register and login requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/users", get(users::list_users))
        .route("/auth/users/{id}", get(users::get_user).put(users::update_user))
        .route("/auth/users/{id}/friends", get(users::get_friends))
        .route("/auth/users/{id}/friends/{friend_id}", delete(users::remove_friend))
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/user/{user_id}", get(posts::get_posts_by_user))
        .route("/posts/{id}", get(posts::get_post).put(posts::update_post))
        .route("/posts/{id}/likes", get(posts::get_likes).put(posts::toggle_like))
        .route("/comments", post(comments::create_comment))
        .route("/comments/post/{post_id}", get(comments::get_comments_by_post))
        .route("/comments/{id}", put(comments::update_comment))
        .route("/messages", get(messages::list_messages).post(messages::send_message))
        .route("/messages/conversation", get(messages::get_conversation))
        .route(
            "/messages/{id}",
            get(messages::get_message)
                .put(messages::update_message)
                .delete(messages::delete_message),
        )
        .route("/messages/{id}/read", patch(messages::mark_as_read))
        .route(
            "/relationships/friend-requests",
            get(friend_requests::list).post(friend_requests::propose),
        )
        .route("/relationships/friend-requests/{id}", put(friend_requests::respond))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    Router::new().nest("/api", api)
}
