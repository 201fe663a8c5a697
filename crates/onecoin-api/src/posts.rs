use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use onecoin_db::Store;
use onecoin_db::models::{NewPost, PostRow};
use onecoin_types::api::{AccountSummary, CreatePostRequest, PostResponse, UpdatePostRequest};
use onecoin_types::models::Claims;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::{guard, relationships};

fn visible_only(store: &Store<'_>, posts: Vec<PostRow>, actor: &Claims) -> anyhow::Result<Vec<PostResponse>> {
    let mut visible = Vec::with_capacity(posts.len());
    for post in posts {
        if guard::can_view(store, &post, actor)? {
            visible.push(PostResponse::from(post));
        }
    }
    Ok(visible)
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let post = blocking(&state, move |state| {
        Ok(state.db.write(|store| {
            store.insert_post(NewPost {
                owner_id: claims.sub,
                title: req.title,
                content: req.content,
                images: req.images,
                tags: req.tags,
                privacy: req.privacy,
                location: req.location,
            })
        })?)
    })
    .await?;

    info!(post = %post.id, owner = %post.owner_id, "Post created");
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

pub async fn list_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let posts = blocking(&state, move |state| {
        Ok(state.db.read(|store| {
            let posts = store.list_posts()?;
            visible_only(store, posts, &claims)
        })?)
    })
    .await?;

    Ok(Json(posts))
}

pub async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let post = blocking(&state, move |state| {
        state
            .db
            .read(|store| guard::visible_post(store, post_id, &claims))
    })
    .await?;

    Ok(Json(PostResponse::from(post)))
}

pub async fn get_posts_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let posts = blocking(&state, move |state| {
        Ok(state.db.read(|store| {
            let posts = store.find_posts_by_owner(user_id)?;
            visible_only(store, posts, &claims)
        })?)
    })
    .await?;

    Ok(Json(posts))
}

pub async fn update_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = claims.clone();
    let post = blocking(&state, move |state| {
        state.db.write(|store| {
            let mut post = store.get_post(post_id)?.ok_or(ApiError::NotFound("Post"))?;
            guard::authorize(&actor, post.owner_id)?;

            if let Some(title) = req.title {
                post.title = Some(title);
            }
            if let Some(content) = req.content {
                post.content = Some(content);
            }
            if let Some(images) = req.images {
                post.images = images;
            }
            if let Some(tags) = req.tags {
                post.tags = tags;
            }
            if let Some(privacy) = req.privacy {
                post.privacy = privacy;
            }
            if let Some(location) = req.location {
                post.location = Some(location);
            }
            post.updated_at = Utc::now();

            store.update_post(&post)?;
            Ok(post)
        })
    })
    .await?;

    info!(post = %post_id, by = %claims.sub, "Post updated");
    Ok(Json(PostResponse::from(post)))
}

/// PUT /posts/{id}/likes: any authenticated account that can see the post.
pub async fn toggle_like(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let result = blocking(&state, move |state| {
        relationships::toggle_like(&state.db, post_id, &claims)
    })
    .await?;

    Ok(Json(result))
}

pub async fn get_likes(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let likers = blocking(&state, move |state| {
        state.db.read(|store| {
            let post = guard::visible_post(store, post_id, &claims)?;
            let mut likers = Vec::with_capacity(post.likes.len());
            for id in &post.likes {
                if let Some(account) = store.get_account(*id)? {
                    likers.push(AccountSummary::from(account));
                }
            }
            Ok(likers)
        })
    })
    .await?;

    Ok(Json(likers))
}
