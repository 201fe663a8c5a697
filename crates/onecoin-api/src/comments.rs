use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use onecoin_types::api::{CommentResponse, CreateCommentRequest, UpdateCommentRequest};
use onecoin_types::models::Claims;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::guard;

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Comment content is required".into()));
    }

    let comment = blocking(&state, move |state| {
        state.db.write(|store| {
            guard::visible_post(store, req.post_id, &claims)?;
            Ok(store.insert_comment(claims.sub, req.post_id, &req.content)?)
        })
    })
    .await?;

    info!(comment = %comment.id, post = %comment.post_id, "Comment created");
    Ok((StatusCode::CREATED, Json(CommentResponse::from(comment))))
}

pub async fn get_comments_by_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let comments = blocking(&state, move |state| {
        state.db.read(|store| {
            guard::visible_post(store, post_id, &claims)?;
            Ok(store.find_comments_by_post(post_id)?)
        })
    })
    .await?;

    let comments: Vec<CommentResponse> = comments.into_iter().map(Into::into).collect();
    Ok(Json(comments))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateCommentRequest>,
) -> ApiResult<impl IntoResponse> {
    let actor = claims.sub;
    let comment = blocking(&state, move |state| {
        state.db.write(|store| {
            let mut comment = store
                .get_comment(comment_id)?
                .ok_or(ApiError::NotFound("Comment"))?;
            guard::authorize(&claims, comment.owner_id)?;

            if let Some(content) = req.content {
                if content.trim().is_empty() {
                    return Err(ApiError::InvalidArgument("Comment content is required".into()));
                }
                comment.content = content;
            }
            comment.updated_at = Utc::now();

            store.update_comment(&comment)?;
            Ok(comment)
        })
    })
    .await?;

    info!(comment = %comment_id, by = %actor, "Comment updated");
    Ok(Json(CommentResponse::from(comment)))
}
