use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use onecoin_types::api::{FriendRequestResponse, ProposeFriendRequest, RespondFriendRequest};
use onecoin_types::models::Claims;

use crate::auth::{AppState, blocking};
use crate::error::ApiResult;
use crate::guard;
use crate::relationships::{self, Direction};

#[derive(Debug, Deserialize)]
pub struct FriendRequestQuery {
    pub role: Direction,
    /// Defaults to the caller.
    pub account_id: Option<Uuid>,
}

/// POST /relationships/friend-requests. The proposer is always the caller.
pub async fn propose(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<ProposeFriendRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = blocking(&state, move |state| {
        relationships::propose(&state.db, claims.sub, req.target_id)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(FriendRequestResponse::from(request))))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<FriendRequestQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let account_id = query.account_id.unwrap_or(claims.sub);
    guard::authorize(&claims, account_id)?;

    let requests = blocking(&state, move |state| {
        relationships::list_requests(&state.db, account_id, query.role)
    })
    .await?;

    let requests: Vec<FriendRequestResponse> = requests.into_iter().map(Into::into).collect();
    Ok(Json(requests))
}

pub async fn respond(
    State(state): State<AppState>,
    Path(request_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<RespondFriendRequest>,
) -> ApiResult<impl IntoResponse> {
    let request = blocking(&state, move |state| {
        relationships::respond(&state.db, request_id, claims.sub, req.decision)
    })
    .await?;

    Ok(Json(FriendRequestResponse::from(request)))
}
