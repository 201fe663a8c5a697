use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use onecoin_types::api::{MessageResponse, SendMessageRequest, UpdateMessageRequest};
use onecoin_types::models::Claims;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::guard;

#[derive(Debug, Deserialize)]
pub struct ConversationQuery {
    pub with: Uuid,
}

fn into_responses(rows: Vec<onecoin_db::models::MessageRow>) -> Vec<MessageResponse> {
    rows.into_iter().map(Into::into).collect()
}

pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    if req.content.trim().is_empty() {
        return Err(ApiError::InvalidArgument("Message content is required".into()));
    }

    let message = blocking(&state, move |state| {
        state.db.write(|store| {
            if store.get_account(claims.sub)?.is_none() {
                return Err(ApiError::InvalidArgument("Sender does not exist".into()));
            }
            if store.get_account(req.recipient_id)?.is_none() {
                return Err(ApiError::InvalidArgument("Recipient does not exist".into()));
            }
            Ok(store.insert_message(claims.sub, req.recipient_id, &req.content)?)
        })
    })
    .await?;

    info!(message = %message.id, sender = %message.sender_id, recipient = %message.recipient_id, "Message sent");
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Messages the caller sent or received; admins see every message.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let party = (!claims.role.is_elevated()).then_some(claims.sub);
    let messages = blocking(&state, move |state| {
        Ok(state.db.read(|store| store.list_messages(party))?)
    })
    .await?;

    Ok(Json(into_responses(messages)))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    Query(query): Query<ConversationQuery>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let messages = blocking(&state, move |state| {
        Ok(state.db.read(|store| store.find_conversation(claims.sub, query.with))?)
    })
    .await?;

    Ok(Json(into_responses(messages)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let message = blocking(&state, move |state| {
        state
            .db
            .read(|store| store.get_message(message_id))?
            .filter(|m| m.involves(claims.sub) || claims.role.is_elevated())
            .ok_or(ApiError::NotFound("Message"))
    })
    .await?;

    Ok(Json(MessageResponse::from(message)))
}

/// Content edits belong to the sender.
pub async fn update_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = blocking(&state, move |state| {
        state.db.write(|store| {
            let mut message = store
                .get_message(message_id)?
                .ok_or(ApiError::NotFound("Message"))?;
            guard::authorize(&claims, message.sender_id)?;

            if let Some(content) = req.content {
                if content.trim().is_empty() {
                    return Err(ApiError::InvalidArgument("Message content is required".into()));
                }
                message.content = content;
            }

            store.update_message(&message)?;
            Ok(message)
        })
    })
    .await?;

    Ok(Json(MessageResponse::from(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    blocking(&state, move |state| {
        state.db.write(|store| {
            let message = store
                .get_message(message_id)?
                .ok_or(ApiError::NotFound("Message"))?;
            guard::authorize(&claims, message.sender_id)?;
            store.delete_message(message_id)?;
            Ok(())
        })
    })
    .await?;

    info!(message = %message_id, "Message deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Read receipts belong to the recipient.
pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(message_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let message = blocking(&state, move |state| {
        state.db.write(|store| {
            let mut message = store
                .get_message(message_id)?
                .ok_or(ApiError::NotFound("Message"))?;
            guard::authorize(&claims, message.recipient_id)?;

            if !message.read {
                message.read = true;
                store.update_message(&message)?;
            }
            Ok(message)
        })
    })
    .await?;

    Ok(Json(MessageResponse::from(message)))
}
