use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;
use uuid::Uuid;

use onecoin_db::models::AccountRow;
use onecoin_types::api::{AccountResponse, AccountSummary, ProfileView, UpdateAccountRequest};
use onecoin_types::models::Claims;

use crate::auth::{AppState, blocking};
use crate::error::{ApiError, ApiResult};
use crate::{guard, relationships};

fn profile_view(actor: &Claims, account: AccountRow) -> ProfileView {
    if guard::is_allowed(actor, account.id) {
        ProfileView::Full(account.into())
    } else {
        ProfileView::Public(account.into())
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let accounts = blocking(&state, |state| Ok(state.db.read(|store| store.list_accounts())?)).await?;
    let accounts: Vec<ProfileView> = accounts
        .into_iter()
        .map(|account| profile_view(&claims, account))
        .collect();
    Ok(Json(accounts))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    let account = blocking(&state, move |state| {
        state
            .db
            .read(|store| store.get_account(user_id))?
            .ok_or(ApiError::NotFound("Account"))
    })
    .await?;

    Ok(Json(profile_view(&claims, account)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<UpdateAccountRequest>,
) -> ApiResult<impl IntoResponse> {
    guard::authorize(&claims, user_id)?;

    let account = blocking(&state, move |state| {
        state.db.write(|store| {
            let mut account = store
                .get_account(user_id)?
                .ok_or(ApiError::NotFound("Account"))?;

            if let Some(bio) = req.bio {
                account.bio = Some(bio);
            }
            if let Some(profile_image) = req.profile_image {
                account.profile_image = Some(profile_image);
            }
            if let Some(cover_image) = req.cover_image {
                account.cover_image = Some(cover_image);
            }
            if let Some(phone) = req.phone {
                account.phone = Some(phone);
            }
            if let Some(ruc) = req.ruc_enterprise {
                account.ruc_enterprise = Some(ruc);
            }
            if let Some(settings) = req.settings {
                account.settings = settings;
            }

            store.update_account(&account)?;
            Ok(account)
        })
    })
    .await?;

    info!(account = %user_id, by = %claims.sub, "Profile updated");
    Ok(Json(AccountResponse::from(account)))
}

pub async fn get_friends(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    guard::authorize(&claims, user_id)?;

    let friends = blocking(&state, move |state| {
        state.db.read(|store| {
            let account = store
                .get_account(user_id)?
                .ok_or(ApiError::NotFound("Account"))?;
            let mut friends = Vec::with_capacity(account.friends.len());
            for id in &account.friends {
                if let Some(friend) = store.get_account(*id)? {
                    friends.push(AccountSummary::from(friend));
                }
            }
            Ok(friends)
        })
    })
    .await?;

    Ok(Json(friends))
}

pub async fn remove_friend(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(Uuid, Uuid)>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<impl IntoResponse> {
    guard::authorize(&claims, user_id)?;

    blocking(&state, move |state| relationships::unfriend(&state.db, user_id, friend_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
