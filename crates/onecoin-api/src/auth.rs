use std::sync::Arc;

use anyhow::anyhow;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use tracing::{error, info};

use onecoin_db::Database;
use onecoin_db::models::NewAccount;
use onecoin_types::api::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use onecoin_types::models::Role;

use crate::credentials;
use crate::error::{ApiError, ApiResult};
use crate::token::TokenService;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub tokens: TokenService,
    /// Emails that register with the admin role.
    pub admin_emails: Vec<String>,
}

impl AppStateInner {
    fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.iter().any(|e| e.eq_ignore_ascii_case(email)) {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Run blocking store work off the async runtime.
pub(crate) async fn blocking<F, T>(state: &AppState, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppStateInner) -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow!("blocking task failed"))
        })?
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    // Validate input
    let username_len = req.username.chars().count();
    if !(3..=32).contains(&username_len) {
        return Err(ApiError::InvalidArgument(
            "Username must be 3 to 32 characters".into(),
        ));
    }
    let email = credentials::normalize_email(&req.email);
    if !email.contains('@') {
        return Err(ApiError::InvalidArgument("Email is not valid".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::InvalidArgument(
            "Password must be at least 8 characters".into(),
        ));
    }

    let (account_id, role) = blocking(&state, move |state| {
        let password_hash = credentials::hash_password(&req.password)?;
        let role = state.role_for(&email);

        let account = state.db.write(|store| {
            if store.get_account_by_username(&req.username)?.is_some() {
                return Err(ApiError::Conflict("Username already taken".into()));
            }
            if store.get_account_by_email(&email)?.is_some() {
                return Err(ApiError::Conflict("Email already registered".into()));
            }

            Ok(store.insert_account(NewAccount {
                username: &req.username,
                email: &email,
                password_hash: &password_hash,
                role,
            })?)
        })?;

        info!(account = %account.id, username = %account.username, role = role.as_str(), "Account registered");
        Ok((account.id, role))
    })
    .await?;

    let token = state.tokens.issue(account_id, role)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: account_id,
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = blocking(&state, move |state| {
        let mut account = credentials::authenticate(&state.db, &req.email, &req.password)?;
        account.last_login = Some(Utc::now());
        state.db.write(|store| store.update_account(&account))?;
        Ok(account)
    })
    .await?;

    let token = state.tokens.issue(account.id, account.role)?;
    info!(account = %account.id, "Login succeeded");

    Ok(Json(LoginResponse {
        user_id: account.id,
        username: account.username,
        role: account.role,
        token,
    }))
}
