//! Like toggles and the friend request lifecycle.
//!
//! Each operation is one `Database::write` call: the read, the state
//! transition and every derived write commit together or not at all.

use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use onecoin_db::models::FriendRequestRow;
use onecoin_db::{Database, FriendRequestFilter, Store};
use onecoin_types::api::ToggleLikeResponse;
use onecoin_types::models::{Claims, Decision, FriendRequestStatus, LikeOutcome};

use crate::error::{ApiError, ApiResult};
use crate::guard;

/// Insert `member` if absent, remove it if present.
pub fn toggle_membership(set: &mut Vec<Uuid>, member: Uuid) -> LikeOutcome {
    match set.iter().position(|id| *id == member) {
        Some(index) => {
            set.remove(index);
            LikeOutcome::Removed
        }
        None => {
            set.push(member);
            LikeOutcome::Added
        }
    }
}

/// Insert `member` once. Returns false if it was already there.
fn insert_once(set: &mut Vec<Uuid>, member: Uuid) -> bool {
    if set.contains(&member) {
        false
    } else {
        set.push(member);
        true
    }
}

pub fn toggle_like(db: &Database, post_id: Uuid, actor: &Claims) -> ApiResult<ToggleLikeResponse> {
    db.write(|store| {
        let mut post = guard::visible_post(store, post_id, actor)?;

        let outcome = toggle_membership(&mut post.likes, actor.sub);
        store.update_post(&post)?;

        info!(post = %post_id, account = %actor.sub, ?outcome, likes = post.likes_count(), "Like toggled");

        Ok(ToggleLikeResponse {
            outcome,
            likes_count: post.likes_count(),
            liker_ids: post.likes,
        })
    })
}

pub fn propose(db: &Database, proposer_id: Uuid, target_id: Uuid) -> ApiResult<FriendRequestRow> {
    if proposer_id == target_id {
        return Err(ApiError::InvalidArgument(
            "You cannot send a friend request to yourself".into(),
        ));
    }

    db.write(|store| {
        let target = store.get_account(target_id)?.ok_or(ApiError::NotFound("Account"))?;
        if target.is_friend_of(proposer_id) {
            return Err(ApiError::Conflict("Already friends".into()));
        }

        // Answered requests stay as history and do not block a new one.
        let pending = store
            .find_friend_requests(&FriendRequestFilter::pair(proposer_id, target_id))?
            .into_iter()
            .any(|r| r.status == FriendRequestStatus::Pending);
        if pending {
            return Err(ApiError::Conflict("Request already sent".into()));
        }

        let request = store.insert_friend_request(proposer_id, target_id)?;
        info!(request = %request.id, proposer = %proposer_id, target = %target_id, "Friend request proposed");
        Ok(request)
    })
}

/// Only the target may answer, and only while the request is pending.
/// Acceptance links both accounts as friends in the same transaction.
pub fn respond(
    db: &Database,
    request_id: Uuid,
    actor_id: Uuid,
    decision: Decision,
) -> ApiResult<FriendRequestRow> {
    db.write(|store| {
        let mut request = store
            .get_friend_request(request_id)?
            .ok_or(ApiError::NotFound("Friend request"))?;

        if request.target_id != actor_id {
            tracing::warn!(request = %request_id, actor = %actor_id, "Respond by non-target denied");
            return Err(ApiError::Forbidden);
        }

        if request.status.is_terminal() {
            return Err(ApiError::Conflict(format!(
                "Request already {}",
                request.status.as_str()
            )));
        }

        request.status = decision.resulting_status();
        request.responded_at = Some(Utc::now());
        store.update_friend_request(&request)?;

        if decision == Decision::Accept {
            link_friends(store, request.proposer_id, request.target_id)?;
        }

        info!(request = %request_id, status = request.status.as_str(), "Friend request answered");
        Ok(request)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

pub fn list_requests(db: &Database, account_id: Uuid, direction: Direction) -> ApiResult<Vec<FriendRequestRow>> {
    let filter = match direction {
        Direction::Sent => FriendRequestFilter::sent_by(account_id),
        Direction::Received => FriendRequestFilter::received_by(account_id),
    };
    Ok(db.read(|store| store.find_friend_requests(&filter))?)
}

/// Remove the friendship from both sides.
pub fn unfriend(db: &Database, account_id: Uuid, friend_id: Uuid) -> ApiResult<()> {
    db.write(|store| {
        let mut account = store.get_account(account_id)?.ok_or(ApiError::NotFound("Account"))?;
        let mut friend = store.get_account(friend_id)?.ok_or(ApiError::NotFound("Account"))?;

        account.friends.retain(|id| *id != friend_id);
        friend.friends.retain(|id| *id != account_id);

        store.update_account(&account)?;
        store.update_account(&friend)?;
        info!(account = %account_id, friend = %friend_id, "Friendship removed");
        Ok(())
    })
}

fn link_friends(store: &Store<'_>, a: Uuid, b: Uuid) -> ApiResult<()> {
    let mut first = store.get_account(a)?.ok_or(ApiError::NotFound("Account"))?;
    let mut second = store.get_account(b)?.ok_or(ApiError::NotFound("Account"))?;

    if insert_once(&mut first.friends, b) {
        store.update_account(&first)?;
    }
    if insert_once(&mut second.friends, a) {
        store.update_account(&second)?;
    }
    Ok(())
}
