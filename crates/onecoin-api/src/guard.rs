use uuid::Uuid;

use onecoin_db::Store;
use onecoin_db::models::PostRow;
use onecoin_types::models::{Claims, Privacy};

use crate::error::{ApiError, ApiResult};

/// The single ownership rule for writes: the owner, or any admin.
pub fn is_allowed(actor: &Claims, owner_id: Uuid) -> bool {
    actor.sub == owner_id || actor.role.is_elevated()
}

pub fn authorize(actor: &Claims, owner_id: Uuid) -> ApiResult<()> {
    if is_allowed(actor, owner_id) {
        Ok(())
    } else {
        tracing::warn!(actor = %actor.sub, owner = %owner_id, "Authorization denied");
        Err(ApiError::Forbidden)
    }
}

/// Whether `actor` may see `post`. Friends-only posts consult the owner's friend set.
pub fn can_view(store: &Store<'_>, post: &PostRow, actor: &Claims) -> anyhow::Result<bool> {
    if is_allowed(actor, post.owner_id) {
        return Ok(true);
    }

    match post.privacy {
        Privacy::Public => Ok(true),
        Privacy::Private => Ok(false),
        Privacy::Friends => Ok(store
            .get_account(post.owner_id)?
            .is_some_and(|owner| owner.is_friend_of(actor.sub))),
    }
}

/// Fetch a post the actor is allowed to see. Hidden posts are reported as missing.
pub fn visible_post(store: &Store<'_>, post_id: Uuid, actor: &Claims) -> ApiResult<PostRow> {
    let post = store.get_post(post_id)?.ok_or(ApiError::NotFound("Post"))?;
    if !can_view(store, &post, actor)? {
        return Err(ApiError::NotFound("Post"));
    }
    Ok(post)
}
