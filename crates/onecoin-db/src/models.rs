//! Database row types. Conversions into the `onecoin-types` API views live here
//! so handlers never see password hashes or raw JSON columns.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use onecoin_types::api::{
    AccountResponse, AccountSummary, CommentResponse, FriendRequestResponse, MessageResponse,
    PostResponse, PublicProfile,
};
use onecoin_types::models::{AccountSettings, FriendRequestStatus, Location, Privacy, Role};

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub bio: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub phone: Option<String>,
    pub ruc_enterprise: Option<String>,
    pub friends: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub following: Vec<Uuid>,
    pub settings: AccountSettings,
    pub registration_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl AccountRow {
    pub fn is_friend_of(&self, other: Uuid) -> bool {
        self.friends.contains(&other)
    }
}

pub struct NewAccount<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub privacy: Privacy,
    pub location: Option<Location>,
    /// Liker ids in the order they liked. Never contains duplicates.
    pub likes: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostRow {
    pub fn likes_count(&self) -> usize {
        self.likes.len()
    }
}

pub struct NewPost {
    pub owner_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub privacy: Privacy,
    pub location: Option<Location>,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub post_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MessageRow {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub content: String,
    pub read: bool,
    pub sent_at: DateTime<Utc>,
}

impl MessageRow {
    pub fn involves(&self, account_id: Uuid) -> bool {
        self.sender_id == account_id || self.recipient_id == account_id
    }
}

#[derive(Debug, Clone)]
pub struct FriendRequestRow {
    pub id: Uuid,
    pub proposer_id: Uuid,
    pub target_id: Uuid,
    pub status: FriendRequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

// -- API views --

impl From<AccountRow> for AccountResponse {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            role: row.role,
            bio: row.bio,
            profile_image: row.profile_image,
            cover_image: row.cover_image,
            phone: row.phone,
            ruc_enterprise: row.ruc_enterprise,
            friends: row.friends,
            followers: row.followers,
            following: row.following,
            settings: row.settings,
            registration_date: row.registration_date,
            last_login: row.last_login,
        }
    }
}

impl From<AccountRow> for PublicProfile {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            bio: row.bio,
            profile_image: row.profile_image,
            cover_image: row.cover_image,
            registration_date: row.registration_date,
        }
    }
}

impl From<AccountRow> for AccountSummary {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            profile_image: row.profile_image,
        }
    }
}

impl From<PostRow> for PostResponse {
    fn from(row: PostRow) -> Self {
        Self {
            likes_count: row.likes_count(),
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            content: row.content,
            images: row.images,
            tags: row.tags,
            privacy: row.privacy,
            location: row.location,
            liker_ids: row.likes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<CommentRow> for CommentResponse {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.owner_id,
            post_id: row.post_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<MessageRow> for MessageResponse {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            content: row.content,
            read: row.read,
            sent_at: row.sent_at,
        }
    }
}

impl From<FriendRequestRow> for FriendRequestResponse {
    fn from(row: FriendRequestRow) -> Self {
        Self {
            id: row.id,
            proposer_id: row.proposer_id,
            target_id: row.target_id,
            status: row.status,
            created_at: row.created_at,
            responded_at: row.responded_at,
        }
    }
}
