use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use onecoin_types::models::{FriendRequestStatus, Privacy, Role};

use crate::models::{
    AccountRow, CommentRow, FriendRequestRow, MessageRow, NewAccount, NewPost, PostRow,
};

/// Typed entity access over one connection (or an open transaction).
///
/// Inserts assign the identifier and creation timestamp. Updates write the
/// whole mutable part of a row and return whether a row matched.
pub struct Store<'c> {
    conn: &'c Connection,
}

/// Friend request lookup. `None` fields match anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct FriendRequestFilter {
    pub proposer_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
}

impl FriendRequestFilter {
    pub fn sent_by(proposer_id: Uuid) -> Self {
        Self {
            proposer_id: Some(proposer_id),
            target_id: None,
        }
    }

    pub fn received_by(target_id: Uuid) -> Self {
        Self {
            proposer_id: None,
            target_id: Some(target_id),
        }
    }

    pub fn pair(proposer_id: Uuid, target_id: Uuid) -> Self {
        Self {
            proposer_id: Some(proposer_id),
            target_id: Some(target_id),
        }
    }
}

const ACCOUNT_COLUMNS: &str = "id, username, email, password, role, bio, profile_image, cover_image, \
     phone, ruc_enterprise, friends, followers, following, settings, registration_date, last_login";

const POST_COLUMNS: &str =
    "id, owner_id, title, content, images, tags, privacy, location, likes, created_at, updated_at";

const COMMENT_COLUMNS: &str = "id, owner_id, post_id, content, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, sender_id, recipient_id, content, read, sent_at";

const FRIEND_REQUEST_COLUMNS: &str =
    "id, proposer_id, target_id, status, created_at, responded_at";

impl<'c> Store<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    // -- Accounts --

    pub fn insert_account(&self, new: NewAccount<'_>) -> Result<AccountRow> {
        let row = AccountRow {
            id: Uuid::new_v4(),
            username: new.username.to_string(),
            email: new.email.to_string(),
            password: new.password_hash.to_string(),
            role: new.role,
            bio: None,
            profile_image: None,
            cover_image: None,
            phone: None,
            ruc_enterprise: None,
            friends: Vec::new(),
            followers: Vec::new(),
            following: Vec::new(),
            settings: Default::default(),
            registration_date: Utc::now(),
            last_login: None,
        };

        self.conn.execute(
            "INSERT INTO accounts (id, username, email, password, role, settings, registration_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                row.id.to_string(),
                row.username,
                row.email,
                row.password,
                row.role.as_str(),
                to_json(&row.settings)?,
                timestamp(&row.registration_date),
            ],
        )?;

        Ok(row)
    }

    pub fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1");
        self.query_opt(&sql, [id.to_string()], map_account)
    }

    pub fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1");
        self.query_opt(&sql, [email], map_account)
    }

    pub fn get_account_by_username(&self, username: &str) -> Result<Option<AccountRow>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username = ?1");
        self.query_opt(&sql, [username], map_account)
    }

    pub fn list_accounts(&self) -> Result<Vec<AccountRow>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY registration_date, rowid");
        self.query_all(&sql, [], map_account)
    }

    pub fn update_account(&self, row: &AccountRow) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE accounts SET role = ?2, bio = ?3, profile_image = ?4, cover_image = ?5,
                phone = ?6, ruc_enterprise = ?7, friends = ?8, followers = ?9, following = ?10,
                settings = ?11, last_login = ?12
             WHERE id = ?1",
            params![
                row.id.to_string(),
                row.role.as_str(),
                row.bio,
                row.profile_image,
                row.cover_image,
                row.phone,
                row.ruc_enterprise,
                to_json(&row.friends)?,
                to_json(&row.followers)?,
                to_json(&row.following)?,
                to_json(&row.settings)?,
                row.last_login.as_ref().map(timestamp),
            ],
        )?;
        Ok(changed > 0)
    }

    // -- Posts --

    pub fn insert_post(&self, new: NewPost) -> Result<PostRow> {
        let now = Utc::now();
        let row = PostRow {
            id: Uuid::new_v4(),
            owner_id: new.owner_id,
            title: new.title,
            content: new.content,
            images: new.images,
            tags: new.tags,
            privacy: new.privacy,
            location: new.location,
            likes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO posts (id, owner_id, title, content, images, tags, privacy, location, likes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                row.id.to_string(),
                row.owner_id.to_string(),
                row.title,
                row.content,
                to_json(&row.images)?,
                to_json(&row.tags)?,
                row.privacy.as_str(),
                row.location.as_ref().map(to_json).transpose()?,
                to_json(&row.likes)?,
                timestamp(&row.created_at),
                timestamp(&row.updated_at),
            ],
        )?;

        Ok(row)
    }

    pub fn get_post(&self, id: Uuid) -> Result<Option<PostRow>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1");
        self.query_opt(&sql, [id.to_string()], map_post)
    }

    pub fn list_posts(&self) -> Result<Vec<PostRow>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, rowid DESC");
        self.query_all(&sql, [], map_post)
    }

    pub fn find_posts_by_owner(&self, owner_id: Uuid) -> Result<Vec<PostRow>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        self.query_all(&sql, [owner_id.to_string()], map_post)
    }

    pub fn update_post(&self, row: &PostRow) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE posts SET title = ?2, content = ?3, images = ?4, tags = ?5, privacy = ?6,
                location = ?7, likes = ?8, updated_at = ?9
             WHERE id = ?1",
            params![
                row.id.to_string(),
                row.title,
                row.content,
                to_json(&row.images)?,
                to_json(&row.tags)?,
                row.privacy.as_str(),
                row.location.as_ref().map(to_json).transpose()?,
                to_json(&row.likes)?,
                timestamp(&row.updated_at),
            ],
        )?;
        Ok(changed > 0)
    }

    // -- Comments --

    pub fn insert_comment(&self, owner_id: Uuid, post_id: Uuid, content: &str) -> Result<CommentRow> {
        let now = Utc::now();
        let row = CommentRow {
            id: Uuid::new_v4(),
            owner_id,
            post_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO comments (id, owner_id, post_id, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id.to_string(),
                row.owner_id.to_string(),
                row.post_id.to_string(),
                row.content,
                timestamp(&row.created_at),
                timestamp(&row.updated_at),
            ],
        )?;

        Ok(row)
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<CommentRow>> {
        let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
        self.query_opt(&sql, [id.to_string()], map_comment)
    }

    pub fn find_comments_by_post(&self, post_id: Uuid) -> Result<Vec<CommentRow>> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        self.query_all(&sql, [post_id.to_string()], map_comment)
    }

    pub fn update_comment(&self, row: &CommentRow) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE comments SET content = ?2, updated_at = ?3 WHERE id = ?1",
            params![row.id.to_string(), row.content, timestamp(&row.updated_at)],
        )?;
        Ok(changed > 0)
    }

    // -- Messages --

    pub fn insert_message(&self, sender_id: Uuid, recipient_id: Uuid, content: &str) -> Result<MessageRow> {
        let row = MessageRow {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            content: content.to_string(),
            read: false,
            sent_at: Utc::now(),
        };

        self.conn.execute(
            "INSERT INTO messages (id, sender_id, recipient_id, content, read, sent_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                row.id.to_string(),
                row.sender_id.to_string(),
                row.recipient_id.to_string(),
                row.content,
                row.read,
                timestamp(&row.sent_at),
            ],
        )?;

        Ok(row)
    }

    pub fn get_message(&self, id: Uuid) -> Result<Option<MessageRow>> {
        let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1");
        self.query_opt(&sql, [id.to_string()], map_message)
    }

    /// Messages newest first. With `party`, only messages that account sent or received.
    pub fn list_messages(&self, party: Option<Uuid>) -> Result<Vec<MessageRow>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE ?1 IS NULL OR sender_id = ?1 OR recipient_id = ?1
             ORDER BY sent_at DESC, rowid DESC"
        );
        self.query_all(&sql, [party.map(|id| id.to_string())], map_message)
    }

    /// Both directions between two accounts, oldest first.
    pub fn find_conversation(&self, a: Uuid, b: Uuid) -> Result<Vec<MessageRow>> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE (sender_id = ?1 AND recipient_id = ?2) OR (sender_id = ?2 AND recipient_id = ?1)
             ORDER BY sent_at ASC, rowid ASC"
        );
        self.query_all(&sql, [a.to_string(), b.to_string()], map_message)
    }

    pub fn update_message(&self, row: &MessageRow) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE messages SET content = ?2, read = ?3 WHERE id = ?1",
            params![row.id.to_string(), row.content, row.read],
        )?;
        Ok(changed > 0)
    }

    pub fn delete_message(&self, id: Uuid) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])?;
        Ok(changed > 0)
    }

    // -- Friend requests --

    pub fn insert_friend_request(&self, proposer_id: Uuid, target_id: Uuid) -> Result<FriendRequestRow> {
        let row = FriendRequestRow {
            id: Uuid::new_v4(),
            proposer_id,
            target_id,
            status: FriendRequestStatus::Pending,
            created_at: Utc::now(),
            responded_at: None,
        };

        self.conn.execute(
            "INSERT INTO friend_requests (id, proposer_id, target_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                row.id.to_string(),
                row.proposer_id.to_string(),
                row.target_id.to_string(),
                row.status.as_str(),
                timestamp(&row.created_at),
            ],
        )?;

        Ok(row)
    }

    pub fn get_friend_request(&self, id: Uuid) -> Result<Option<FriendRequestRow>> {
        let sql = format!("SELECT {FRIEND_REQUEST_COLUMNS} FROM friend_requests WHERE id = ?1");
        self.query_opt(&sql, [id.to_string()], map_friend_request)
    }

    /// Newest first.
    pub fn find_friend_requests(&self, filter: &FriendRequestFilter) -> Result<Vec<FriendRequestRow>> {
        let sql = format!(
            "SELECT {FRIEND_REQUEST_COLUMNS} FROM friend_requests
             WHERE (?1 IS NULL OR proposer_id = ?1) AND (?2 IS NULL OR target_id = ?2)
             ORDER BY created_at DESC, rowid DESC"
        );
        self.query_all(
            &sql,
            [
                filter.proposer_id.map(|id| id.to_string()),
                filter.target_id.map(|id| id.to_string()),
            ],
            map_friend_request,
        )
    }

    pub fn update_friend_request(&self, row: &FriendRequestRow) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE friend_requests SET status = ?2, responded_at = ?3 WHERE id = ?1",
            params![
                row.id.to_string(),
                row.status.as_str(),
                row.responded_at.as_ref().map(timestamp),
            ],
        )?;
        Ok(changed > 0)
    }

    // -- helpers --

    fn query_opt<P, T, F>(&self, sql: &str, params: P, map: F) -> Result<Option<T>>
    where
        P: rusqlite::Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        stmt.query_row(params, map).optional()
    }

    fn query_all<P, T, F>(&self, sql: &str, params: P, map: F) -> Result<Vec<T>>
    where
        P: rusqlite::Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn map_account(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: uuid_at(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: parsed_at(row, 4, Role::parse)?,
        bio: row.get(5)?,
        profile_image: row.get(6)?,
        cover_image: row.get(7)?,
        phone: row.get(8)?,
        ruc_enterprise: row.get(9)?,
        friends: json_at(row, 10)?,
        followers: json_at(row, 11)?,
        following: json_at(row, 12)?,
        settings: json_at(row, 13)?,
        registration_date: time_at(row, 14)?,
        last_login: opt_time_at(row, 15)?,
    })
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    let location: Option<String> = row.get(7)?;
    let location = location
        .map(|raw| serde_json::from_str(&raw))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(PostRow {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        images: json_at(row, 4)?,
        tags: json_at(row, 5)?,
        privacy: parsed_at(row, 6, Privacy::parse)?,
        location,
        likes: json_at(row, 8)?,
        created_at: time_at(row, 9)?,
        updated_at: time_at(row, 10)?,
    })
}

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: uuid_at(row, 0)?,
        owner_id: uuid_at(row, 1)?,
        post_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        created_at: time_at(row, 4)?,
        updated_at: time_at(row, 5)?,
    })
}

fn map_message(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: uuid_at(row, 0)?,
        sender_id: uuid_at(row, 1)?,
        recipient_id: uuid_at(row, 2)?,
        content: row.get(3)?,
        read: row.get(4)?,
        sent_at: time_at(row, 5)?,
    })
}

fn map_friend_request(row: &Row<'_>) -> rusqlite::Result<FriendRequestRow> {
    Ok(FriendRequestRow {
        id: uuid_at(row, 0)?,
        proposer_id: uuid_at(row, 1)?,
        target_id: uuid_at(row, 2)?,
        status: parsed_at(row, 3, FriendRequestStatus::parse)?,
        created_at: time_at(row, 4)?,
        responded_at: opt_time_at(row, 5)?,
    })
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_time(idx, &raw)
}

fn opt_time_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| parse_time(idx, &raw)).transpose()
}

fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn json_at<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parsed_at<T>(row: &Row<'_>, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or(rusqlite::Error::InvalidColumnType(idx, raw, Type::Text))
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
