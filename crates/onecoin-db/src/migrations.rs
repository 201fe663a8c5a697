use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE accounts (
                id                  TEXT PRIMARY KEY,
                username            TEXT NOT NULL UNIQUE,
                email               TEXT NOT NULL UNIQUE,
                password            TEXT NOT NULL,
                role                TEXT NOT NULL DEFAULT 'user',
                bio                 TEXT,
                profile_image       TEXT,
                cover_image         TEXT,
                phone               TEXT,
                ruc_enterprise      TEXT,
                friends             TEXT NOT NULL DEFAULT '[]',
                followers           TEXT NOT NULL DEFAULT '[]',
                following           TEXT NOT NULL DEFAULT '[]',
                settings            TEXT NOT NULL,
                registration_date   TEXT NOT NULL,
                last_login          TEXT
            );

            CREATE TABLE posts (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES accounts(id),
                title       TEXT,
                content     TEXT,
                images      TEXT NOT NULL DEFAULT '[]',
                tags        TEXT NOT NULL DEFAULT '[]',
                privacy     TEXT NOT NULL DEFAULT 'public',
                location    TEXT,
                likes       TEXT NOT NULL DEFAULT '[]',
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_posts_owner ON posts(owner_id, created_at);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES accounts(id),
                post_id     TEXT NOT NULL REFERENCES posts(id),
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id, created_at);

            CREATE TABLE messages (
                id              TEXT PRIMARY KEY,
                sender_id       TEXT NOT NULL REFERENCES accounts(id),
                recipient_id    TEXT NOT NULL REFERENCES accounts(id),
                content         TEXT NOT NULL,
                read            INTEGER NOT NULL DEFAULT 0,
                sent_at         TEXT NOT NULL
            );

            CREATE INDEX idx_messages_parties ON messages(sender_id, recipient_id, sent_at);

            CREATE TABLE friend_requests (
                id              TEXT PRIMARY KEY,
                proposer_id     TEXT NOT NULL REFERENCES accounts(id),
                target_id       TEXT NOT NULL REFERENCES accounts(id),
                status          TEXT NOT NULL DEFAULT 'pending',
                created_at      TEXT NOT NULL,
                responded_at    TEXT,
                CHECK(proposer_id <> target_id)
            );

            -- At most one pending request per ordered pair.
            CREATE UNIQUE INDEX idx_friend_requests_pending_pair
                ON friend_requests(proposer_id, target_id) WHERE status = 'pending';

            CREATE INDEX idx_friend_requests_target ON friend_requests(target_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
