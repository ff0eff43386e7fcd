//! Relational schema.
//!
//! Statements are idempotent so [`crate::DbClient::migrate`] can run on every
//! start. The `(album_id, user_id)` uniqueness constraint is what makes the
//! like toggle safe under concurrency; do not drop it.

/// DDL for the tables the album store reads and writes.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS albums (
    id        TEXT PRIMARY KEY,
    name      TEXT NOT NULL,
    year      INTEGER NOT NULL,
    cover_url TEXT
);

CREATE TABLE IF NOT EXISTS songs (
    id        TEXT PRIMARY KEY,
    title     TEXT NOT NULL,
    performer TEXT NOT NULL,
    album_id  TEXT REFERENCES albums (id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS songs_album_id_idx ON songs (album_id);

CREATE TABLE IF NOT EXISTS user_album_likes (
    id       TEXT PRIMARY KEY,
    user_id  TEXT NOT NULL,
    album_id TEXT NOT NULL REFERENCES albums (id) ON DELETE CASCADE,
    CONSTRAINT user_album_likes_album_user_key UNIQUE (album_id, user_id)
);
"#;

/// Table names in dependency order, children first.
pub const TABLES: [&str; 3] = ["user_album_likes", "songs", "albums"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let creates = SCHEMA_SQL.matches("CREATE ").count();
        let guarded = SCHEMA_SQL.matches("IF NOT EXISTS").count();
        assert_eq!(creates, guarded);
    }

    #[test]
    fn test_schema_declares_like_uniqueness() {
        assert!(SCHEMA_SQL.contains("UNIQUE (album_id, user_id)"));
        for table in TABLES {
            assert!(SCHEMA_SQL.contains(&format!("CREATE TABLE IF NOT EXISTS {table} (")));
        }
    }
}
