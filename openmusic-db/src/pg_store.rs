//! PostgreSQL implementation of [`AlbumStore`].

use async_trait::async_trait;
use openmusic_core::{
    Album, AlbumId, AlbumLikes, AlbumUpdate, EntityIdType, EntityType, LikeId, LikeState,
    NewAlbum, SongId, SongSummary, StorageError, UserId,
};
use openmusic_storage::{AlbumStore, StorageResult};
use tokio_postgres::Row;

use crate::db::{is_foreign_key_violation, storage_error, DbClient};

// Delete the pair if present, otherwise insert it. Runs as one statement, so
// there is no window between the membership check and the write. A toggle
// that neither deleted nor inserted lost a race on the unique constraint.
const TOGGLE_LIKE_SQL: &str = "\
WITH removed AS (
    DELETE FROM user_album_likes
    WHERE album_id = $2::text AND user_id = $3::text
    RETURNING id
),
inserted AS (
    INSERT INTO user_album_likes (id, user_id, album_id)
    SELECT $1::text, $3::text, $2::text
    WHERE NOT EXISTS (SELECT 1 FROM removed)
    ON CONFLICT (album_id, user_id) DO NOTHING
    RETURNING id
)
SELECT (SELECT count(*) FROM removed) AS removed,
       (SELECT count(*) FROM inserted) AS inserted";

fn album_from_row(row: &Row) -> Result<Album, tokio_postgres::Error> {
    Ok(Album {
        id: AlbumId::new(row.try_get::<_, String>("id")?),
        name: row.try_get("name")?,
        year: row.try_get("year")?,
        cover_url: row.try_get("cover_url")?,
    })
}

fn song_from_row(row: &Row) -> Result<SongSummary, tokio_postgres::Error> {
    Ok(SongSummary {
        id: SongId::new(row.try_get::<_, String>("id")?),
        title: row.try_get("title")?,
        performer: row.try_get("performer")?,
    })
}

/// Album store over the Postgres pool.
#[derive(Clone)]
pub struct PgAlbumStore {
    db: DbClient,
}

impl PgAlbumStore {
    pub fn new(db: DbClient) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DbClient {
        &self.db
    }
}

#[async_trait]
impl AlbumStore for PgAlbumStore {
    async fn insert_album(&self, id: &AlbumId, album: &NewAlbum) -> StorageResult<Option<AlbumId>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                "INSERT INTO albums (id, name, year) VALUES ($1, $2, $3) RETURNING id",
                &[&id.as_str(), &album.name, &album.year],
            )
            .await
            .map_err(storage_error)?;

        row.map(|row| row.try_get::<_, String>("id").map(AlbumId::new))
            .transpose()
            .map_err(storage_error)
    }

    async fn list_albums(&self) -> StorageResult<Vec<Album>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query("SELECT id, name, year, cover_url FROM albums", &[])
            .await
            .map_err(storage_error)?;

        rows.iter()
            .map(album_from_row)
            .collect::<Result<_, _>>()
            .map_err(storage_error)
    }

    async fn get_album(&self, id: &AlbumId) -> StorageResult<Option<Album>> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT id, name, year, cover_url FROM albums WHERE id = $1",
                &[&id.as_str()],
            )
            .await
            .map_err(storage_error)?;

        row.as_ref()
            .map(album_from_row)
            .transpose()
            .map_err(storage_error)
    }

    async fn update_album(&self, id: &AlbumId, update: &AlbumUpdate) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE albums SET name = $1, year = $2 WHERE id = $3",
                &[&update.name, &update.year, &id.as_str()],
            )
            .await
            .map_err(storage_error)?;
        Ok(updated > 0)
    }

    async fn delete_album(&self, id: &AlbumId) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let deleted = conn
            .execute("DELETE FROM albums WHERE id = $1", &[&id.as_str()])
            .await
            .map_err(storage_error)?;
        Ok(deleted > 0)
    }

    async fn set_album_cover(&self, id: &AlbumId, cover_url: &str) -> StorageResult<bool> {
        let conn = self.db.get_conn().await?;
        let updated = conn
            .execute(
                "UPDATE albums SET cover_url = $1 WHERE id = $2",
                &[&cover_url, &id.as_str()],
            )
            .await
            .map_err(storage_error)?;
        Ok(updated > 0)
    }

    async fn list_album_songs(&self, id: &AlbumId) -> StorageResult<Vec<SongSummary>> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                "SELECT id, title, performer FROM songs WHERE album_id = $1",
                &[&id.as_str()],
            )
            .await
            .map_err(storage_error)?;

        rows.iter()
            .map(song_from_row)
            .collect::<Result<_, _>>()
            .map_err(storage_error)
    }

    async fn toggle_like(
        &self,
        like_id: &LikeId,
        album_id: &AlbumId,
        user_id: &UserId,
    ) -> StorageResult<LikeState> {
        let conn = self.db.get_conn().await?;
        let row = conn
            .query_one(
                TOGGLE_LIKE_SQL,
                &[&like_id.as_str(), &album_id.as_str(), &user_id.as_str()],
            )
            .await
            .map_err(|err| {
                // Inserting a like for a missing album trips the album FK.
                if is_foreign_key_violation(&err) {
                    StorageError::NotFound {
                        entity_type: EntityType::Album,
                        id: album_id.to_string(),
                    }
                } else {
                    storage_error(err)
                }
            })?;

        let removed: i64 = row.try_get("removed").map_err(storage_error)?;
        let inserted: i64 = row.try_get("inserted").map_err(storage_error)?;

        match (removed, inserted) {
            (0, 1) => Ok(LikeState::Liked),
            (1, 0) => Ok(LikeState::NotLiked),
            _ => {
                tracing::warn!(
                    album_id = %album_id,
                    user_id = %user_id,
                    removed,
                    inserted,
                    "like toggle raced a concurrent toggle"
                );
                Err(StorageError::ToggleConflict {
                    album_id: album_id.to_string(),
                    user_id: user_id.to_string(),
                })
            }
        }
    }

    async fn list_album_likes(&self, id: &AlbumId) -> StorageResult<AlbumLikes> {
        let conn = self.db.get_conn().await?;
        let rows = conn
            .query(
                "SELECT user_id FROM user_album_likes WHERE album_id = $1",
                &[&id.as_str()],
            )
            .await
            .map_err(storage_error)?;

        rows.iter()
            .map(|row| row.try_get::<_, String>("user_id").map(UserId::new))
            .collect::<Result<_, _>>()
            .map_err(storage_error)
    }

    async fn ping(&self) -> StorageResult<()> {
        self.db.health_check().await
    }
}
