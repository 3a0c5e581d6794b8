use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{ImagesRepo, NewImage, RepoError};
use crate::domain::entities::GalleryEntry;

use super::{SqliteRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct GalleryRow {
    id: i64,
    filename: String,
    filepath: String,
    title: Option<String>,
    description: Option<String>,
    upload_date: OffsetDateTime,
    vote_count: i64,
    average_rating: Option<f64>,
    comment_count: i64,
}

impl From<GalleryRow> for GalleryEntry {
    fn from(row: GalleryRow) -> Self {
        Self {
            id: row.id,
            filename: row.filename,
            filepath: row.filepath,
            title: row.title,
            description: row.description,
            upload_date: row.upload_date,
            vote_count: row.vote_count,
            average_rating: row.average_rating,
            comment_count: row.comment_count,
        }
    }
}

#[async_trait]
impl ImagesRepo for SqliteRepositories {
    async fn insert_image(&self, image: NewImage) -> Result<i64, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO images (filename, filepath, title, description, upload_date)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&image.filename)
        .bind(&image.filepath)
        .bind(&image.title)
        .bind(&image.description)
        .bind(OffsetDateTime::now_utc())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_gallery(&self, limit: u32, offset: u32) -> Result<Vec<GalleryEntry>, RepoError> {
        // The double LEFT JOIN fans each vote out once per comment row;
        // the counts deduplicate on id and AVG is invariant under the
        // uniform duplication, so the tallies stay correct.
        let rows = sqlx::query_as::<_, GalleryRow>(
            r#"
            SELECT
                i.id,
                i.filename,
                i.filepath,
                i.title,
                i.description,
                i.upload_date,
                COUNT(DISTINCT v.id) AS vote_count,
                ROUND(AVG(v.vote_value), 1) AS average_rating,
                COUNT(DISTINCT c.id) AS comment_count
            FROM images i
            LEFT JOIN votes v ON v.image_id = i.id
            LEFT JOIN comments c ON c.image_id = i.id
            GROUP BY i.id
            ORDER BY i.upload_date DESC, i.id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GalleryEntry::from).collect())
    }

    async fn count_images(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM images")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        SqliteRepositories::convert_count(count)
    }
}
