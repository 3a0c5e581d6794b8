use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{EngagementRepo, NewComment, NewVote, RepoError};
use crate::domain::entities::CommentRecord;

use super::{SqliteRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    image_id: i64,
    author: String,
    content: String,
    comment_date: OffsetDateTime,
}

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            image_id: row.image_id,
            author: row.author,
            content: row.content,
            comment_date: row.comment_date,
        }
    }
}

#[async_trait]
impl EngagementRepo for SqliteRepositories {
    async fn insert_vote(&self, vote: NewVote) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            INSERT INTO votes (image_id, vote_value, voter_ip, vote_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(vote.image_id)
        .bind(vote.value)
        .bind(&vote.voter)
        .bind(OffsetDateTime::now_utc())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn insert_comment(&self, comment: NewComment) -> Result<i64, RepoError> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (image_id, author, content, comment_date)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(comment.image_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(OffsetDateTime::now_utc())
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_comments(&self, image_id: i64) -> Result<Vec<CommentRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, image_id, author, content, comment_date
            FROM comments
            WHERE image_id = ?
            ORDER BY comment_date DESC, id DESC
            "#,
        )
        .bind(image_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }
}
