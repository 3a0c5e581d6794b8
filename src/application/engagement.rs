//! Votes and comments against individual images.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{EngagementRepo, NewComment, NewVote, RepoError};
use crate::domain::engagement::{CommentBody, VoteValue, author_or_default};
use crate::domain::entities::CommentRecord;
use crate::domain::error::DomainError;

const SOURCE: &str = "cornice::engagement";

#[derive(Debug, Error)]
pub enum EngagementError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("image does not exist")]
    UnknownImage,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for EngagementError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::MissingParent => Self::UnknownImage,
            other => Self::Repo(other),
        }
    }
}

pub struct EngagementService {
    repo: Arc<dyn EngagementRepo>,
}

impl EngagementService {
    pub fn new(repo: Arc<dyn EngagementRepo>) -> Self {
        Self { repo }
    }

    /// Record a vote. The value is validated before the store is
    /// touched; an out-of-range vote leaves no row behind.
    pub async fn add_vote(
        &self,
        image_id: i64,
        value: i64,
        voter: Option<String>,
    ) -> Result<(), EngagementError> {
        let value = VoteValue::new(value)?;
        self.repo
            .insert_vote(NewVote {
                image_id,
                value: value.get(),
                voter,
            })
            .await?;
        info!(target = SOURCE, image_id, value = value.get(), "vote recorded");
        Ok(())
    }

    /// Record a comment. Blank authors become "Anonymous"; the body is
    /// trimmed and length-checked before the store is touched.
    pub async fn add_comment(
        &self,
        image_id: i64,
        author: Option<&str>,
        content: &str,
    ) -> Result<i64, EngagementError> {
        let body = CommentBody::new(content)?;
        let comment_id = self
            .repo
            .insert_comment(NewComment {
                image_id,
                author: author_or_default(author),
                content: body.into_inner(),
            })
            .await?;
        info!(target = SOURCE, image_id, comment_id, "comment recorded");
        Ok(comment_id)
    }

    /// Comments for one image, newest first. An unknown image yields an
    /// empty list.
    pub async fn comments(&self, image_id: i64) -> Result<Vec<CommentRecord>, EngagementError> {
        Ok(self.repo.list_comments(image_id).await?)
    }
}
