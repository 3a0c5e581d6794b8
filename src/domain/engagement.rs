//! Vote and comment invariants.
//!
//! Both value types validate before any side effect occurs; a handler
//! holding a `VoteValue` or `CommentBody` can hand it to the store
//! without re-checking.

use crate::domain::error::DomainError;

pub const VOTE_MIN: i64 = 1;
pub const VOTE_MAX: i64 = 5;

pub const COMMENT_MAX_CHARS: usize = 500;

/// Author recorded when the submitter leaves the field blank.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// A rating in `[1, 5]`.
///
/// There is deliberately no uniqueness tracking per voter: repeat votes
/// from the same source are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteValue(i64);

impl VoteValue {
    pub fn new(raw: i64) -> Result<Self, DomainError> {
        if !(VOTE_MIN..=VOTE_MAX).contains(&raw) {
            return Err(DomainError::validation(format!(
                "vote value must be between {VOTE_MIN} and {VOTE_MAX}, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

/// Trimmed comment text, 1 to 500 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentBody(String);

impl CommentBody {
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("comment must not be empty"));
        }
        if trimmed.chars().count() > COMMENT_MAX_CHARS {
            return Err(DomainError::validation(format!(
                "comment is too long (maximum {COMMENT_MAX_CHARS} characters)"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Normalize a submitted author name, falling back to [`DEFAULT_AUTHOR`].
pub fn author_or_default(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_AUTHOR.to_string(),
    }
}
