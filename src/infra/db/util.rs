use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// Collapse driver errors into the repository taxonomy. Constraint
/// violations keep their identity so callers can react (duplicate
/// filename, vote against a deleted image); everything else is opaque.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db_err) => match db_err.kind() {
            ErrorKind::UniqueViolation => RepoError::Duplicate {
                constraint: db_err
                    .constraint()
                    .unwrap_or("unique constraint")
                    .to_owned(),
            },
            ErrorKind::ForeignKeyViolation => RepoError::MissingParent,
            _ => RepoError::from_persistence(db_err),
        },
        other => RepoError::from_persistence(other),
    }
}
