use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("unique constraint violated: {0}")]
    Conflict(String),

    /// A FOREIGN KEY constraint rejected the write.
    #[error("referenced row does not exist: {0}")]
    MissingReference(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl DbError {
    /// True when this is a uniqueness conflict on the given column,
    /// e.g. `conflicts_on("users.nickname")`.
    pub fn conflicts_on(&self, column: &str) -> bool {
        matches!(self, DbError::Conflict(detail) if detail.contains(column))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, detail) = &err {
            if code.code == ErrorCode::ConstraintViolation {
                let detail = detail.clone().unwrap_or_default();
                match code.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return DbError::Conflict(detail);
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        return DbError::MissingReference(detail);
                    }
                    _ => {}
                }
            }
        }
        DbError::Sqlite(err)
    }
}
