use sea_orm::{DbErr, SqlErr};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{entity} with {field} '{value}' not found")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("{operation} {entity} violates a constraint: {detail}")]
    ConstraintViolation {
        entity: &'static str,
        operation: &'static str,
        detail: String,
    },
    #[error("{operation} {entity} failed: {source}")]
    Database {
        entity: &'static str,
        operation: &'static str,
        #[source]
        source: DbErr,
    },
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Classifies a database error raised while running `operation` on
    /// `entity`. Uniqueness and foreign key violations are reported as
    /// [`RepositoryError::ConstraintViolation`].
    pub fn from_db(entity: &'static str, operation: &'static str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail))
            | Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                RepositoryError::ConstraintViolation {
                    entity,
                    operation,
                    detail,
                }
            }
            _ => RepositoryError::Database {
                entity,
                operation,
                source: err,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, RepositoryError::ConstraintViolation { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("can't read or create the version table of database '{database_name}': {source}")]
    Setup {
        database_name: String,
        #[source]
        source: DbErr,
    },
    #[error("migration step {index} ({name}) failed: {source}")]
    Step {
        index: usize,
        name: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("migration step {index} ({name}) failed verification: {source}")]
    Verification {
        index: usize,
        name: &'static str,
        #[source]
        source: DbErr,
    },
    #[error("migration step {index} ({name}) expected version {expected} but found {found}, is another migration running?")]
    Conflict {
        index: usize,
        name: &'static str,
        expected: i64,
        found: i64,
    },
}

impl MigrationError {
    /// Index of the step that failed, if the failure is tied to one.
    pub fn step_index(&self) -> Option<usize> {
        match self {
            MigrationError::Setup { .. } => None,
            MigrationError::Step { index, .. }
            | MigrationError::Verification { index, .. }
            | MigrationError::Conflict { index, .. } => Some(*index),
        }
    }
}
