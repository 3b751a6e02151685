//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y éstas al
//! contrato `RepositoryError` del core.

use batch_core::RepositoryError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    /// SQLITE_BUSY / "database is locked" (retryable).
    #[error("database busy: {0}")]
    Busy(String),
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    /// Fila o payload que no se pudo (de)serializar.
    #[error("row serialization: {0}")]
    Serialization(String),
    /// La regla de instancia rechazó la creación (duplicado / en curso).
    #[error(transparent)]
    Conflict(RepositoryError),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                _ if is_busy_message(info.message()) => Self::Busy(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::DeserializationError(e) => Self::Serialization(format!("deser: {e}")),
            DieselError::SerializationError(e) => Self::Serialization(format!("ser: {e}")),
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            DieselError::QueryBuilderError(e) => Self::Unknown(format!("query builder: {e}")),
            other => Self::Unknown(format!("unhandled diesel error: {other:?}")),
        }
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<PersistenceError> for RepositoryError {
    fn from(e: PersistenceError) -> Self {
        match e {
            PersistenceError::Conflict(inner) => inner,
            PersistenceError::NotFound => RepositoryError::NotFound("row".into()),
            PersistenceError::Serialization(msg) => RepositoryError::Serialization(msg),
            other => RepositoryError::Storage(other.to_string()),
        }
    }
}

pub(crate) fn is_busy_message(msg: &str) -> bool {
    let m = msg.to_lowercase();
    m.contains("database is locked") || m.contains("database is busy") || m.contains("database table is locked")
}
