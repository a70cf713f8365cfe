use super::super::storage::StorageError;
use super::super::traits::OrderError;
use shared::command::{CommandError, CommandErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] OrderError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Partner not found: {0}")]
    PartnerNotFound(String),

    #[error("Unknown payment reference: {0}")]
    UnknownPaymentReference(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Map a storage failure to a command error code
fn classify_storage_error(e: &StorageError) -> CommandErrorCode {
    if let StorageError::Serialization(_) = e {
        return CommandErrorCode::InternalError;
    }

    // redb reports I/O conditions through its message text
    let err_str = e.to_string().to_lowercase();

    if err_str.contains("no space") || err_str.contains("disk full") || err_str.contains("enospc")
    {
        return CommandErrorCode::StorageFull;
    }

    if err_str.contains("corrupt") || err_str.contains("invalid database") {
        return CommandErrorCode::StorageCorrupted;
    }

    // Database/Transaction/Table/Storage/Commit errors are usually transient
    CommandErrorCode::SystemBusy
}

impl ManagerError {
    pub fn code(&self) -> CommandErrorCode {
        match self {
            ManagerError::Storage(e) => classify_storage_error(e),
            ManagerError::Domain(e) => e.code(),
            ManagerError::OrderNotFound(_) | ManagerError::PartnerNotFound(_) => {
                CommandErrorCode::NotFound
            }
            ManagerError::UnknownPaymentReference(_) => CommandErrorCode::UnknownPaymentReference,
            ManagerError::Timeout(_) => CommandErrorCode::Timeout,
            ManagerError::Internal(_) => CommandErrorCode::InternalError,
        }
    }
}

impl From<ManagerError> for CommandError {
    fn from(err: ManagerError) -> Self {
        let code = err.code();
        let message = match err {
            ManagerError::Storage(e) => {
                tracing::error!(error = %e, error_code = ?code, "Storage error occurred");
                e.to_string()
            }
            ManagerError::Domain(e) => e.to_string(),
            other => other.to_string(),
        };
        CommandError::new(code, message)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
