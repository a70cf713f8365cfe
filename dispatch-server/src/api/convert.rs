//! Engine errors to HTTP errors

use shared::command::CommandError;
use shared::error::{AppError, ErrorCode};

use crate::orders::{ManagerError, OrderError};

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::OrderNotFound(id)
            | ManagerError::Domain(OrderError::OrderNotFound(id)) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
                    .with_detail("order_id", id)
            }
            ManagerError::PartnerNotFound(id)
            | ManagerError::Domain(OrderError::PartnerNotFound(id)) => AppError::with_message(
                ErrorCode::PartnerNotFound,
                format!("Partner {} not found", id),
            )
            .with_detail("partner_id", id),
            other => AppError::from(CommandError::from(other)),
        }
    }
}
