use thiserror::Error;

use crate::game::bank::BankError;
use crate::game::credit::CreditError;
use crate::users::registry::IdentityError;

/// Centralized error type for the crate
///
/// Module-level errors are converted into this enum so callers that sit on
/// top of several subsystems (room controllers, API handlers) can hold one
/// error type. Uses `thiserror` for conversion and display formatting.
#[derive(Error, Debug)]
pub enum AppError {
    /// Identity registry errors
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Credit ledger errors
    #[error("Credit error: {0}")]
    Credit(#[from] CreditError),

    /// Bank operation errors
    #[error("Bank error: {0}")]
    Bank(#[from] BankError),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_module_errors() {
        let err: AppError = IdentityError::EmptyEmail.into();
        assert!(matches!(err, AppError::Identity(_)));

        let err: AppError = CreditError::NoActiveCredit.into();
        assert!(matches!(err, AppError::Credit(_)));
        assert_eq!(err.to_string(), "Credit error: no active credit");

        let err: AppError = BankError::SelfTransfer.into();
        assert!(matches!(err, AppError::Bank(_)));
    }
}
