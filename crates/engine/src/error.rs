//! The module contains the error the engine can throw.
//!
//! The errors are:
//!
//! - [`NotFound`] thrown when a referenced record is absent or owned by
//!   another user.
//! - [`Validation`] thrown when input is rejected before any write.
//! - [`Conflict`] thrown when a week is operated on in the wrong state.
//!
//!  [`NotFound`]: EngineError::NotFound
//!  [`Validation`]: EngineError::Validation
//!  [`Conflict`]: EngineError::Conflict
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
