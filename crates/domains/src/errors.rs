//! # DomainError
//!
//! Centralized error type for the MovieSpace domain.
//! Adapters map their failures into these variants; the API layer maps
//! each variant to exactly one HTTP status.

use thiserror::Error;

/// The primary error type for all domain and service operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g. Movie, List, Comment)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected by a domain rule (e.g. rating out of range)
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or wrong credentials
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (e.g. banned, not the owner, not admin)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation (e.g. duplicate favorite or username)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g. DB down, token signing failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl ToString) -> Self {
        Self::Internal(msg.to_string())
    }
}

/// A specialized Result type for MovieSpace logic.
pub type Result<T> = std::result::Result<T, DomainError>;
