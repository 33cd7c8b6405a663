//! # API Error Type
//!
//! Unified error type for the domain API surface.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in BookHaven                              │
//! │                                                                         │
//! │  Storefront UI                  Rust Backend                            │
//! │  ─────────────                  ────────────                            │
//! │                                                                         │
//! │  await orders.checkout(...)                                             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Domain API method                                               │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │  Store Error? ──── StoreError::Decode(...) ────────┐            │  │
//! │  │         │                                          ▼            │  │
//! │  │  Domain Error? ─── CoreError::BookNotFound ───── ApiError ─────►│  │
//! │  │         │                                          ▲            │  │
//! │  │  Payment decline? ─ ServiceError::PaymentDeclined ─┘            │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  UI surfaces e.message as a transient notification and can branch      │
//! │  on e.code ("NOT_FOUND", "PAYMENT_DECLINED", ...).                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use bookhaven_core::{CoreError, ValidationError};
use bookhaven_store::StoreError;

use crate::services::ServiceError;

/// API error returned from domain API methods.
///
/// ## Serialization
/// This is what the UI receives when an operation fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Book not found: book-1003"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced entity does not exist.
    NotFound,

    /// Input validation failed; nothing was applied.
    ValidationError,

    /// Record store operation failed.
    StorageError,

    /// Business rule rejected the operation (bad status transition,
    /// un-rentable book, ...).
    BusinessLogic,

    /// Cart operation failed.
    CartError,

    /// The payment gateway declined the charge; no order was created.
    PaymentDeclined,

    /// Operation requires a role the acting user does not have.
    Forbidden,

    /// Login/session failure.
    AuthError,

    /// Unexpected internal failure.
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::AuthError, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(action: &str) -> Self {
        ApiError::new(ErrorCode::Forbidden, format!("Not authorized to {}", action))
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts core domain errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::BookNotFound(id) => ApiError::not_found("Book", &id),
            CoreError::OrderNotFound(id) => ApiError::not_found("Order", &id),
            CoreError::RentalNotFound(id) => ApiError::not_found("Rental", &id),
            CoreError::UserNotFound(id) => ApiError::not_found("User", &id),
            CoreError::BookNotRentable(id) => ApiError::new(
                ErrorCode::BusinessLogic,
                format!("Book {} is not available for rent", id),
            ),
            CoreError::InvalidStatusTransition { order_id, from, to } => ApiError::new(
                ErrorCode::BusinessLogic,
                format!("Order {} is {}, cannot move to {}", order_id, from, to),
            ),
            CoreError::CartTooLarge { max } => ApiError::new(
                ErrorCode::CartError,
                format!("Cart cannot have more than {} items", max),
            ),
            CoreError::QuantityTooLarge { requested, max } => ApiError::new(
                ErrorCode::ValidationError,
                format!("Quantity {} exceeds maximum allowed ({})", requested, max),
            ),
            CoreError::Forbidden { action } => ApiError::forbidden(&action),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts bare validation errors to API errors.
impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts store errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Log the precise cause but return a generic message
        tracing::error!("record store failure: {}", err);
        ApiError::new(ErrorCode::StorageError, "Storage operation failed")
    }
}

/// Converts service errors to API errors.
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::PaymentDeclined { reason } => ApiError::new(
                ErrorCode::PaymentDeclined,
                format!("Payment declined: {}", reason),
            ),
            ServiceError::EmailFailed(reason) => {
                ApiError::internal(format!("Email dispatch failed: {}", reason))
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================
