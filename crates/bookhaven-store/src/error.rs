//! # Store Error Types
//!
//! Error types for record store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  serde_json::Error (encode/decode)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← adds table context                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (bookhaven-api) ← serialized for the UI                      │
//! │                                                                         │
//! │  NOTE: backend save failures are NOT StoreErrors - they are logged     │
//! │  and swallowed so a persistence outage never rolls back a mutation.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Record store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record failed to serialize into a row.
    #[error("failed to encode {table} record: {source}")]
    Encode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A stored row failed to deserialize back into its record type.
    ///
    /// ## When This Occurs
    /// - Snapshot written by an incompatible version
    /// - A patch removed or retyped a required field
    #[error("failed to decode {table} record: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A record serialized to something other than a JSON object.
    #[error("{table} record did not serialize to an object")]
    InvalidRecord { table: &'static str },

    /// An update patch was not a JSON object.
    #[error("update patch for {table} must be a JSON object")]
    InvalidPatch { table: &'static str },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
