//! # bookhaven-store: Record Store for BookHaven
//!
//! This crate provides persistence for BookHaven: an in-memory set of
//! typed tables with a uniform query surface, written out as a single
//! JSON snapshot through a pluggable key-value backend.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BookHaven Data Flow                              │
//! │                                                                         │
//! │  Domain API call (add_to_cart, create_order, ...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  bookhaven-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  RecordStore  │    │   Criteria    │    │   Backends   │  │   │
//! │  │   │  (store.rs)   │    │ (criteria.rs) │    │ (snapshot.rs)│  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ 8 tables      │◄───│ field/op/val  │    │ FileBackend  │  │   │
//! │  │   │ id sequences  │    │ filter tree   │    │ MemoryBackend│  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────▲───────┘  │   │
//! │  │           │          full snapshot per mutation    │          │   │
//! │  │           └────────────────────────────────────────┘          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  {data_dir}/bookhaven_db.json   +   {data_dir}/bookhaven_session.json  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - the `RecordStore` and its SELECT/INSERT/UPDATE/DELETE surface
//! - [`criteria`] - serializable query filters
//! - [`table`] - the table set and the `Record` trait
//! - [`snapshot`] - the `SnapshotBackend` port and its two backings
//! - [`session`] - session identity persistence
//! - [`error`] - store error types
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use bookhaven_core::types::Category;
//! use bookhaven_store::{Criteria, MemoryBackend, RecordStore};
//!
//! let store = RecordStore::open(Arc::new(MemoryBackend::new()));
//!
//! let fiction = store
//!     .insert(Category { id: String::new(), name: "Fiction".to_string() })
//!     .unwrap();
//! assert_eq!(fiction.id, "cat-1000");
//!
//! let found: Vec<Category> = store.select(&Criteria::eq("name", "Fiction")).unwrap();
//! assert_eq!(found.len(), 1);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod criteria;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use criteria::{Criteria, Op};
pub use error::{StoreError, StoreResult};
pub use session::SessionStore;
pub use snapshot::{BackendError, FileBackend, MemoryBackend, SnapshotBackend, SESSION_KEY, STORE_KEY};
pub use store::{RecordStore, Row};
pub use table::{Record, Table};
