//! # bookhaven-core: Pure Business Logic for BookHaven
//!
//! This crate is the **heart** of BookHaven. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BookHaven Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront UI (TypeScript)                      │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Orders / Rentals          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ in-process calls                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bookhaven-api                                │   │
//! │  │    BooksApi, CartApi, OrdersApi, RentalsApi, UsersApi          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bookhaven-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   policy  │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │  deposits │  │   rules   │  │   │
//! │  │   │   Order   │  │ proration │  │ late fees │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  bookhaven-store (Record Store)                 │   │
//! │  │          in-memory tables + persisted JSON snapshot             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Book, Order, Rental, CartItem, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`cart`] - Cart pricing math
//! - [`policy`] - Rental deposit / late-fee policy
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Storage, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bookhaven_core::money::Money;
//!
//! // Create money from cents (never from floats!)
//! let weekly_rate = Money::from_cents(599); // $5.99/week
//!
//! // Prorate a 14-day rental
//! let rental_price = weekly_rate.prorated_weekly(14);
//! assert_eq!(rental_price.cents(), 1198);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod policy;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bookhaven_core::Money` instead of
// `use bookhaven_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use policy::{RentalPolicy, ReturnAssessment};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Number of days in one rental billing week.
///
/// Rental prices are stored per week; a rental of `d` days is billed at
/// `weekly_rate × d / 7`, rounded to the nearest cent.
pub const RENTAL_WEEK_DAYS: u32 = 7;

/// Rental duration assumed when a cart line is flagged as a rental but
/// carries no explicit duration.
pub const DEFAULT_RENTAL_DAYS: u32 = 7;

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line in a cart.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum rental duration accepted at checkout, in days.
pub const MAX_RENTAL_DAYS: u32 = 90;
