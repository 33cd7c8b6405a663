//! # bookhaven-api: Domain APIs for BookHaven
//!
//! The in-process API surface of the BookHaven storefront engine:
//! catalog, cart, checkout, rentals, users/sessions, and the mock
//! payment/email services those flows call.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        BookHaven Call Flow                              │
//! │                                                                         │
//! │  Storefront UI (TypeScript, out of scope)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  bookhaven-api (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   Storefront ──┬── BooksApi     catalog + admin CUD            │   │
//! │  │                ├── CartApi      merge adds, totals             │   │
//! │  │                ├── OrdersApi    checkout, status machine       │   │
//! │  │                ├── RentalsApi   deposits, idempotent returns   │   │
//! │  │                └── UsersApi     register/login/session         │   │
//! │  │                                                                 │   │
//! │  │   MockPaymentGateway + MockEmailService (checkout effects)     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │ reads/writes                                                    │
//! │       ▼                                                                 │
//! │  bookhaven-store (RecordStore + snapshot persistence)                  │
//! │       │ pure math                                                       │
//! │       ▼                                                                 │
//! │  bookhaven-core (Money, policy, validation)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use bookhaven_api::Storefront;
//!
//! # async fn demo() -> Result<(), bookhaven_api::ApiError> {
//! let shop = Storefront::in_memory();
//!
//! let user = shop
//!     .users()
//!     .register("John Doe", "john@example.com", "hunter22", "hunter22")
//!     .await?;
//!
//! let cart = shop.cart().items(&user.id).await?;
//! assert!(cart.is_empty());
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod books;
pub mod cart;
pub mod config;
pub mod error;
pub mod orders;
pub mod rentals;
pub mod services;
pub mod storefront;
pub mod users;

// =============================================================================
// Re-exports
// =============================================================================

pub use books::{BookPatch, BooksApi, NewBook};
pub use cart::CartApi;
pub use config::{AppConfig, Latency};
pub use error::{ApiError, ErrorCode};
pub use orders::{OrderConfirmation, OrdersApi};
pub use rentals::RentalsApi;
pub use services::{MockEmailService, MockPaymentGateway, PaymentAuthorization, ServiceError};
pub use storefront::Storefront;
pub use users::{ProfilePatch, UsersApi};
