//! # Storefront Handle
//!
//! The root object wiring the record store, session store, configuration
//! and service stubs together, and handing out the per-domain APIs.
//!
//! ## Design: One Handle, Many APIs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Storefront (Arc inside, cheap to clone)                                │
//! │                                                                         │
//! │  .books()    ──► BooksApi      catalog queries + admin CUD             │
//! │  .cart()     ──► CartApi       merge adds, totals                      │
//! │  .orders()   ──► OrdersApi     checkout pipeline, status machine       │
//! │  .rentals()  ──► RentalsApi    deposits, idempotent returns            │
//! │  .users()    ──► UsersApi      register/login/session                  │
//! │                                                                         │
//! │  Constructed once per process; domain APIs borrow the same store       │
//! │  instance rather than touching ambient global state.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use bookhaven_core::types::User;
use bookhaven_store::{
    FileBackend, MemoryBackend, RecordStore, SessionStore, SnapshotBackend,
};

use crate::books::BooksApi;
use crate::cart::CartApi;
use crate::config::{AppConfig, Latency};
use crate::error::ApiError;
use crate::orders::OrdersApi;
use crate::rentals::RentalsApi;
use crate::services::{MockEmailService, MockPaymentGateway};
use crate::users::UsersApi;

// =============================================================================
// Shared State
// =============================================================================

/// State shared by every domain API.
#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) store: RecordStore,
    pub(crate) sessions: SessionStore,
    pub(crate) config: AppConfig,
    pub(crate) gateway: MockPaymentGateway,
    pub(crate) mailer: MockEmailService,
}

// =============================================================================
// Storefront
// =============================================================================

/// Root handle for the storefront engine.
///
/// ## Example
/// ```rust
/// use bookhaven_api::Storefront;
///
/// let shop = Storefront::in_memory();
/// let books = shop.books();
/// ```
#[derive(Debug, Clone)]
pub struct Storefront {
    inner: Arc<Inner>,
}

impl Storefront {
    /// Opens a storefront backed by files under `config.data_dir`.
    pub fn open(config: AppConfig) -> Result<Self, ApiError> {
        let backend = FileBackend::new(&config.data_dir)
            .map_err(|e| ApiError::internal(format!("cannot open data directory: {}", e)))?;
        Ok(Self::with_backend(Arc::new(backend), config))
    }

    /// Opens a storefront over an explicit backend.
    pub fn with_backend(backend: Arc<dyn SnapshotBackend>, config: AppConfig) -> Self {
        let store = RecordStore::open(backend.clone());
        let sessions = SessionStore::new(backend);
        let gateway = MockPaymentGateway::new(config.latency);
        let mailer = MockEmailService::new(config.latency);

        Storefront {
            inner: Arc::new(Inner {
                store,
                sessions,
                config,
                gateway,
                mailer,
            }),
        }
    }

    /// Opens an ephemeral in-memory storefront with latency disabled.
    /// The standard fixture for tests.
    pub fn in_memory() -> Self {
        let config = AppConfig {
            latency: Latency::none(),
            ..AppConfig::default()
        };
        Self::with_backend(Arc::new(MemoryBackend::new()), config)
    }

    /// Like [`Storefront::in_memory`], but with explicit service stubs:
    /// the seam for forcing payment declines or email failures.
    pub fn in_memory_with_services(
        gateway: MockPaymentGateway,
        mailer: MockEmailService,
    ) -> Self {
        let config = AppConfig {
            latency: Latency::none(),
            ..AppConfig::default()
        };
        let backend: Arc<dyn SnapshotBackend> = Arc::new(MemoryBackend::new());
        let store = RecordStore::open(backend.clone());
        let sessions = SessionStore::new(backend);

        Storefront {
            inner: Arc::new(Inner {
                store,
                sessions,
                config,
                gateway,
                mailer,
            }),
        }
    }

    /// Catalog API.
    pub fn books(&self) -> BooksApi {
        BooksApi::new(self.inner.clone())
    }

    /// Cart API.
    pub fn cart(&self) -> CartApi {
        CartApi::new(self.inner.clone())
    }

    /// Orders / checkout API.
    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.inner.clone())
    }

    /// Rentals API.
    pub fn rentals(&self) -> RentalsApi {
        RentalsApi::new(self.inner.clone())
    }

    /// Users / session API.
    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.inner.clone())
    }

    /// The active configuration.
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }
}

// =============================================================================
// Authorization Helper
// =============================================================================

/// Gates an administrative operation on the actor's role.
pub(crate) fn ensure_admin(actor: &User, action: &str) -> Result<(), ApiError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden(action))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
