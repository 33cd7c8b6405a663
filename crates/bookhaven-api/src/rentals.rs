//! # Rentals API
//!
//! Rental creation and the idempotent return flow.
//!
//! ## Return Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     return_rental(id)                                   │
//! │                                                                         │
//! │  Rental exists? ── no ──► NOT_FOUND                                    │
//! │       │                                                                 │
//! │  Already returned? ── yes ──► stored record, unchanged (no-op)         │
//! │       │                                                                 │
//! │  Assess lateness (whole UTC calendar days past due date)               │
//! │       │                                                                 │
//! │  late fee = days_late × per-day rate                                   │
//! │  refund   = max(0, deposit − late fee)                                 │
//! │       │                                                                 │
//! │  Mark returned, stamp return date, store refund + late fee - ONCE.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info};

use bookhaven_core::types::{Book, Rental};
use bookhaven_core::validation::validate_rental_days;
use bookhaven_core::CoreError;
use bookhaven_store::Criteria;

use crate::error::ApiError;
use crate::storefront::Inner;

/// Nominal rental list read, milliseconds.
const LIST_MS: u64 = 500;
/// Nominal rental creation, milliseconds.
const CREATE_MS: u64 = 800;
/// Nominal rental return, milliseconds.
const RETURN_MS: u64 = 600;

// =============================================================================
// Rentals API
// =============================================================================

/// Rental operations.
#[derive(Debug, Clone)]
pub struct RentalsApi {
    inner: Arc<Inner>,
}

impl RentalsApi {
    pub(crate) fn new(inner: Arc<Inner>) -> Self {
        RentalsApi { inner }
    }

    /// Lists a user's rentals.
    pub async fn for_user(&self, user_id: &str) -> Result<Vec<Rental>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;
        Ok(self
            .inner
            .store
            .select(&Criteria::eq("user_id", user_id))?)
    }

    /// Opens a rental directly (outside a cart checkout).
    ///
    /// Fails when the book has no weekly rate. The deposit is a flat
    /// multiple of the weekly rate, independent of `days`.
    pub async fn create(
        &self,
        user_id: &str,
        book_id: &str,
        days: u32,
    ) -> Result<Rental, ApiError> {
        self.inner.config.latency.pause(CREATE_MS).await;
        validate_rental_days(days)?;

        let mut books: Vec<Book> = self
            .inner
            .store
            .select(&Criteria::eq("id", book_id).and(Criteria::eq("active", true)))?;
        let book = books
            .pop()
            .ok_or_else(|| CoreError::BookNotFound(book_id.to_string()))?;
        let weekly = book
            .weekly_rent()
            .ok_or_else(|| CoreError::BookNotRentable(book_id.to_string()))?;

        let now = Utc::now();
        let rental = self.inner.store.insert(Rental {
            id: String::new(),
            user_id: user_id.to_string(),
            book_id: book.id.clone(),
            book_title: book.title.clone(),
            start_date: now,
            end_date: now + Duration::days(days as i64),
            returned: false,
            return_date: None,
            deposit_cents: self.inner.config.rental_policy.deposit_for(weekly).cents(),
            refund_cents: None,
            late_fee_cents: None,
            created_at: now,
            updated_at: now,
        })?;

        info!(
            rental_id = %rental.id,
            user_id = %user_id,
            book_id = %book.id,
            days,
            deposit = %rental.deposit(),
            "rental created"
        );
        Ok(rental)
    }

    /// Closes a rental and settles the deposit.
    ///
    /// Idempotent: a rental already returned comes back unchanged: no
    /// second refund, no second fee.
    pub async fn return_rental(&self, rental_id: &str) -> Result<Rental, ApiError> {
        self.inner.config.latency.pause(RETURN_MS).await;

        let mut matches: Vec<Rental> =
            self.inner.store.select(&Criteria::eq("id", rental_id))?;
        let rental = matches
            .pop()
            .ok_or_else(|| CoreError::RentalNotFound(rental_id.to_string()))?;

        if rental.returned {
            debug!(rental_id = %rental_id, "rental already returned, no-op");
            return Ok(rental);
        }

        let now = Utc::now();
        let assessment = self.inner.config.rental_policy.assess_return(
            rental.deposit(),
            rental.end_date,
            now,
        );

        let mut updated: Vec<Rental> = self.inner.store.update(
            json!({
                "returned": true,
                "return_date": now.to_rfc3339(),
                "refund_cents": assessment.refund.cents(),
                "late_fee_cents": assessment.late_fee.cents(),
            }),
            &Criteria::eq("id", rental_id),
        )?;

        info!(
            rental_id = %rental_id,
            days_late = assessment.days_late,
            late_fee = %assessment.late_fee,
            refund = %assessment.refund,
            "rental returned"
        );

        updated
            .pop()
            .ok_or_else(|| CoreError::RentalNotFound(rental_id.to_string()).into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
