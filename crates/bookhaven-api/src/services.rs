//! # Lifecycle Service Stubs
//!
//! Mock payment and email services invoked during checkout.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    External Service Stubs                               │
//! │                                                                         │
//! │  MockPaymentGateway.authorize(total, method)                           │
//! │       │                                                                 │
//! │       ├── Ok(PaymentAuthorization { transaction_id })                  │
//! │       │      checkout proceeds, order + payment row persisted          │
//! │       │                                                                 │
//! │       └── Err(PaymentDeclined)                                         │
//! │              checkout aborts BEFORE anything is persisted              │
//! │                                                                         │
//! │  MockEmailService.send_order_confirmation(to, order)                   │
//! │       │                                                                 │
//! │       ├── Ok(())   order marked email_sent = true                      │
//! │       └── Err(..)  logged; the order stands, email_sent stays false    │
//! │                                                                         │
//! │  Every call resolves: no hangs, no retries, no timeouts, no            │
//! │  cancellation. Failure modes are deterministic and configurable        │
//! │  so tests can force either branch.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use bookhaven_core::types::{Order, PaymentMethod};
use bookhaven_core::Money;

use crate::config::Latency;

/// Nominal gateway round-trip, milliseconds.
const AUTHORIZE_MS: u64 = 700;

/// Nominal mail relay round-trip, milliseconds.
const SEND_MAIL_MS: u64 = 300;

// =============================================================================
// Service Error
// =============================================================================

/// Failure of a mock external service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The gateway refused the charge.
    #[error("payment declined: {reason}")]
    PaymentDeclined { reason: String },

    /// The mail relay refused the message.
    #[error("email dispatch failed: {0}")]
    EmailFailed(String),
}

// =============================================================================
// Payment Gateway
// =============================================================================

/// A successful payment authorization.
#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    /// Gateway transaction reference, recorded on the payment row.
    pub transaction_id: String,

    /// Authorized amount.
    pub amount: Money,

    /// Method the charge went through.
    pub method: PaymentMethod,
}

/// Mock payment gateway.
///
/// Approves everything by default. Tests (and demos) can force declines
/// with [`MockPaymentGateway::declining`] or cap approvals with
/// [`MockPaymentGateway::decline_above`].
#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
    latency: Latency,
    decline_all: bool,
    decline_above_cents: Option<i64>,
}

impl MockPaymentGateway {
    /// Creates a gateway that approves every sane charge.
    pub fn new(latency: Latency) -> Self {
        MockPaymentGateway {
            latency,
            decline_all: false,
            decline_above_cents: None,
        }
    }

    /// Makes every authorization fail.
    pub fn declining(mut self) -> Self {
        self.decline_all = true;
        self
    }

    /// Declines any authorization above `cents`.
    pub fn decline_above(mut self, cents: i64) -> Self {
        self.decline_above_cents = Some(cents);
        self
    }

    /// Authorizes a charge.
    ///
    /// Resolves after the simulated gateway round-trip with either an
    /// authorization or a deterministic decline, never a hang.
    pub async fn authorize(
        &self,
        amount: Money,
        method: PaymentMethod,
    ) -> Result<PaymentAuthorization, ServiceError> {
        self.latency.pause(AUTHORIZE_MS).await;

        if !amount.is_positive() {
            error!(amount = %amount, "payment declined: non-positive amount");
            return Err(ServiceError::PaymentDeclined {
                reason: "charge amount must be positive".to_string(),
            });
        }

        if self.decline_all {
            error!(amount = %amount, method = %method, "payment declined by gateway");
            return Err(ServiceError::PaymentDeclined {
                reason: "card declined".to_string(),
            });
        }

        if let Some(limit) = self.decline_above_cents {
            if amount.cents() > limit {
                error!(amount = %amount, limit = limit, "payment declined: over limit");
                return Err(ServiceError::PaymentDeclined {
                    reason: "amount over authorization limit".to_string(),
                });
            }
        }

        let transaction_id = Uuid::new_v4().to_string();
        info!(amount = %amount, method = %method, transaction_id = %transaction_id, "payment authorized");

        Ok(PaymentAuthorization {
            transaction_id,
            amount,
            method,
        })
    }
}

// =============================================================================
// Email Service
// =============================================================================

/// Mock email service.
///
/// "Sends" by logging. A failing mode lets tests exercise the best-effort
/// branch of checkout.
#[derive(Debug, Clone)]
pub struct MockEmailService {
    latency: Latency,
    fail_sends: bool,
}

impl MockEmailService {
    /// Creates a mailer whose sends succeed.
    pub fn new(latency: Latency) -> Self {
        MockEmailService {
            latency,
            fail_sends: false,
        }
    }

    /// Makes every send fail.
    pub fn failing(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Dispatches an order confirmation.
    pub async fn send_order_confirmation(
        &self,
        recipient: &str,
        order: &Order,
    ) -> Result<(), ServiceError> {
        self.latency.pause(SEND_MAIL_MS).await;

        if self.fail_sends {
            return Err(ServiceError::EmailFailed(
                "mail relay rejected the message".to_string(),
            ));
        }

        info!(
            to = %recipient,
            order_id = %order.id,
            total = %order.total(),
            "order confirmation email sent"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
