//! # Rental Policy
//!
//! Deposit and late-fee rules for book rentals.
//!
//! ## Policy Summary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Rental Money Flow                                 │
//! │                                                                         │
//! │  Rent book ($5.00/week)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Deposit held: $10.00 (2 × weekly rate, independent of duration)       │
//! │       │                                                                 │
//! │       ├── Returned on or before due date                               │
//! │       │        refund = $10.00, late fee = $0.00                       │
//! │       │                                                                 │
//! │       └── Returned N whole days late                                   │
//! │                late fee = N × per-day rate                             │
//! │                refund   = max(0, deposit − late fee)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lateness Policy
//! Lateness is measured in whole UTC calendar days between the due date
//! and the return date. A return at 23:59 UTC on the due date is on time;
//! a return at 00:01 UTC the next day is one day late.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Default late fee charged per day past the due date, in cents.
pub const DEFAULT_LATE_FEE_CENTS_PER_DAY: i64 = 100;

/// Deposit held at rental creation, as a multiple of the weekly rate.
pub const DEPOSIT_WEEKLY_MULTIPLIER: i64 = 2;

// =============================================================================
// Rental Policy
// =============================================================================

/// Configurable rental money policy.
///
/// ## Example
/// ```rust
/// use bookhaven_core::policy::RentalPolicy;
/// use bookhaven_core::money::Money;
///
/// let policy = RentalPolicy::default().late_fee_cents_per_day(150);
/// let deposit = policy.deposit_for(Money::from_cents(500));
/// assert_eq!(deposit.cents(), 1000);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RentalPolicy {
    /// Deposit as a multiple of the book's weekly rate.
    pub deposit_multiplier: i64,

    /// Flat fee per day late, in cents.
    pub late_fee_cents_per_day: i64,
}

impl Default for RentalPolicy {
    fn default() -> Self {
        RentalPolicy {
            deposit_multiplier: DEPOSIT_WEEKLY_MULTIPLIER,
            late_fee_cents_per_day: DEFAULT_LATE_FEE_CENTS_PER_DAY,
        }
    }
}

impl RentalPolicy {
    /// Sets the per-day late fee.
    pub fn late_fee_cents_per_day(mut self, cents: i64) -> Self {
        self.late_fee_cents_per_day = cents;
        self
    }

    /// Computes the deposit held for a book with the given weekly rate.
    ///
    /// The deposit is a flat multiple of the per-week rate and does not
    /// depend on the requested rental duration.
    #[inline]
    pub fn deposit_for(&self, weekly_rate: Money) -> Money {
        weekly_rate * self.deposit_multiplier
    }

    /// Number of whole UTC calendar days `returned_on` falls past `due`.
    ///
    /// Never negative; early returns count as zero days late.
    pub fn days_late(due: DateTime<Utc>, returned_on: DateTime<Utc>) -> i64 {
        (returned_on.date_naive() - due.date_naive()).num_days().max(0)
    }

    /// Assesses a rental return: late fee and refund.
    ///
    /// ## Invariant
    /// The refund is clamped at zero: a long-overdue return forfeits the
    /// deposit but never produces a balance owed through this path.
    pub fn assess_return(
        &self,
        deposit: Money,
        due: DateTime<Utc>,
        returned_on: DateTime<Utc>,
    ) -> ReturnAssessment {
        let days_late = Self::days_late(due, returned_on);
        let late_fee = Money::from_cents(self.late_fee_cents_per_day) * days_late;
        let refund = (deposit - late_fee).clamp_non_negative();

        ReturnAssessment {
            days_late,
            late_fee,
            refund,
        }
    }
}

/// Outcome of assessing a rental return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnAssessment {
    /// Whole calendar days past the due date (zero when on time).
    pub days_late: i64,

    /// Fee deducted from the deposit.
    pub late_fee: Money,

    /// Amount returned to the renter, never negative.
    pub refund: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_deposit_is_double_weekly_rate() {
        let policy = RentalPolicy::default();
        // $5.00/week → $10.00 deposit regardless of requested days
        assert_eq!(policy.deposit_for(Money::from_cents(500)).cents(), 1000);
        assert_eq!(policy.deposit_for(Money::from_cents(349)).cents(), 698);
    }

    #[test]
    fn test_on_time_return_full_refund() {
        let policy = RentalPolicy::default();
        let due = utc(2026, 3, 10, 12);

        // Returned two days early
        let early = policy.assess_return(Money::from_cents(1000), due, utc(2026, 3, 8, 9));
        assert_eq!(early.days_late, 0);
        assert_eq!(early.late_fee, Money::zero());
        assert_eq!(early.refund.cents(), 1000);

        // Returned late in the evening of the due date: still on time
        let same_day = policy.assess_return(Money::from_cents(1000), due, utc(2026, 3, 10, 23));
        assert_eq!(same_day.days_late, 0);
        assert_eq!(same_day.refund.cents(), 1000);
    }

    #[test]
    fn test_late_return_per_day_fee() {
        let policy = RentalPolicy::default(); // 100 cents/day
        let due = utc(2026, 3, 10, 12);

        let assessment = policy.assess_return(Money::from_cents(1000), due, utc(2026, 3, 13, 8));
        assert_eq!(assessment.days_late, 3);
        assert_eq!(assessment.late_fee.cents(), 300);
        assert_eq!(assessment.refund.cents(), 700);
    }

    #[test]
    fn test_refund_never_negative() {
        let policy = RentalPolicy::default();
        let due = utc(2026, 3, 10, 12);

        // 15 days late at $1.00/day overwhelms a $10.00 deposit
        let assessment = policy.assess_return(Money::from_cents(1000), due, utc(2026, 3, 25, 12));
        assert_eq!(assessment.days_late, 15);
        assert_eq!(assessment.late_fee.cents(), 1500);
        assert_eq!(assessment.refund.cents(), 0);
    }

    #[test]
    fn test_days_late_uses_calendar_days() {
        // Due 18:00, returned 09:00 next day: a whole calendar day late
        // even though fewer than 24 hours elapsed.
        let due = utc(2026, 3, 10, 18);
        assert_eq!(RentalPolicy::days_late(due, utc(2026, 3, 11, 9)), 1);
        assert_eq!(RentalPolicy::days_late(due, utc(2026, 3, 10, 23)), 0);
    }

    #[test]
    fn test_configurable_late_fee() {
        let policy = RentalPolicy::default().late_fee_cents_per_day(250);
        let due = utc(2026, 3, 10, 12);

        let assessment = policy.assess_return(Money::from_cents(1000), due, utc(2026, 3, 12, 12));
        assert_eq!(assessment.late_fee.cents(), 500);
        assert_eq!(assessment.refund.cents(), 500);
    }
}
