//! # Domain Types
//!
//! Core domain types used throughout BookHaven.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │     Order       │   │     Rental      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  price_cents    │   │  status         │   │  deposit_cents  │       │
//! │  │  weekly_rent    │   │  total_cents    │   │  end_date       │       │
//! │  │  category_ids   │   │  shipping       │   │  returned       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartItem     │   │   OrderStatus   │   │  PaymentMethod  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  (book, rental) │   │  Pending→…→     │   │  Card           │       │
//! │  │  quantity       │   │  Delivered      │   │  Upi            │       │
//! │  │  rental_days    │   │  Cancelled      │   │  NetBanking     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `OrderItem.title` / `OrderItem.unit_price_cents` and `Rental.book_title`
//! are frozen copies captured at checkout time. Later catalog edits must
//! never alter historical orders or rentals, so these records hold values,
//! not live references.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_RENTAL_DAYS;

// =============================================================================
// User & Role
// =============================================================================

/// Authorization role of a user account.
///
/// Administrative operations (book create/update/delete, viewing all
/// orders) require [`Role::Admin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

/// A registered account.
///
/// Emails are unique across the users table (case-insensitive).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Checks whether this account may perform administrative operations.
    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// =============================================================================
// Category
// =============================================================================

/// A catalog category. Books reference categories by id.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Book
// =============================================================================

/// A book in the catalog, purchasable and optionally rentable.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Book {
    /// Unique identifier (table-prefixed token).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Author name.
    pub author: String,

    /// Long-form description shown on the detail page.
    pub description: String,

    /// Purchase price in cents.
    pub price_cents: i64,

    /// Weekly rental rate in cents. `None` means the book cannot be rented.
    pub weekly_rent_cents: Option<i64>,

    /// Cover image reference (URL or asset path).
    pub cover_image: String,

    /// Categories this book belongs to (by category id).
    pub category_ids: Vec<String>,

    /// Whether the book is shown in the featured shelf.
    pub featured: bool,

    /// Units currently in stock.
    pub in_stock: i64,

    /// Average rating, 0.0-5.0.
    pub rating: f32,

    /// Publication date.
    #[ts(as = "String")]
    pub publish_date: NaiveDate,

    /// Soft-delete flag. Removed books stay in the table with
    /// `active = false`; historical order items keep their snapshots.
    pub active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Returns the purchase price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the weekly rental rate, if the book is rentable.
    #[inline]
    pub fn weekly_rent(&self) -> Option<Money> {
        self.weekly_rent_cents.map(Money::from_cents)
    }

    /// Checks whether the book can be rented at all.
    #[inline]
    pub fn is_rentable(&self) -> bool {
        self.weekly_rent_cents.is_some()
    }

    /// Returns the prorated price for renting this book for `days` days,
    /// or `None` when the book has no rental rate configured.
    pub fn rental_price(&self, days: u32) -> Option<Money> {
        self.weekly_rent().map(|rate| rate.prorated_weekly(days))
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in a user's persisted cart.
///
/// ## Identity
/// The logical key is `(user_id, book_id, is_rental)`: a purchase line and
/// a rental line for the same book coexist, but adding to an existing pair
/// merges quantities rather than duplicating the line.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub book_id: String,

    /// Units of this line, always ≥ 1.
    pub quantity: i64,

    /// Whether this line is a rental rather than a purchase.
    pub is_rental: bool,

    /// Rental duration in days. Required for rental lines; pricing falls
    /// back to one week when absent.
    pub rental_days: Option<u32>,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Checks whether this line matches the `(book_id, is_rental)` pair.
    #[inline]
    pub fn matches(&self, book_id: &str, is_rental: bool) -> bool {
        self.book_id == book_id && self.is_rental == is_rental
    }

    /// Rental duration in days, defaulting to one week for rental lines
    /// missing an explicit duration.
    #[inline]
    pub fn effective_rental_days(&self) -> u32 {
        self.rental_days.unwrap_or(DEFAULT_RENTAL_DAYS)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// ## State Machine
/// ```text
/// pending ──► processing ──► shipped ──► delivered
///    │             │            │
///    └─────────────┴────────────┴──────► cancelled
/// ```
/// Transitions are forward-only. `delivered` and `cancelled` are terminal;
/// nothing transitions out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order accepted but not yet picked up for fulfilment.
    Pending,
    /// Payment captured, order being prepared.
    Processing,
    /// Handed to the carrier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Abandoned before delivery.
    Cancelled,
}

impl OrderStatus {
    /// Position in the forward progression. Terminal states have no rank.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    /// Checks whether the order can still change state.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Checks whether a transition to `next` is allowed.
    ///
    /// Forward moves along pending → processing → shipped → delivered are
    /// allowed (including skips), `cancelled` is reachable from any
    /// non-terminal state, and terminal states accept nothing.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            OrderStatus::Cancelled => true,
            _ => match (self.rank(), next.rank()) {
                (Some(from), Some(to)) => to > from,
                _ => false,
            },
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a checkout is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    Card,
    /// UPI transfer.
    Upi,
    /// Direct bank transfer.
    NetBanking,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Shipping Address
// =============================================================================

/// Delivery address captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,

    /// Sum of all line totals in cents, frozen at checkout.
    pub total_cents: i64,

    pub status: OrderStatus,
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,

    /// Whether the confirmation email went out. Email dispatch is
    /// best-effort; a failed send leaves this false and the order intact.
    pub email_sent: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item in an order.
/// Uses the snapshot pattern to freeze book data at time of checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub book_id: String,

    /// Book title at time of checkout (frozen).
    pub title: String,

    /// Quantity ordered.
    pub quantity: i64,

    /// Unit price in cents at time of checkout (frozen). For rentals this
    /// is the weekly rate prorated over the rental duration.
    pub unit_price_cents: i64,

    /// Whether this line is a rental.
    pub is_rental: bool,

    /// Rental duration in days for rental lines.
    pub rental_days: Option<u32>,
}

impl OrderItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.unit_price_cents * self.quantity)
    }
}

// =============================================================================
// Rental
// =============================================================================

/// A book lending with a refundable deposit.
///
/// Mutated exactly once, at return time. Returning an already-returned
/// rental is a no-op that yields the stored record.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rental {
    pub id: String,
    pub user_id: String,
    pub book_id: String,

    /// Book title at time of rental (frozen).
    pub book_title: String,

    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    /// Due date. Returns after this date accrue a per-day late fee.
    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    pub returned: bool,

    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,

    /// Refundable hold taken at rental creation: 2 × the weekly rate.
    pub deposit_cents: i64,

    /// Amount refunded at return, set once.
    pub refund_cents: Option<i64>,

    /// Late fee deducted from the deposit, set once.
    pub late_fee_cents: Option<i64>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Rental {
    /// Returns the deposit as Money.
    #[inline]
    pub fn deposit(&self) -> Money {
        Money::from_cents(self.deposit_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// Status of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// A captured payment for an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,

    /// Gateway transaction reference.
    pub transaction_id: String,

    pub status: PaymentStatus,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_forward_transitions() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        // Skipping forward is allowed
        assert!(Pending.can_transition_to(Shipped));
        assert!(Processing.can_transition_to(Delivered));
    }

    #[test]
    fn test_order_status_no_backward_transitions() {
        use OrderStatus::*;

        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Shipped));
        assert!(!Processing.can_transition_to(Pending));
        assert!(!Processing.can_transition_to(Processing));
    }

    #[test]
    fn test_order_status_cancel_from_non_terminal_only() {
        use OrderStatus::*;

        assert!(Pending.can_transition_to(Cancelled));
        assert!(Processing.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Processing));
    }

    #[test]
    fn test_book_rental_price() {
        let book = Book {
            id: "book-1001".to_string(),
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            description: String::new(),
            price_cents: 1999,
            weekly_rent_cents: Some(399),
            cover_image: String::new(),
            category_ids: vec![],
            featured: false,
            in_stock: 5,
            rating: 4.8,
            publish_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(book.is_rentable());
        assert_eq!(book.rental_price(14).unwrap().cents(), 798);

        let not_rentable = Book {
            weekly_rent_cents: None,
            ..book
        };
        assert!(!not_rentable.is_rentable());
        assert!(not_rentable.rental_price(7).is_none());
    }

    #[test]
    fn test_cart_item_effective_days() {
        let item = CartItem {
            id: String::new(),
            user_id: "usr-1001".to_string(),
            book_id: "book-1001".to_string(),
            quantity: 1,
            is_rental: true,
            rental_days: None,
            added_at: Utc::now(),
        };
        assert_eq!(item.effective_rental_days(), 7);

        let with_days = CartItem {
            rental_days: Some(21),
            ..item
        };
        assert_eq!(with_days.effective_rental_days(), 21);
    }

    /// The snapshot layout stores enums as snake_case strings; the wire
    /// shape is part of the persistence contract.
    #[test]
    fn test_status_serialization_shape() {
        assert_eq!(
            serde_json::to_value(OrderStatus::Processing).unwrap(),
            serde_json::json!("processing")
        );
        assert_eq!(
            serde_json::to_value(PaymentMethod::NetBanking).unwrap(),
            serde_json::json!("net_banking")
        );
        assert_eq!(
            serde_json::to_value(Role::Admin).unwrap(),
            serde_json::json!("admin")
        );

        let decoded: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(decoded, OrderStatus::Cancelled);
    }

    #[test]
    fn test_order_item_line_total() {
        let item = OrderItem {
            id: "item-1001".to_string(),
            order_id: "ord-1001".to_string(),
            book_id: "book-1001".to_string(),
            title: "Dune".to_string(),
            quantity: 3,
            unit_price_cents: 1999,
            is_rental: false,
            rental_days: None,
        };
        assert_eq!(item.line_total().cents(), 5997);
    }
}
