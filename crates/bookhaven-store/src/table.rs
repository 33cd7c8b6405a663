//! # Tables
//!
//! The fixed set of tables held by the record store, and the [`Record`]
//! trait binding domain types to them.
//!
//! ## Per-Table Metadata
//! ```text
//! ┌──────────────────┬─────────┬───────────────┬─────────────┐
//! │ table            │ prefix  │ created field │ updated_at  │
//! ├──────────────────┼─────────┼───────────────┼─────────────┤
//! │ users            │ usr     │ created_at    │ no          │
//! │ books            │ book    │ created_at    │ yes         │
//! │ book_categories  │ cat     │ (none)        │ no          │
//! │ orders           │ ord     │ created_at    │ yes         │
//! │ order_items      │ item    │ (none)        │ no          │
//! │ rentals          │ rnt     │ created_at    │ yes         │
//! │ cart_items       │ cart    │ added_at      │ no          │
//! │ payments         │ pay     │ created_at    │ no          │
//! └──────────────────┴─────────┴───────────────┴─────────────┘
//! ```

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use bookhaven_core::types::{
    Book, CartItem, Category, Order, OrderItem, Payment, Rental, User,
};

// =============================================================================
// Table
// =============================================================================

/// One of the eight snapshot tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Books,
    BookCategories,
    Orders,
    OrderItems,
    Rentals,
    CartItems,
    Payments,
}

impl Table {
    /// Every table, in snapshot serialization order.
    pub const ALL: [Table; 8] = [
        Table::Users,
        Table::Books,
        Table::BookCategories,
        Table::Orders,
        Table::OrderItems,
        Table::Rentals,
        Table::CartItems,
        Table::Payments,
    ];

    /// Snapshot key for this table's array.
    pub const fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Books => "books",
            Table::BookCategories => "book_categories",
            Table::Orders => "orders",
            Table::OrderItems => "order_items",
            Table::Rentals => "rentals",
            Table::CartItems => "cart_items",
            Table::Payments => "payments",
        }
    }

    /// Prefix used for generated record identities (`{prefix}-{seq}`).
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            Table::Users => "usr",
            Table::Books => "book",
            Table::BookCategories => "cat",
            Table::Orders => "ord",
            Table::OrderItems => "item",
            Table::Rentals => "rnt",
            Table::CartItems => "cart",
            Table::Payments => "pay",
        }
    }

    /// Field the store stamps with a creation timestamp on insert, when
    /// the table tracks one.
    pub const fn created_field(&self) -> Option<&'static str> {
        match self {
            Table::CartItems => Some("added_at"),
            Table::BookCategories | Table::OrderItems => None,
            _ => Some("created_at"),
        }
    }

    /// Whether the store refreshes an `updated_at` field on update.
    pub const fn tracks_updated_at(&self) -> bool {
        matches!(self, Table::Books | Table::Orders | Table::Rentals)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Record Trait
// =============================================================================

/// Binds a domain type to the table that stores it.
///
/// Implemented here (not in bookhaven-core) so the core crate stays free
/// of storage concerns.
pub trait Record: Serialize + DeserializeOwned {
    /// The table holding records of this type.
    const TABLE: Table;
}

impl Record for User {
    const TABLE: Table = Table::Users;
}

impl Record for Book {
    const TABLE: Table = Table::Books;
}

impl Record for Category {
    const TABLE: Table = Table::BookCategories;
}

impl Record for Order {
    const TABLE: Table = Table::Orders;
}

impl Record for OrderItem {
    const TABLE: Table = Table::OrderItems;
}

impl Record for Rental {
    const TABLE: Table = Table::Rentals;
}

impl Record for CartItem {
    const TABLE: Table = Table::CartItems;
}

impl Record for Payment {
    const TABLE: Table = Table::Payments;
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_names_match_snapshot_layout() {
        let names: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "users",
                "books",
                "book_categories",
                "orders",
                "order_items",
                "rentals",
                "cart_items",
                "payments",
            ]
        );
    }

    #[test]
    fn test_created_field_special_cases() {
        assert_eq!(Table::CartItems.created_field(), Some("added_at"));
        assert_eq!(Table::BookCategories.created_field(), None);
        assert_eq!(Table::OrderItems.created_field(), None);
        assert_eq!(Table::Orders.created_field(), Some("created_at"));
    }

    #[test]
    fn test_updated_at_tracking() {
        assert!(Table::Books.tracks_updated_at());
        assert!(Table::Orders.tracks_updated_at());
        assert!(Table::Rentals.tracks_updated_at());
        assert!(!Table::Users.tracks_updated_at());
        assert!(!Table::CartItems.tracks_updated_at());
        assert!(!Table::Payments.tracks_updated_at());
    }
}
