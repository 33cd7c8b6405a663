//! # Cart Math
//!
//! Pure pricing functions for the persisted cart.
//!
//! The cart itself lives in the record store (`cart_items` table); this
//! module only knows how to price lines. Keeping the math here means the
//! total can be tested without any storage in play.
//!
//! ## Pricing Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Line Pricing                                 │
//! │                                                                         │
//! │  Purchase line:  price × quantity                                      │
//! │                                                                         │
//! │  Rental line:    (weekly_rate × days / 7) × quantity                   │
//! │                  days defaults to 7 when the line carries none         │
//! │                                                                         │
//! │  Line whose book no longer resolves: contributes zero (skip, don't    │
//! │  fail - the UI prunes dead lines lazily)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::money::Money;
use crate::types::{Book, CartItem};

/// Prices a single cart line against its resolved book.
///
/// Returns `None` when the line is a rental but the book has no weekly
/// rate (the line cannot be priced and contributes nothing).
pub fn line_price(book: &Book, item: &CartItem) -> Option<Money> {
    if item.is_rental {
        book.rental_price(item.effective_rental_days())
    } else {
        Some(book.price())
    }
}

/// Totals a cart given each line paired with its resolved book.
///
/// Lines whose book is `None` (removed from the catalog since the line
/// was added) are skipped. The result depends only on the final cart
/// contents, not on the order mutations happened in.
///
/// ## Example
/// ```rust,ignore
/// let total = cart_total(items.iter().map(|i| (i, books.get(&i.book_id))));
/// ```
pub fn cart_total<'a, I>(lines: I) -> Money
where
    I: IntoIterator<Item = (&'a CartItem, Option<&'a Book>)>,
{
    let mut total = Money::zero();
    for (item, book) in lines {
        let Some(book) = book else { continue };
        if let Some(unit) = line_price(book, item) {
            total += unit.multiply_quantity(item.quantity);
        }
    }
    total
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn test_book(id: &str, price_cents: i64, weekly_rent_cents: Option<i64>) -> Book {
        Book {
            id: id.to_string(),
            title: format!("Book {}", id),
            author: "Author".to_string(),
            description: String::new(),
            price_cents,
            weekly_rent_cents,
            cover_image: String::new(),
            category_ids: vec![],
            featured: false,
            in_stock: 10,
            rating: 4.0,
            publish_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn test_item(book_id: &str, qty: i64, is_rental: bool, days: Option<u32>) -> CartItem {
        CartItem {
            id: String::new(),
            user_id: "usr-1001".to_string(),
            book_id: book_id.to_string(),
            quantity: qty,
            is_rental,
            rental_days: days,
            added_at: Utc::now(),
        }
    }

    #[test]
    fn test_purchase_line_price() {
        let book = test_book("book-1001", 1000, None);
        let item = test_item("book-1001", 2, false, None);
        assert_eq!(line_price(&book, &item).unwrap().cents(), 1000);
    }

    #[test]
    fn test_rental_line_price_prorated() {
        let book = test_book("book-1002", 1000, Some(600));
        let item = test_item("book-1002", 1, true, Some(14));
        assert_eq!(line_price(&book, &item).unwrap().cents(), 1200);
    }

    #[test]
    fn test_rental_line_without_rate_unpriceable() {
        let book = test_book("book-1003", 1000, None);
        let item = test_item("book-1003", 1, true, Some(7));
        assert!(line_price(&book, &item).is_none());
    }

    /// Scenario from the storefront: 2× Book A (purchase, $10.00) plus
    /// 1× Book B (rental, $6.00/week for 14 days) totals $32.00.
    #[test]
    fn test_cart_total_mixed_lines() {
        let book_a = test_book("book-1001", 1000, None);
        let book_b = test_book("book-1002", 2000, Some(600));

        let item_a = test_item("book-1001", 2, false, None);
        let item_b = test_item("book-1002", 1, true, Some(14));

        let total = cart_total([
            (&item_a, Some(&book_a)),
            (&item_b, Some(&book_b)),
        ]);
        assert_eq!(total.cents(), 3200);
    }

    #[test]
    fn test_cart_total_skips_missing_books() {
        let book_a = test_book("book-1001", 1000, None);
        let item_a = test_item("book-1001", 1, false, None);
        let dangling = test_item("book-9999", 5, false, None);

        let total = cart_total([(&item_a, Some(&book_a)), (&dangling, None)]);
        assert_eq!(total.cents(), 1000);
    }

    #[test]
    fn test_cart_total_invariant_under_line_order() {
        let book_a = test_book("book-1001", 1234, None);
        let book_b = test_book("book-1002", 2000, Some(700));

        let item_a = test_item("book-1001", 3, false, None);
        let item_b = test_item("book-1002", 2, true, Some(10));

        let forward = cart_total([(&item_a, Some(&book_a)), (&item_b, Some(&book_b))]);
        let reversed = cart_total([(&item_b, Some(&book_b)), (&item_a, Some(&book_a))]);
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_rental_defaults_to_one_week() {
        let book = test_book("book-1002", 1000, Some(700));
        let item = test_item("book-1002", 1, true, None);
        assert_eq!(line_price(&book, &item).unwrap().cents(), 700);
    }
}
