//! # Cart API
//!
//! The persisted per-user cart with merge semantics.
//!
//! ## Merge Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    add(user, book, qty, rental)                         │
//! │                                                                         │
//! │  Line exists for (user, book, is_rental)?                              │
//! │       │                                                                 │
//! │       ├── YES ──► quantity += qty                                      │
//! │       │           rental_days overwritten when a new duration given    │
//! │       │                                                                 │
//! │       └── NO  ──► new line appended                                    │
//! │                                                                         │
//! │  Invariant: at most ONE line per (user, book, is_rental). A purchase   │
//! │  and a rental of the same book are distinct lines.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use bookhaven_core::types::{Book, CartItem};
use bookhaven_core::validation::{validate_cart_size, validate_quantity, validate_rental_days};
use bookhaven_core::{cart, Money, ValidationError};
use bookhaven_store::{Criteria, Table};

use crate::error::ApiError;
use crate::storefront::Inner;

/// Nominal cart read, milliseconds.
const READ_MS: u64 = 300;
/// Nominal cart mutation, milliseconds.
const MUTATE_MS: u64 = 500;

// =============================================================================
// Cart API
// =============================================================================

/// Cart operations for one storefront.
#[derive(Debug, Clone)]
pub struct CartApi {
    inner: Arc<Inner>,
}

impl CartApi {
    pub(crate) fn new(inner: Arc<Inner>) -> Self {
        CartApi { inner }
    }

    fn for_user(user_id: &str) -> Criteria {
        Criteria::eq("user_id", user_id)
    }

    fn for_line(user_id: &str, book_id: &str, is_rental: bool) -> Criteria {
        Criteria::eq("user_id", user_id)
            .and(Criteria::eq("book_id", book_id))
            .and(Criteria::eq("is_rental", is_rental))
    }

    /// Lists the user's cart lines.
    pub async fn items(&self, user_id: &str) -> Result<Vec<CartItem>, ApiError> {
        self.inner.config.latency.pause(READ_MS).await;
        Ok(self.inner.store.select(&Self::for_user(user_id))?)
    }

    /// Adds to the cart, merging with an existing `(book, is_rental)`
    /// line when present. Returns the resulting cart.
    ///
    /// `rental_days` is required for rental lines and ignored for
    /// purchase lines.
    pub async fn add(
        &self,
        user_id: &str,
        book_id: &str,
        quantity: i64,
        is_rental: bool,
        rental_days: Option<u32>,
    ) -> Result<Vec<CartItem>, ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        validate_quantity(quantity)?;

        let rental_days = if is_rental {
            let days = rental_days.ok_or(ValidationError::Required {
                field: "rental days".to_string(),
            })?;
            validate_rental_days(days)?;
            Some(days)
        } else {
            None
        };

        let line = Self::for_line(user_id, book_id, is_rental);
        let existing: Vec<CartItem> = self.inner.store.select(&line)?;

        match existing.first() {
            Some(current) => {
                // Merge: same pair never duplicates
                let mut patch = json!({ "quantity": current.quantity + quantity });
                if let Some(days) = rental_days {
                    patch["rental_days"] = json!(days);
                }
                let _: Vec<CartItem> = self.inner.store.update(patch, &line)?;
                debug!(user_id = %user_id, book_id = %book_id, is_rental, "cart line merged");
            }
            None => {
                validate_cart_size(self.count_lines(user_id)?)?;
                self.inner.store.insert(CartItem {
                    id: String::new(),
                    user_id: user_id.to_string(),
                    book_id: book_id.to_string(),
                    quantity,
                    is_rental,
                    rental_days,
                    added_at: Utc::now(),
                })?;
                debug!(user_id = %user_id, book_id = %book_id, is_rental, "cart line added");
            }
        }

        Ok(self.inner.store.select(&Self::for_user(user_id))?)
    }

    /// Sets a line's quantity directly (not additive). Returns the
    /// resulting cart; a missing line leaves the cart untouched.
    pub async fn update_quantity(
        &self,
        user_id: &str,
        book_id: &str,
        is_rental: bool,
        quantity: i64,
    ) -> Result<Vec<CartItem>, ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        validate_quantity(quantity)?;

        let _: Vec<CartItem> = self.inner.store.update(
            json!({ "quantity": quantity }),
            &Self::for_line(user_id, book_id, is_rental),
        )?;

        Ok(self.inner.store.select(&Self::for_user(user_id))?)
    }

    /// Removes a line. No-op when absent. Returns the resulting cart.
    pub async fn remove(
        &self,
        user_id: &str,
        book_id: &str,
        is_rental: bool,
    ) -> Result<Vec<CartItem>, ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        self.inner
            .store
            .delete(Table::CartItems, &Self::for_line(user_id, book_id, is_rental));
        Ok(self.inner.store.select(&Self::for_user(user_id))?)
    }

    /// Empties the user's cart.
    pub async fn clear(&self, user_id: &str) -> Result<(), ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        self.inner
            .store
            .delete(Table::CartItems, &Self::for_user(user_id));
        info!(user_id = %user_id, "cart cleared");
        Ok(())
    }

    /// Totals the user's cart.
    ///
    /// Purchase lines at `price × qty`, rental lines at the prorated
    /// weekly rate; lines whose book has left the catalog contribute
    /// zero rather than failing the whole total.
    pub async fn total(&self, user_id: &str) -> Result<Money, ApiError> {
        self.inner.config.latency.pause(READ_MS).await;

        let items: Vec<CartItem> = self.inner.store.select(&Self::for_user(user_id))?;
        let books: Vec<Book> = self.inner.store.select(&Criteria::eq("active", true))?;
        let by_id: HashMap<&str, &Book> = books.iter().map(|b| (b.id.as_str(), b)).collect();

        Ok(cart::cart_total(
            items
                .iter()
                .map(|item| (item, by_id.get(item.book_id.as_str()).copied())),
        ))
    }

    fn count_lines(&self, user_id: &str) -> Result<usize, ApiError> {
        Ok(self
            .inner
            .store
            .select_rows(Table::CartItems, &Self::for_user(user_id))
            .len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::NewBook;
    use crate::storefront::Storefront;
    use crate::ErrorCode;
    use bookhaven_core::types::{Role, User};
    use chrono::NaiveDate;

    const USER: &str = "usr-1001";

    fn admin() -> User {
        User {
            id: "usr-1".to_string(),
            name: "Admin".to_string(),
            email: "admin@bookhaven.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    async fn seed_book(shop: &Storefront, title: &str, price: i64, rent: Option<i64>) -> String {
        shop.books()
            .add_book(
                &admin(),
                NewBook {
                    title: title.to_string(),
                    author: "Author".to_string(),
                    description: String::new(),
                    price_cents: price,
                    weekly_rent_cents: rent,
                    cover_image: String::new(),
                    category_ids: vec![],
                    featured: false,
                    in_stock: 10,
                    rating: 4.0,
                    publish_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_repeated_adds_merge_into_one_line() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let book = seed_book(&shop, "Dune", 1999, None).await;

        cart.add(USER, &book, 1, false, None).await.unwrap();
        cart.add(USER, &book, 2, false, None).await.unwrap();
        let items = cart.add(USER, &book, 3, false, None).await.unwrap();

        // Quantity is the sum of every add; exactly one line exists
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 6);
    }

    #[tokio::test]
    async fn test_purchase_and_rental_lines_are_distinct() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let book = seed_book(&shop, "Dune", 1999, Some(399)).await;

        cart.add(USER, &book, 1, false, None).await.unwrap();
        let items = cart.add(USER, &book, 1, true, Some(14)).await.unwrap();

        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn test_rental_add_overwrites_duration() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let book = seed_book(&shop, "Dune", 1999, Some(399)).await;

        cart.add(USER, &book, 1, true, Some(7)).await.unwrap();
        let items = cart.add(USER, &book, 1, true, Some(21)).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].rental_days, Some(21));
    }

    #[tokio::test]
    async fn test_rental_add_requires_days() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let book = seed_book(&shop, "Dune", 1999, Some(399)).await;

        let err = cart.add(USER, &book, 1, true, None).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_quantity_is_absolute() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let book = seed_book(&shop, "Dune", 1999, None).await;

        cart.add(USER, &book, 5, false, None).await.unwrap();
        let items = cart.update_quantity(USER, &book, false, 2).await.unwrap();
        assert_eq!(items[0].quantity, 2);

        let err = cart.update_quantity(USER, &book, false, 0).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let a = seed_book(&shop, "Dune", 1999, None).await;
        let b = seed_book(&shop, "Sapiens", 2499, None).await;

        cart.add(USER, &a, 1, false, None).await.unwrap();
        cart.add(USER, &b, 1, false, None).await.unwrap();

        let items = cart.remove(USER, &a, false).await.unwrap();
        assert_eq!(items.len(), 1);

        // Removing an absent line is a no-op
        let items = cart.remove(USER, &a, false).await.unwrap();
        assert_eq!(items.len(), 1);

        cart.clear(USER).await.unwrap();
        assert!(cart.items(USER).await.unwrap().is_empty());
    }

    /// Storefront scenario: 2× purchase at $10.00 plus a 14-day rental at
    /// $6.00/week totals $32.00.
    #[tokio::test]
    async fn test_total_mixed_cart() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let a = seed_book(&shop, "Book A", 1000, None).await;
        let b = seed_book(&shop, "Book B", 5000, Some(600)).await;

        cart.add(USER, &a, 2, false, None).await.unwrap();
        cart.add(USER, &b, 1, true, Some(14)).await.unwrap();

        let total = cart.total(USER).await.unwrap();
        assert_eq!(total.cents(), 3200);
    }

    #[tokio::test]
    async fn test_total_skips_removed_books() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let a = seed_book(&shop, "Book A", 1000, None).await;
        let b = seed_book(&shop, "Book B", 2000, None).await;

        cart.add(USER, &a, 1, false, None).await.unwrap();
        cart.add(USER, &b, 1, false, None).await.unwrap();

        shop.books().delete_book(&admin(), &b).await.unwrap();

        let total = cart.total(USER).await.unwrap();
        assert_eq!(total.cents(), 1000);
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let shop = Storefront::in_memory();
        let cart = shop.cart();
        let book = seed_book(&shop, "Dune", 1999, None).await;

        cart.add("usr-1001", &book, 1, false, None).await.unwrap();
        cart.add("usr-2002", &book, 4, false, None).await.unwrap();

        assert_eq!(cart.items("usr-1001").await.unwrap().len(), 1);
        assert_eq!(cart.items("usr-1001").await.unwrap()[0].quantity, 1);
        assert_eq!(cart.items("usr-2002").await.unwrap()[0].quantity, 4);

        cart.clear("usr-1001").await.unwrap();
        assert!(cart.items("usr-1001").await.unwrap().is_empty());
        assert_eq!(cart.items("usr-2002").await.unwrap().len(), 1);
    }
}
