//! # Orders API
//!
//! Checkout and the order lifecycle.
//!
//! ## Checkout Side-Effect Ordering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_order pipeline                              │
//! │                                                                         │
//! │  1. validate      shipping fields, non-empty line set                  │
//! │  2. resolve       every referenced book; ANY miss fails the whole      │
//! │                   operation with nothing written                       │
//! │  3. authorize     payment for the computed total; a decline aborts     │
//! │                   BEFORE any record exists                             │
//! │  4. persist       order → line-item snapshots → payment row →          │
//! │                   one rental per rental line                           │
//! │  5. email         best-effort; failure is logged and the order         │
//! │                   stands with email_sent = false                       │
//! │                                                                         │
//! │  Steps 1-3 write nothing, so every failure path is all-or-nothing     │
//! │  from the caller's point of view.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line items snapshot the book title and unit price at checkout; later
//! catalog edits never touch historical orders.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use bookhaven_core::types::{
    Book, CartItem, Order, OrderItem, OrderStatus, Payment, PaymentMethod, PaymentStatus, Rental,
    ShippingAddress, User,
};
use bookhaven_core::validation::validate_shipping_address;
use bookhaven_core::{CoreError, Money};
use bookhaven_store::Criteria;

use crate::error::ApiError;
use crate::storefront::{ensure_admin, Inner};

/// Nominal checkout round-trip, milliseconds.
const CHECKOUT_MS: u64 = 1000;
/// Nominal order list read, milliseconds.
const LIST_MS: u64 = 500;
/// Nominal single-order read, milliseconds.
const GET_MS: u64 = 300;
/// Nominal status update, milliseconds.
const MUTATE_MS: u64 = 700;

// =============================================================================
// Response Types
// =============================================================================

/// A placed order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// A book resolved and priced for one checkout line. Built before any
/// write happens.
struct ResolvedLine {
    book_id: String,
    title: String,
    quantity: i64,
    unit_price: Money,
    is_rental: bool,
    rental_days: Option<u32>,
    weekly_rate: Option<Money>,
}

// =============================================================================
// Orders API
// =============================================================================

/// Order operations.
#[derive(Debug, Clone)]
pub struct OrdersApi {
    inner: Arc<Inner>,
}

impl OrdersApi {
    pub(crate) fn new(inner: Arc<Inner>) -> Self {
        OrdersApi { inner }
    }

    /// Places an order for an explicit set of cart lines.
    ///
    /// Atomic from the caller's view: either the order with every line
    /// item exists afterwards, or nothing does.
    pub async fn create_order(
        &self,
        user_id: &str,
        items: &[CartItem],
        shipping: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderConfirmation, ApiError> {
        self.inner.config.latency.pause(CHECKOUT_MS).await;

        if items.is_empty() {
            return Err(ApiError::validation("Cart is empty"));
        }
        validate_shipping_address(&shipping)?;

        // Resolve and price every line before writing anything
        let mut lines = Vec::with_capacity(items.len());
        let mut total = Money::zero();
        for item in items {
            let line = self.resolve_line(item)?;
            total += line.unit_price.multiply_quantity(line.quantity);
            lines.push(line);
        }

        // Payment first: a declined charge must leave no order behind
        let auth = self
            .inner
            .gateway
            .authorize(total, payment_method)
            .await?;

        let now = Utc::now();
        let order = self.inner.store.insert(Order {
            id: String::new(),
            user_id: user_id.to_string(),
            total_cents: total.cents(),
            status: OrderStatus::Processing,
            shipping,
            payment_method,
            email_sent: false,
            created_at: now,
            updated_at: now,
        })?;

        let mut order_items = Vec::with_capacity(lines.len());
        for line in &lines {
            order_items.push(self.inner.store.insert(OrderItem {
                id: String::new(),
                order_id: order.id.clone(),
                book_id: line.book_id.clone(),
                title: line.title.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                is_rental: line.is_rental,
                rental_days: line.rental_days,
            })?);
        }

        self.inner.store.insert(Payment {
            id: String::new(),
            order_id: order.id.clone(),
            amount_cents: total.cents(),
            payment_method,
            transaction_id: auth.transaction_id,
            status: PaymentStatus::Completed,
            created_at: now,
        })?;

        // A rental checkout also opens the rental records
        for line in &lines {
            if !line.is_rental {
                continue;
            }
            let days = line.rental_days.unwrap_or(bookhaven_core::DEFAULT_RENTAL_DAYS);
            let weekly = line.weekly_rate.unwrap_or_else(Money::zero);
            self.inner.store.insert(Rental {
                id: String::new(),
                user_id: user_id.to_string(),
                book_id: line.book_id.clone(),
                book_title: line.title.clone(),
                start_date: now,
                end_date: now + chrono::Duration::days(days as i64),
                returned: false,
                return_date: None,
                deposit_cents: self.inner.config.rental_policy.deposit_for(weekly).cents(),
                refund_cents: None,
                late_fee_cents: None,
                created_at: now,
                updated_at: now,
            })?;
        }

        let order = self.dispatch_confirmation(order).await;

        info!(
            order_id = %order.id,
            user_id = %user_id,
            total = %order.total(),
            items = order_items.len(),
            "order created"
        );

        Ok(OrderConfirmation {
            order,
            items: order_items,
        })
    }

    /// Checks out the user's stored cart and clears it on success.
    pub async fn checkout(
        &self,
        user_id: &str,
        shipping: ShippingAddress,
        payment_method: PaymentMethod,
    ) -> Result<OrderConfirmation, ApiError> {
        let items: Vec<CartItem> = self
            .inner
            .store
            .select(&Criteria::eq("user_id", user_id))?;

        let confirmation = self
            .create_order(user_id, &items, shipping, payment_method)
            .await?;

        // The cart only empties once the order is fully persisted
        self.inner.store.delete(
            bookhaven_store::Table::CartItems,
            &Criteria::eq("user_id", user_id),
        );

        Ok(confirmation)
    }

    /// Fetches one order.
    pub async fn get(&self, order_id: &str) -> Result<Order, ApiError> {
        self.inner.config.latency.pause(GET_MS).await;
        let mut matches: Vec<Order> = self.inner.store.select(&Criteria::eq("id", order_id))?;
        matches
            .pop()
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Lists one order's line items.
    pub async fn items(&self, order_id: &str) -> Result<Vec<OrderItem>, ApiError> {
        self.inner.config.latency.pause(GET_MS).await;
        Ok(self
            .inner
            .store
            .select(&Criteria::eq("order_id", order_id))?)
    }

    /// Lists a user's orders, most recent first.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Order>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;
        let mut orders: Vec<Order> = self
            .inner
            .store
            .select(&Criteria::eq("user_id", user_id))?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Lists every order in the store, most recent first. Admin only.
    pub async fn list_all(&self, actor: &User) -> Result<Vec<Order>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;
        ensure_admin(actor, "view all orders")?;
        let mut orders: Vec<Order> = self.inner.store.select(&Criteria::All)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Advances an order's status.
    ///
    /// Only forward transitions are accepted; `delivered` and
    /// `cancelled` accept nothing further.
    pub async fn update_status(
        &self,
        order_id: &str,
        next: OrderStatus,
    ) -> Result<Order, ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;

        let current = {
            let mut matches: Vec<Order> =
                self.inner.store.select(&Criteria::eq("id", order_id))?;
            matches
                .pop()
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?
        };

        if !current.status.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                order_id: order_id.to_string(),
                from: current.status,
                to: next,
            }
            .into());
        }

        let mut updated: Vec<Order> = self.inner.store.update(
            json!({ "status": next }),
            &Criteria::eq("id", order_id),
        )?;

        info!(order_id = %order_id, from = %current.status, to = %next, "order status updated");
        updated
            .pop()
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    /// Cancels an order, when it is still in a non-terminal state.
    pub async fn cancel(&self, order_id: &str) -> Result<Order, ApiError> {
        self.update_status(order_id, OrderStatus::Cancelled).await
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Resolves one cart line against the live catalog and freezes its
    /// price. Pure read.
    fn resolve_line(&self, item: &CartItem) -> Result<ResolvedLine, ApiError> {
        let mut books: Vec<Book> = self.inner.store.select(
            &Criteria::eq("id", item.book_id.clone()).and(Criteria::eq("active", true)),
        )?;
        let book = books
            .pop()
            .ok_or_else(|| CoreError::BookNotFound(item.book_id.clone()))?;

        let (unit_price, weekly_rate, rental_days) = if item.is_rental {
            let days = item.effective_rental_days();
            let price = book
                .rental_price(days)
                .ok_or_else(|| CoreError::BookNotRentable(book.id.clone()))?;
            (price, book.weekly_rent(), Some(days))
        } else {
            (book.price(), None, None)
        };

        Ok(ResolvedLine {
            book_id: book.id,
            title: book.title,
            quantity: item.quantity,
            unit_price,
            is_rental: item.is_rental,
            rental_days,
            weekly_rate,
        })
    }

    /// Best-effort confirmation email; returns the order with its
    /// `email_sent` flag reflecting the outcome.
    async fn dispatch_confirmation(&self, order: Order) -> Order {
        let recipient = {
            let mut users: Vec<User> = match self
                .inner
                .store
                .select(&Criteria::eq("id", order.user_id.clone()))
            {
                Ok(users) => users,
                Err(e) => {
                    warn!(order_id = %order.id, error = %e, "skipping confirmation email");
                    return order;
                }
            };
            users.pop().map(|u| u.email)
        };

        let Some(recipient) = recipient else {
            warn!(order_id = %order.id, user_id = %order.user_id, "no email on file, skipping confirmation");
            return order;
        };

        match self
            .inner
            .mailer
            .send_order_confirmation(&recipient, &order)
            .await
        {
            Ok(()) => {
                let updated: Result<Vec<Order>, _> = self.inner.store.update(
                    json!({ "email_sent": true }),
                    &Criteria::eq("id", order.id.clone()),
                );
                match updated {
                    Ok(mut orders) => orders.pop().unwrap_or(order),
                    Err(e) => {
                        warn!(order_id = %order.id, error = %e, "email flag update failed");
                        order
                    }
                }
            }
            Err(e) => {
                // The order stands; only the flag records the miss
                warn!(order_id = %order.id, error = %e, "confirmation email failed");
                order
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::NewBook;
    use crate::config::Latency;
    use crate::services::{MockEmailService, MockPaymentGateway};
    use crate::storefront::Storefront;
    use crate::ErrorCode;
    use bookhaven_core::types::Role;
    use bookhaven_store::Table;
    use chrono::NaiveDate;

    fn admin() -> User {
        User {
            id: "usr-1".to_string(),
            name: "Admin".to_string(),
            email: "admin@bookhaven.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    fn shipping() -> ShippingAddress {
        ShippingAddress {
            street: "221B Baker Street".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            zip_code: "NW1 6XE".to_string(),
            country: "UK".to_string(),
        }
    }

    async fn seed_user(shop: &Storefront, email: &str) -> String {
        shop.users()
            .register("John Doe", email, "hunter22", "hunter22")
            .await
            .unwrap()
            .id
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
    async fn test_checkout_creates_order_items_and_payment() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        let b = seed_book(&shop, "Book B", 5000, Some(600)).await;

        shop.cart().add(&user, &a, 2, false, None).await.unwrap();
        shop.cart().add(&user, &b, 1, true, Some(14)).await.unwrap();

        let confirmation = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap();

        // 2 × $10.00 + $6.00/week × 2 weeks = $32.00
        assert_eq!(confirmation.order.total_cents, 3200);
        assert_eq!(confirmation.order.status, OrderStatus::Processing);
        assert!(confirmation.order.email_sent);

        // Line items sum to the total
        let sum: i64 = confirmation
            .items
            .iter()
            .map(|i| i.line_total().cents())
            .sum();
        assert_eq!(sum, confirmation.order.total_cents);

        // The payment row carries the gateway reference
        let payments: Vec<Payment> = shop
            .orders()
            .inner
            .store
            .select(&Criteria::eq("order_id", confirmation.order.id.clone()))
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].status, PaymentStatus::Completed);
        assert!(!payments[0].transaction_id.is_empty());

        // Rental checkout opened a rental with a 2× weekly deposit
        let rentals: Vec<Rental> = shop
            .orders()
            .inner
            .store
            .select(&Criteria::eq("user_id", user.clone()))
            .unwrap();
        assert_eq!(rentals.len(), 1);
        assert_eq!(rentals[0].deposit_cents, 1200);
        assert!(!rentals[0].returned);

        // Cart cleared on success
        assert!(shop.cart().items(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_book_fails_whole_checkout() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;

        shop.cart().add(&user, &a, 1, false, None).await.unwrap();
        shop.cart()
            .add(&user, "book-9999", 1, false, None)
            .await
            .unwrap();

        let err = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        // No partial order observable
        let orders = shop.orders();
        assert_eq!(orders.inner.store.count(Table::Orders), 0);
        assert_eq!(orders.inner.store.count(Table::OrderItems), 0);
        assert_eq!(orders.inner.store.count(Table::Payments), 0);

        // The cart survives a failed checkout
        assert_eq!(shop.cart().items(&user).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_payment_decline_leaves_no_records() {
        let shop = Storefront::in_memory_with_services(
            MockPaymentGateway::new(Latency::none()).declining(),
            MockEmailService::new(Latency::none()),
        );
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        shop.cart().add(&user, &a, 1, false, None).await.unwrap();

        let err = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PaymentDeclined);

        let orders = shop.orders();
        assert_eq!(orders.inner.store.count(Table::Orders), 0);
        assert_eq!(orders.inner.store.count(Table::OrderItems), 0);
        assert_eq!(orders.inner.store.count(Table::Payments), 0);
    }

    #[tokio::test]
    async fn test_email_failure_keeps_order() {
        let shop = Storefront::in_memory_with_services(
            MockPaymentGateway::new(Latency::none()),
            MockEmailService::new(Latency::none()).failing(),
        );
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        shop.cart().add(&user, &a, 1, false, None).await.unwrap();

        let confirmation = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap();

        assert!(!confirmation.order.email_sent);
        let stored = shop.orders().get(&confirmation.order.id).await.unwrap();
        assert_eq!(stored.total_cents, 1000);
        assert!(!stored.email_sent);
    }

    #[tokio::test]
    async fn test_snapshots_survive_catalog_edits() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        shop.cart().add(&user, &a, 1, false, None).await.unwrap();

        let confirmation = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap();

        // Reprice and rename the book after checkout
        shop.books()
            .update_book(
                &admin(),
                &a,
                crate::books::BookPatch {
                    title: Some("Renamed".to_string()),
                    price_cents: Some(9999),
                    ..crate::books::BookPatch::default()
                },
            )
            .await
            .unwrap();

        let items = shop.orders().items(&confirmation.order.id).await.unwrap();
        assert_eq!(items[0].title, "Book A");
        assert_eq!(items[0].unit_price_cents, 1000);
        let order = shop.orders().get(&confirmation.order.id).await.unwrap();
        assert_eq!(order.total_cents, 1000);
    }

    #[tokio::test]
    async fn test_status_machine_enforced() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        shop.cart().add(&user, &a, 1, false, None).await.unwrap();
        let order = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap()
            .order;

        // Forward moves work
        let shipped = shop
            .orders()
            .update_status(&order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);

        // Backward move rejected
        let err = shop
            .orders()
            .update_status(&order.id, OrderStatus::Processing)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        // Terminal state accepts nothing
        shop.orders()
            .update_status(&order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        let err = shop.orders().cancel(&order.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);
    }

    #[tokio::test]
    async fn test_cancel_from_non_terminal() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        shop.cart().add(&user, &a, 1, false, None).await.unwrap();
        let order = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap()
            .order;

        let cancelled = shop.orders().cancel(&order.id).await.unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_list_all_requires_admin() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;
        let a = seed_book(&shop, "Book A", 1000, None).await;
        shop.cart().add(&user, &a, 1, false, None).await.unwrap();
        shop.orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap();

        let shopper = User {
            id: user.clone(),
            name: "John".to_string(),
            email: "john@example.com".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let err = shop.orders().list_all(&shopper).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);

        let all = shop.orders().list_all(&admin()).await.unwrap();
        assert_eq!(all.len(), 1);

        let mine = shop.orders().list_for_user(&user).await.unwrap();
        assert_eq!(mine.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_cart_checkout_rejected() {
        let shop = Storefront::in_memory();
        let user = seed_user(&shop, "john@example.com").await;

        let err = shop
            .orders()
            .checkout(&user, shipping(), PaymentMethod::Card)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
