//! # Books API
//!
//! Catalog queries plus the admin-gated create/update/delete operations.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Books API                                       │
//! │                                                                         │
//! │  Anyone:                         Admin only:                            │
//! │  ├── list()                      ├── add_book(actor, draft)            │
//! │  ├── get(id)                     ├── update_book(actor, id, patch)     │
//! │  ├── search(query)               └── delete_book(actor, id)            │
//! │  ├── by_category(name)                 (soft removal: active = false)  │
//! │  ├── featured()                                                         │
//! │  └── categories()                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Soft-removed books stay in the table so order-item snapshots keep a
//! valid referent, but every catalog query filters them out.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info};

use bookhaven_core::types::{Book, Category, User};
use bookhaven_core::validation::{
    validate_author, validate_book_title, validate_price_cents, validate_search_query,
};
use bookhaven_core::CoreError;
use bookhaven_store::Criteria;

use crate::error::ApiError;
use crate::storefront::{ensure_admin, Inner};

/// Nominal catalog read, milliseconds.
const LIST_MS: u64 = 500;
/// Nominal single-book read, milliseconds.
const GET_MS: u64 = 300;
/// Nominal admin mutation, milliseconds.
const MUTATE_MS: u64 = 700;

// =============================================================================
// Books API
// =============================================================================

/// Catalog operations.
#[derive(Debug, Clone)]
pub struct BooksApi {
    inner: Arc<Inner>,
}

impl BooksApi {
    pub(crate) fn new(inner: Arc<Inner>) -> Self {
        BooksApi { inner }
    }

    fn active() -> Criteria {
        Criteria::eq("active", true)
    }

    /// Lists every active book.
    pub async fn list(&self) -> Result<Vec<Book>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;
        Ok(self.inner.store.select(&Self::active())?)
    }

    /// Fetches one active book by id.
    pub async fn get(&self, id: &str) -> Result<Book, ApiError> {
        self.inner.config.latency.pause(GET_MS).await;
        let mut matches: Vec<Book> = self
            .inner
            .store
            .select(&Criteria::eq("id", id).and(Self::active()))?;
        matches
            .pop()
            .ok_or_else(|| CoreError::BookNotFound(id.to_string()).into())
    }

    /// Case-insensitive search over title, author and description.
    pub async fn search(&self, query: &str) -> Result<Vec<Book>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;
        let needle = validate_search_query(query)?.to_lowercase();

        let books: Vec<Book> = self.inner.store.select(&Self::active())?;
        if needle.is_empty() {
            return Ok(books);
        }

        Ok(books
            .into_iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
                    || book.description.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Lists active books tagged with the named category.
    pub async fn by_category(&self, category_name: &str) -> Result<Vec<Book>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;

        let mut categories: Vec<Category> = self
            .inner
            .store
            .select(&Criteria::eq("name", category_name))?;
        let Some(category) = categories.pop() else {
            return Ok(Vec::new());
        };

        Ok(self
            .inner
            .store
            .select(&Criteria::contains("category_ids", category.id).and(Self::active()))?)
    }

    /// Lists the featured shelf.
    pub async fn featured(&self) -> Result<Vec<Book>, ApiError> {
        self.inner.config.latency.pause(LIST_MS).await;
        Ok(self
            .inner
            .store
            .select(&Criteria::eq("featured", true).and(Self::active()))?)
    }

    /// Lists every category.
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.inner.config.latency.pause(GET_MS).await;
        Ok(self.inner.store.select(&Criteria::All)?)
    }

    // -------------------------------------------------------------------------
    // Admin operations
    // -------------------------------------------------------------------------

    /// Adds a book to the catalog. Admin only.
    pub async fn add_book(&self, actor: &User, draft: NewBook) -> Result<Book, ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        ensure_admin(actor, "add books")?;

        validate_book_title(&draft.title)?;
        validate_author(&draft.author)?;
        validate_price_cents(draft.price_cents)?;
        if let Some(rent) = draft.weekly_rent_cents {
            validate_price_cents(rent)?;
        }

        let now = Utc::now();
        let book = self.inner.store.insert(Book {
            id: String::new(),
            title: draft.title,
            author: draft.author,
            description: draft.description,
            price_cents: draft.price_cents,
            weekly_rent_cents: draft.weekly_rent_cents,
            cover_image: draft.cover_image,
            category_ids: draft.category_ids,
            featured: draft.featured,
            in_stock: draft.in_stock,
            rating: draft.rating,
            publish_date: draft.publish_date,
            active: true,
            created_at: now,
            updated_at: now,
        })?;

        info!(book_id = %book.id, title = %book.title, "book added");
        Ok(book)
    }

    /// Applies a partial edit to a book. Admin only.
    pub async fn update_book(
        &self,
        actor: &User,
        id: &str,
        patch: BookPatch,
    ) -> Result<Book, ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        ensure_admin(actor, "edit books")?;

        let patch = patch.into_patch_value()?;
        debug!(book_id = %id, "updating book");

        let mut updated: Vec<Book> = self
            .inner
            .store
            .update(patch, &Criteria::eq("id", id).and(Self::active()))?;
        updated
            .pop()
            .ok_or_else(|| CoreError::BookNotFound(id.to_string()).into())
    }

    /// Soft-removes a book from the catalog. Admin only.
    ///
    /// The record stays in the table (order items reference it); it just
    /// stops matching catalog queries.
    pub async fn delete_book(&self, actor: &User, id: &str) -> Result<(), ApiError> {
        self.inner.config.latency.pause(MUTATE_MS).await;
        ensure_admin(actor, "delete books")?;

        let removed: Vec<Book> = self.inner.store.update(
            serde_json::json!({ "active": false }),
            &Criteria::eq("id", id).and(Self::active()),
        )?;

        if removed.is_empty() {
            return Err(CoreError::BookNotFound(id.to_string()).into());
        }

        info!(book_id = %id, "book removed from catalog");
        Ok(())
    }
}

// =============================================================================
// Input Types
// =============================================================================

/// Fields for a new catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub price_cents: i64,
    pub weekly_rent_cents: Option<i64>,
    pub cover_image: String,
    pub category_ids: Vec<String>,
    pub featured: bool,
    pub in_stock: i64,
    pub rating: f32,
    pub publish_date: NaiveDate,
}

/// Partial edit of a book. Unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub weekly_rent_cents: Option<i64>,
    pub cover_image: Option<String>,
    pub category_ids: Option<Vec<String>>,
    pub featured: Option<bool>,
    pub in_stock: Option<i64>,
    pub rating: Option<f32>,
}

impl BookPatch {
    /// Validates the set fields and converts to a shallow-merge patch.
    fn into_patch_value(self) -> Result<Value, ApiError> {
        let mut patch = Map::new();

        if let Some(title) = self.title {
            validate_book_title(&title)?;
            patch.insert("title".to_string(), Value::String(title));
        }
        if let Some(author) = self.author {
            validate_author(&author)?;
            patch.insert("author".to_string(), Value::String(author));
        }
        if let Some(description) = self.description {
            patch.insert("description".to_string(), Value::String(description));
        }
        if let Some(price) = self.price_cents {
            validate_price_cents(price)?;
            patch.insert("price_cents".to_string(), Value::from(price));
        }
        if let Some(rent) = self.weekly_rent_cents {
            validate_price_cents(rent)?;
            patch.insert("weekly_rent_cents".to_string(), Value::from(rent));
        }
        if let Some(cover) = self.cover_image {
            patch.insert("cover_image".to_string(), Value::String(cover));
        }
        if let Some(ids) = self.category_ids {
            patch.insert(
                "category_ids".to_string(),
                Value::Array(ids.into_iter().map(Value::String).collect()),
            );
        }
        if let Some(featured) = self.featured {
            patch.insert("featured".to_string(), Value::Bool(featured));
        }
        if let Some(stock) = self.in_stock {
            patch.insert("in_stock".to_string(), Value::from(stock));
        }
        if let Some(rating) = self.rating {
            patch.insert("rating".to_string(), Value::from(rating));
        }

        if patch.is_empty() {
            return Err(ApiError::validation("nothing to update"));
        }
        Ok(Value::Object(patch))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storefront::Storefront;
    use crate::ErrorCode;
    use bookhaven_core::types::Role;

    fn admin() -> User {
        User {
            id: "usr-1".to_string(),
            name: "Admin".to_string(),
            email: "admin@bookhaven.com".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    fn shopper() -> User {
        User {
            id: "usr-2".to_string(),
            name: "Shopper".to_string(),
            email: "shopper@example.com".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn draft(title: &str, price_cents: i64, rent: Option<i64>) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Author".to_string(),
            description: "A fine book about things.".to_string(),
            price_cents,
            weekly_rent_cents: rent,
            cover_image: "/placeholder.svg".to_string(),
            category_ids: vec![],
            featured: false,
            in_stock: 10,
            rating: 4.0,
            publish_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_add_and_list_books() {
        let shop = Storefront::in_memory();
        let books = shop.books();

        books.add_book(&admin(), draft("Dune", 1999, Some(399))).await.unwrap();
        books.add_book(&admin(), draft("Sapiens", 2499, None)).await.unwrap();

        let all = books.list().await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_mutate_catalog() {
        let shop = Storefront::in_memory();
        let books = shop.books();

        let err = books
            .add_book(&shopper(), draft("Dune", 1999, None))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Forbidden);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let shop = Storefront::in_memory();
        let books = shop.books();
        books.add_book(&admin(), draft("The Design of Everyday Things", 2499, None))
            .await
            .unwrap();

        let hits = books.search("everyday").await.unwrap();
        assert_eq!(hits.len(), 1);

        let misses = books.search("cooking").await.unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_book_from_catalog() {
        let shop = Storefront::in_memory();
        let books = shop.books();
        let book = books
            .add_book(&admin(), draft("Dune", 1999, None))
            .await
            .unwrap();

        books.delete_book(&admin(), &book.id).await.unwrap();

        assert!(books.list().await.unwrap().is_empty());
        let err = books.get(&book.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        // Deleting again: already invisible
        let err = books.delete_book(&admin(), &book.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_book_patches_fields() {
        let shop = Storefront::in_memory();
        let books = shop.books();
        let book = books
            .add_book(&admin(), draft("Dune", 1999, Some(399)))
            .await
            .unwrap();

        let patch = BookPatch {
            price_cents: Some(1799),
            featured: Some(true),
            ..BookPatch::default()
        };
        let updated = books.update_book(&admin(), &book.id, patch).await.unwrap();

        assert_eq!(updated.price_cents, 1799);
        assert!(updated.featured);
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.weekly_rent_cents, Some(399));
    }

    #[tokio::test]
    async fn test_by_category_joins_through_category_table() {
        let shop = Storefront::in_memory();
        let books = shop.books();

        let category = books
            .inner
            .store
            .insert(Category {
                id: String::new(),
                name: "Fiction".to_string(),
            })
            .unwrap();

        let mut entry = draft("Dune", 1999, None);
        entry.category_ids = vec![category.id.clone()];
        books.add_book(&admin(), entry).await.unwrap();
        books.add_book(&admin(), draft("Zero to One", 2699, None)).await.unwrap();

        let tagged = books.by_category("Fiction").await.unwrap();
        assert_eq!(tagged.len(), 1);
        assert_eq!(tagged[0].title, "Dune");

        assert!(books.by_category("Cooking").await.unwrap().is_empty());
    }
}
