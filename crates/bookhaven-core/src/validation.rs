//! # Validation Module
//!
//! Input validation utilities for BookHaven.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront UI (TypeScript)                                   │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback, clamping quantity inputs to ≥ 1          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Domain API (Rust)                                            │
//! │  └── THIS MODULE: the checks that actually gate mutations - a          │
//! │      rejected input is never partially applied                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bookhaven_core::validation::{validate_email, validate_quantity};
//!
//! validate_email("john@example.com").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::ShippingAddress;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_RENTAL_DAYS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 254 characters
/// - Must contain exactly one `@` with a dotted domain after it
///
/// ## Example
/// ```rust
/// use bookhaven_core::validation::validate_email;
///
/// assert!(validate_email("john@example.com").is_ok());
/// assert!(validate_email("not-an-email").is_err());
/// assert!(validate_email("two@@example.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => {
            return Err(ValidationError::InvalidFormat {
                field: "email".to_string(),
                reason: "must contain a single @".to_string(),
            })
        }
    };

    if local.is_empty() || domain.is_empty() || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates a person's display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 100 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 100,
        });
    }

    Ok(())
}

/// Validates a book title.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 255 characters
///
/// ## Example
/// ```rust
/// use bookhaven_core::validation::validate_book_title;
///
/// assert!(validate_book_title("The Design of Everyday Things").is_ok());
/// assert!(validate_book_title("").is_err());
/// ```
pub fn validate_book_title(title: &str) -> ValidationResult<()> {
    let title = title.trim();

    if title.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    if title.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: 255,
        });
    }

    Ok(())
}

/// Validates an author name. Same rules as a display name, reported
/// against the `author` field.
pub fn validate_author(author: &str) -> ValidationResult<()> {
    let author = author.trim();

    if author.is_empty() {
        return Err(ValidationError::Required {
            field: "author".to_string(),
        });
    }

    if author.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "author".to_string(),
            max: 255,
        });
    }

    Ok(())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Credential Validators
// =============================================================================

/// Validates a password at registration.
///
/// ## Rules
/// - Must be at least 6 characters
/// - Must be at most 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 6 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 6,
        });
    }

    if password.len() > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates that the confirmation field repeats the password exactly.
///
/// ## Example
/// ```rust
/// use bookhaven_core::validation::validate_password_confirmation;
///
/// assert!(validate_password_confirmation("hunter22", "hunter22").is_ok());
/// assert!(validate_password_confirmation("hunter22", "hunter2").is_err());
/// ```
pub fn validate_password_confirmation(password: &str, confirm: &str) -> ValidationResult<()> {
    if password != confirm {
        return Err(ValidationError::Mismatch {
            field: "confirm password".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart line quantity.
///
/// ## Rules
/// - Must be positive (> 0); the UI clamps to 1 before calling, but the
///   API still rejects anything below that
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a rental duration in days.
///
/// ## Rules
/// - Must be between 1 and MAX_RENTAL_DAYS
pub fn validate_rental_days(days: u32) -> ValidationResult<()> {
    if days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "rental days".to_string(),
        });
    }

    if days > MAX_RENTAL_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "rental days".to_string(),
            min: 1,
            max: MAX_RENTAL_DAYS as i64,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use bookhaven_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(2499).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct lines) before adding another.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a shipping address: every field is required.
///
/// Checked as a whole before checkout so a rejected address leaves no
/// partial order behind.
pub fn validate_shipping_address(address: &ShippingAddress) -> ValidationResult<()> {
    let fields = [
        ("street", &address.street),
        ("city", &address.city),
        ("state", &address.state),
        ("zip code", &address.zip_code),
        ("country", &address.country),
    ];

    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(ValidationError::Required {
                field: name.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
