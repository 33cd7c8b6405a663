//! # Seed Data Generator
//!
//! Populates the record store with the starter catalog, categories and
//! the admin account.
//!
//! ## Usage
//! ```bash
//! # Seed into ./data (default)
//! cargo run -p bookhaven-store --bin seed
//!
//! # Specify the data directory
//! BOOKHAVEN_DATA_DIR=/tmp/bookhaven cargo run -p bookhaven-store --bin seed
//! ```
//!
//! Seeding is idempotent at the table level: a store that already holds
//! books is left alone.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use bookhaven_core::types::{Book, Category, Role, User};
use bookhaven_store::{Criteria, FileBackend, RecordStore, Table};

/// One starter catalog entry.
struct SeedBook {
    title: &'static str,
    author: &'static str,
    description: &'static str,
    price_cents: i64,
    weekly_rent_cents: Option<i64>,
    categories: &'static [&'static str],
    rating: f32,
    featured: bool,
    publish_date: (i32, u32, u32),
}

/// The starter catalog.
const SEED_BOOKS: &[SeedBook] = &[
    SeedBook {
        title: "The Design of Everyday Things",
        author: "Don Norman",
        description: "Product design that ignores the needs of users and the principles of cognitive psychology is what makes the smartest among us feel inept, argues this ingenious book.",
        price_cents: 2499,
        weekly_rent_cents: Some(499),
        categories: &["Design", "Technology", "Psychology"],
        rating: 4.5,
        featured: true,
        publish_date: (2013, 11, 5),
    },
    SeedBook {
        title: "Thinking, Fast and Slow",
        author: "Daniel Kahneman",
        description: "A groundbreaking tour of the mind explaining the two systems that drive the way we think.",
        price_cents: 2999,
        weekly_rent_cents: Some(599),
        categories: &["Psychology", "Science", "Non-Fiction"],
        rating: 4.7,
        featured: true,
        publish_date: (2011, 10, 25),
    },
    SeedBook {
        title: "Zero to One",
        author: "Peter Thiel",
        description: "There are still uncharted frontiers to explore and new inventions to create; this book shows how to find singular ways to create those new things.",
        price_cents: 2699,
        weekly_rent_cents: Some(499),
        categories: &["Business", "Technology", "Entrepreneurship"],
        rating: 4.6,
        featured: true,
        publish_date: (2014, 9, 16),
    },
    SeedBook {
        title: "Dune",
        author: "Frank Herbert",
        description: "Set on the desert planet Arrakis, the story of the boy Paul Atreides, heir to a noble family tasked with ruling an inhospitable world.",
        price_cents: 1999,
        weekly_rent_cents: Some(399),
        categories: &["Science Fiction", "Fantasy", "Fiction"],
        rating: 4.8,
        featured: false,
        publish_date: (1965, 8, 1),
    },
    SeedBook {
        title: "The Code Breaker",
        author: "Walter Isaacson",
        description: "A gripping account of how Jennifer Doudna and her colleagues launched a revolution in gene editing.",
        price_cents: 3599,
        weekly_rent_cents: Some(699),
        categories: &["Biography", "Science", "Technology"],
        rating: 4.6,
        featured: false,
        publish_date: (2021, 3, 9),
    },
    SeedBook {
        title: "Atomic Habits",
        author: "James Clear",
        description: "A proven framework for improving every day: form good habits, break bad ones, and master the tiny behaviors that lead to remarkable results.",
        price_cents: 2799,
        weekly_rent_cents: Some(499),
        categories: &["Self-Help", "Psychology", "Non-Fiction"],
        rating: 4.9,
        featured: true,
        publish_date: (2018, 10, 16),
    },
    SeedBook {
        title: "Sapiens: A Brief History of Humankind",
        author: "Yuval Noah Harari",
        description: "The whole of human history, from the very first humans to walk the earth to the breakthroughs of the Cognitive, Agricultural, and Scientific Revolutions.",
        price_cents: 2499,
        weekly_rent_cents: Some(499),
        categories: &["History", "Science", "Non-Fiction"],
        rating: 4.7,
        featured: true,
        publish_date: (2014, 2, 10),
    },
    SeedBook {
        title: "The Alchemist",
        author: "Paulo Coelho",
        description: "Combining magic, mysticism, wisdom, and wonder into an inspiring tale of self-discovery.",
        price_cents: 1799,
        weekly_rent_cents: Some(349),
        categories: &["Fiction", "Philosophy", "Fantasy"],
        rating: 4.8,
        featured: false,
        publish_date: (1988, 1, 1),
    },
];

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let data_dir =
        std::env::var("BOOKHAVEN_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

    let backend = match FileBackend::new(&data_dir) {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            eprintln!("cannot open data directory {}: {}", data_dir, e);
            std::process::exit(1);
        }
    };
    let store = RecordStore::open(backend);

    if store.count(Table::Books) > 0 {
        println!(
            "Store at {} already holds {} books, nothing to do",
            data_dir,
            store.count(Table::Books)
        );
        return;
    }

    info!(data_dir = %data_dir, "seeding store");
    let now = Utc::now();

    // Admin account
    if let Err(e) = store.insert(User {
        id: String::new(),
        name: "Admin User".to_string(),
        email: "admin@bookhaven.com".to_string(),
        role: Role::Admin,
        created_at: now,
    }) {
        eprintln!("failed to seed admin user: {}", e);
        std::process::exit(1);
    }

    // Categories: the union of every category named by the seed catalog
    let names: BTreeSet<&str> = SEED_BOOKS
        .iter()
        .flat_map(|b| b.categories.iter().copied())
        .collect();

    let mut category_ids = std::collections::HashMap::new();
    for name in names {
        match store.insert(Category {
            id: String::new(),
            name: name.to_string(),
        }) {
            Ok(category) => {
                category_ids.insert(name, category.id);
            }
            Err(e) => {
                eprintln!("failed to seed category {}: {}", name, e);
                std::process::exit(1);
            }
        }
    }

    // Books
    for seed in SEED_BOOKS {
        let (y, m, d) = seed.publish_date;
        let publish_date = NaiveDate::from_ymd_opt(y, m, d).expect("valid seed date");
        let book = Book {
            id: String::new(),
            title: seed.title.to_string(),
            author: seed.author.to_string(),
            description: seed.description.to_string(),
            price_cents: seed.price_cents,
            weekly_rent_cents: seed.weekly_rent_cents,
            cover_image: "/placeholder.svg".to_string(),
            category_ids: seed
                .categories
                .iter()
                .filter_map(|name| category_ids.get(name).cloned())
                .collect(),
            featured: seed.featured,
            in_stock: 10,
            rating: seed.rating,
            publish_date,
            active: true,
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = store.insert(book) {
            eprintln!("failed to seed book {}: {}", seed.title, e);
            std::process::exit(1);
        }
    }

    let featured = store
        .select_rows(Table::Books, &Criteria::eq("featured", true))
        .len();

    println!("Seeded {} into:", data_dir);
    println!("  {:>3} users", store.count(Table::Users));
    println!("  {:>3} categories", store.count(Table::BookCategories));
    println!(
        "  {:>3} books ({} featured)",
        store.count(Table::Books),
        featured
    );
}
