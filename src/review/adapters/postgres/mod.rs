//! `PostgreSQL` adapters for review persistence.
//!
//! The schema lives in `migrations/`; apply it before constructing a
//! repository.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresReviewRepository, ReviewPgPool, build_pool};
