//! In-memory adapters for review persistence.

mod store;

pub use store::InMemoryReviewStore;
