//! Port contracts for review persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by review services.

pub mod repository;

pub use repository::{
    PullRequestRepository, RepositoryError, RepositoryResult, TeamRepository, UserRepository,
    expected_stored_version,
};
