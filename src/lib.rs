//! Reviewdesk: pull request reviewer assignment.
//!
//! This crate tracks teams, users, and pull requests, and picks reviewers
//! automatically: a new pull request gets up to two active teammates of its
//! author, and an assigned reviewer can be replaced by another teammate while
//! the pull request is still open.
//!
//! # Architecture
//!
//! Reviewdesk follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`review`]: Teams, users, pull requests, and reviewer assignment
//! - [`config`]: Environment-driven configuration

pub mod config;
pub mod review;
