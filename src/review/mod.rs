//! Team membership and pull request reviewer assignment.
//!
//! Opening a pull request assigns up to two active teammates of the author as
//! reviewers. An assigned reviewer can later be swapped for another active
//! teammate until the pull request is merged, after which the reviewer list is
//! frozen. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Reviewer selection in [`selection`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod selection;
pub mod services;
