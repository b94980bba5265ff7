//! Domain model for teams, users, and pull request review.
//!
//! The review domain keeps reviewer invariants (no self-review, no repeated
//! reviewers, frozen merged pull requests) inside the aggregate so every
//! adapter and service sees the same rules.

mod error;
mod ids;
mod pull_request;
mod user;

pub use error::{ParsePullRequestStatusError, ReviewDomainError};
pub use ids::{PullRequestId, TeamName, UserId};
pub use pull_request::{
    MAX_REVIEWERS, PersistedPullRequestData, PullRequest, PullRequestShort, PullRequestStatus,
};
pub use user::{Team, TeamMember, User};
