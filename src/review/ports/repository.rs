//! Repository ports for users, teams, and pull requests.
//!
//! Single-entity lookups fail with a typed not-found error. Every other
//! failure is a storage error the services treat as opaque.

use crate::review::domain::{PullRequest, PullRequestId, Team, TeamName, User, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// User persistence contract.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts the user or overwrites the stored row with the same ID.
    async fn create_or_update(&self, user: &User) -> RepositoryResult<()>;

    /// Loads a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UserNotFound`] when the user does not exist.
    async fn get_by_id(&self, user_id: &UserId) -> RepositoryResult<User>;

    /// Returns every user carrying `team_name`, in roster order.
    async fn get_by_team(&self, team_name: &TeamName) -> RepositoryResult<Vec<User>>;

    /// Updates the activity flag of an existing user.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UserNotFound`] when the user does not exist.
    async fn set_active(&self, user_id: &UserId, is_active: bool) -> RepositoryResult<()>;
}

/// Team persistence contract.
///
/// Teams are derived from user rows; creating a team upserts its members.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Inserts new members and moves existing users into the team.
    ///
    /// Existing users only change team; their stored username and activity
    /// flag are kept. Implementations re-check existence atomically with the
    /// writes.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicateTeam`] when a user already carries
    /// the team name. Nothing is written in that case.
    async fn create(&self, team: &Team) -> RepositoryResult<()>;

    /// Loads a team roster by name.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::TeamNotFound`] when no user carries the name.
    async fn get_by_name(&self, team_name: &TeamName) -> RepositoryResult<Team>;

    /// Returns whether any user carries `team_name`.
    async fn exists(&self, team_name: &TeamName) -> RepositoryResult<bool>;
}

/// Pull request persistence contract.
#[async_trait]
pub trait PullRequestRepository: Send + Sync {
    /// Stores a new pull request.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::DuplicatePullRequest`] when the identifier
    /// is taken, even if an earlier existence check passed.
    async fn create(&self, pull_request: &PullRequest) -> RepositoryResult<()>;

    /// Loads a pull request by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::PullRequestNotFound`] when it does not exist.
    async fn get_by_id(&self, pull_request_id: &PullRequestId) -> RepositoryResult<PullRequest>;

    /// Returns every pull request listing `reviewer_id` as a reviewer.
    async fn get_by_reviewer(&self, reviewer_id: &UserId) -> RepositoryResult<Vec<PullRequest>>;

    /// Persists a mutated pull request with compare-and-swap semantics.
    ///
    /// The write applies only while the stored version is exactly one behind
    /// `pull_request.version()`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::PullRequestNotFound`] when the row is gone
    /// and [`RepositoryError::VersionConflict`] when another writer got there
    /// first.
    async fn update(&self, pull_request: &PullRequest) -> RepositoryResult<()>;

    /// Returns whether the identifier is taken.
    async fn exists(&self, pull_request_id: &PullRequestId) -> RepositoryResult<bool>;
}

/// Returns the stored version an update of `pull_request` must replace.
#[must_use]
pub fn expected_stored_version(pull_request: &PullRequest) -> Option<u64> {
    pull_request.version().checked_sub(1)
}

/// Errors returned by repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No user carries the team name.
    #[error("team not found: {0}")]
    TeamNotFound(TeamName),

    /// The pull request was not found.
    #[error("pull request not found: {0}")]
    PullRequestNotFound(PullRequestId),

    /// A pull request with the same identifier already exists.
    #[error("duplicate pull request identifier: {0}")]
    DuplicatePullRequest(PullRequestId),

    /// A team with the same name already has members.
    #[error("duplicate team name: {0}")]
    DuplicateTeam(TeamName),

    /// The stored pull request changed since it was read.
    #[error("pull request {pull_request_id} changed concurrently (expected version {expected})")]
    VersionConflict {
        /// Pull request being written.
        pull_request_id: PullRequestId,
        /// Version the writer read.
        expected: u64,
    },

    /// A storage call exceeded its time budget.
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether the caller may retry the same operation.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::VersionConflict { .. })
    }
}
