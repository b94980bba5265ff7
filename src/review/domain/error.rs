//! Error types for review domain validation and state transitions.

use super::{PullRequestId, UserId};
use thiserror::Error;

/// Errors returned while constructing or mutating review domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReviewDomainError {
    /// The user identifier is empty after trimming.
    #[error("user id must not be empty")]
    EmptyUserId,

    /// The username is empty after trimming.
    #[error("username must not be empty")]
    EmptyUsername,

    /// The team name is empty after trimming.
    #[error("team name must not be empty")]
    EmptyTeamName,

    /// The pull request identifier is empty after trimming.
    #[error("pull request id must not be empty")]
    EmptyPullRequestId,

    /// The pull request name is empty after trimming.
    #[error("pull request name must not be empty")]
    EmptyPullRequestName,

    /// A team was submitted without members.
    #[error("team must have at least one member")]
    EmptyTeam,

    /// The same user appears twice in one team submission.
    #[error("user {0} is listed more than once in the team")]
    DuplicateTeamMember(UserId),

    /// The author was offered as a reviewer of their own pull request.
    #[error("author {0} cannot review their own pull request")]
    AuthorAsReviewer(UserId),

    /// The same reviewer appears twice on one pull request.
    #[error("reviewer {0} is already assigned")]
    DuplicateReviewer(UserId),

    /// More reviewers were offered than a pull request accepts.
    #[error("pull request accepts at most {max} reviewers, got {actual}")]
    TooManyReviewers {
        /// Reviewer limit.
        max: usize,
        /// Offered reviewer count.
        actual: usize,
    },

    /// The pull request is merged and no longer accepts reviewer changes.
    #[error("pull request {0} is merged")]
    AlreadyMerged(PullRequestId),

    /// The user is not among the pull request's assigned reviewers.
    #[error("user {user_id} is not assigned to pull request {pull_request_id}")]
    ReviewerNotAssigned {
        /// Pull request being modified.
        pull_request_id: PullRequestId,
        /// User expected to be a reviewer.
        user_id: UserId,
    },
}

/// Error returned while parsing pull request statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown pull request status: {0}")]
pub struct ParsePullRequestStatusError(pub String);
