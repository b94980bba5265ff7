//! Service-level error taxonomy for review operations.

use crate::review::{
    domain::{PullRequestId, ReviewDomainError, TeamName, UserId},
    ports::RepositoryError,
};
use std::fmt;
use thiserror::Error;

/// Entity a lookup failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundTarget {
    /// Unknown user.
    User(UserId),
    /// Unknown team.
    Team(TeamName),
    /// Unknown pull request.
    PullRequest(PullRequestId),
}

impl fmt::Display for NotFoundTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user {id}"),
            Self::Team(name) => write!(f, "team {name}"),
            Self::PullRequest(id) => write!(f, "pull request {id}"),
        }
    }
}

/// Errors returned by review services.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// A user already carries the team name.
    #[error("team {0} already exists")]
    TeamExists(TeamName),

    /// The pull request identifier is taken.
    #[error("pull request {0} already exists")]
    PullRequestExists(PullRequestId),

    /// The pull request is merged and rejects reviewer changes.
    #[error("cannot reassign on merged pull request {0}")]
    PullRequestMerged(PullRequestId),

    /// The user is not a reviewer of the pull request.
    #[error("reviewer {user_id} is not assigned to pull request {pull_request_id}")]
    NotAssigned {
        /// Pull request being modified.
        pull_request_id: PullRequestId,
        /// User expected to be a reviewer.
        user_id: UserId,
    },

    /// No active teammate can replace the outgoing reviewer.
    #[error("no active replacement candidate for pull request {0}")]
    NoCandidate(PullRequestId),

    /// A referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(NotFoundTarget),

    /// Input failed domain validation.
    #[error(transparent)]
    Invalid(ReviewDomainError),

    /// Storage failed for a reason with no domain meaning.
    #[error(transparent)]
    Repository(RepositoryError),
}

/// Result type for review service operations.
pub type ReviewResult<T> = Result<T, ReviewError>;

impl From<ReviewDomainError> for ReviewError {
    fn from(err: ReviewDomainError) -> Self {
        match err {
            ReviewDomainError::AlreadyMerged(id) => Self::PullRequestMerged(id),
            ReviewDomainError::ReviewerNotAssigned {
                pull_request_id,
                user_id,
            } => Self::NotAssigned {
                pull_request_id,
                user_id,
            },
            other => Self::Invalid(other),
        }
    }
}

impl From<RepositoryError> for ReviewError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UserNotFound(id) => Self::NotFound(NotFoundTarget::User(id)),
            RepositoryError::TeamNotFound(name) => Self::NotFound(NotFoundTarget::Team(name)),
            RepositoryError::PullRequestNotFound(id) => {
                Self::NotFound(NotFoundTarget::PullRequest(id))
            }
            RepositoryError::DuplicatePullRequest(id) => Self::PullRequestExists(id),
            RepositoryError::DuplicateTeam(name) => Self::TeamExists(name),
            other => Self::Repository(other),
        }
    }
}

impl ReviewError {
    /// Returns the stable error kind reported to callers.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TeamExists(_) => ErrorKind::TeamExists,
            Self::PullRequestExists(_) => ErrorKind::PullRequestExists,
            Self::PullRequestMerged(_) => ErrorKind::PullRequestMerged,
            Self::NotAssigned { .. } => ErrorKind::NotAssigned,
            Self::NoCandidate(_) => ErrorKind::NoCandidate,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Invalid(_) => ErrorKind::InvalidInput,
            Self::Repository(_) => ErrorKind::Internal,
        }
    }

    /// Returns whether repeating the call may succeed.
    ///
    /// Only storage timeouts and concurrent-modification conflicts qualify.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Repository(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns the `(kind, message)` pair handed to transport adapters.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.kind(),
            message: self.to_string(),
        }
    }
}

/// Stable classification of review errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate team creation.
    TeamExists,
    /// Duplicate pull request identifier.
    PullRequestExists,
    /// Mutation attempted on a merged pull request.
    PullRequestMerged,
    /// Reassignment target is not a current reviewer.
    NotAssigned,
    /// No eligible replacement reviewer.
    NoCandidate,
    /// User, team, or pull request lookup miss.
    NotFound,
    /// Malformed input.
    InvalidInput,
    /// Storage failure without domain meaning.
    Internal,
}

impl ErrorKind {
    /// Returns the wire code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TeamExists => "TEAM_EXISTS",
            Self::PullRequestExists => "PR_EXISTS",
            Self::PullRequestMerged => "PR_MERGED",
            Self::NotAssigned => "NOT_ASSIGNED",
            Self::NoCandidate => "NO_CANDIDATE",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::Internal => "INTERNAL",
        }
    }

    /// Returns the HTTP status a transport adapter should answer with.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::TeamExists
            | Self::PullRequestExists
            | Self::PullRequestMerged
            | Self::NotAssigned
            | Self::NoCandidate => 409,
            Self::InvalidInput => 400,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error pair for transport adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Error kind.
    pub code: ErrorKind,
    /// Human-readable message.
    pub message: String,
}
