//! Pull request aggregate root and its review lifecycle.

use super::{ParsePullRequestStatusError, PullRequestId, ReviewDomainError, UserId};
use chrono::{DateTime, SubsecRound, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Maximum number of reviewers assigned to a pull request.
pub const MAX_REVIEWERS: usize = 2;

/// Pull request lifecycle status.
///
/// `Open` may move to `Merged`; `Merged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullRequestStatus {
    /// Awaiting review; reviewers may be swapped.
    Open,
    /// Merged; reviewers, author, and name are frozen.
    Merged,
}

impl PullRequestStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Merged => "MERGED",
        }
    }

    /// Returns whether no further reviewer mutation is permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Merged)
    }
}

impl TryFrom<&str> for PullRequestStatus {
    type Error = ParsePullRequestStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "MERGED" => Ok(Self::Merged),
            _ => Err(ParsePullRequestStatusError(value.to_owned())),
        }
    }
}

/// Pull request aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pull_request_id: PullRequestId,
    pull_request_name: String,
    author_id: UserId,
    status: PullRequestStatus,
    assigned_reviewers: Vec<UserId>,
    created_at: DateTime<Utc>,
    merged_at: Option<DateTime<Utc>>,
    version: u64,
}

/// Parameter object for reconstructing a persisted pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedPullRequestData {
    /// Persisted identifier.
    pub pull_request_id: PullRequestId,
    /// Persisted display name.
    pub pull_request_name: String,
    /// Persisted author.
    pub author_id: UserId,
    /// Persisted lifecycle status.
    pub status: PullRequestStatus,
    /// Persisted reviewers in slot order.
    pub assigned_reviewers: Vec<UserId>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted merge timestamp, if merged.
    pub merged_at: Option<DateTime<Utc>>,
    /// Persisted optimistic-concurrency version.
    pub version: u64,
}

impl PullRequest {
    /// Opens a new pull request with the given reviewers.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError`] when the name is blank or the reviewer
    /// list includes the author, repeats a user, or exceeds
    /// [`MAX_REVIEWERS`].
    pub fn open(
        pull_request_id: PullRequestId,
        pull_request_name: impl Into<String>,
        author_id: UserId,
        assigned_reviewers: Vec<UserId>,
        clock: &impl Clock,
    ) -> Result<Self, ReviewDomainError> {
        let raw_name = pull_request_name.into();
        let name = raw_name.trim();
        if name.is_empty() {
            return Err(ReviewDomainError::EmptyPullRequestName);
        }
        validate_reviewers(&author_id, &assigned_reviewers)?;

        Ok(Self {
            pull_request_id,
            pull_request_name: name.to_owned(),
            author_id,
            status: PullRequestStatus::Open,
            assigned_reviewers,
            created_at: now(clock),
            merged_at: None,
            version: 0,
        })
    }

    /// Reconstructs a pull request from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedPullRequestData) -> Self {
        Self {
            pull_request_id: data.pull_request_id,
            pull_request_name: data.pull_request_name,
            author_id: data.author_id,
            status: data.status,
            assigned_reviewers: data.assigned_reviewers,
            created_at: data.created_at,
            merged_at: data.merged_at,
            version: data.version,
        }
    }

    /// Returns the pull request identifier.
    #[must_use]
    pub const fn pull_request_id(&self) -> &PullRequestId {
        &self.pull_request_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn pull_request_name(&self) -> &str {
        &self.pull_request_name
    }

    /// Returns the author.
    #[must_use]
    pub const fn author_id(&self) -> &UserId {
        &self.author_id
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> PullRequestStatus {
        self.status
    }

    /// Returns whether the pull request is merged.
    #[must_use]
    pub const fn is_merged(&self) -> bool {
        self.status.is_terminal()
    }

    /// Returns assigned reviewers in slot order.
    #[must_use]
    pub fn assigned_reviewers(&self) -> &[UserId] {
        &self.assigned_reviewers
    }

    /// Returns whether `user_id` is an assigned reviewer.
    #[must_use]
    pub fn has_reviewer(&self, user_id: &UserId) -> bool {
        self.assigned_reviewers.contains(user_id)
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the merge timestamp, if merged.
    #[must_use]
    pub const fn merged_at(&self) -> Option<DateTime<Utc>> {
        self.merged_at
    }

    /// Returns the optimistic-concurrency version.
    ///
    /// Starts at zero and advances by one on every mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Merges the pull request.
    ///
    /// Returns `false` without touching any field when the pull request is
    /// already merged.
    pub fn merge(&mut self, clock: &impl Clock) -> bool {
        if self.is_merged() {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(now(clock));
        self.version += 1;
        true
    }

    /// Replaces `old_reviewer` with `new_reviewer`, keeping its slot.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::AlreadyMerged`] on a merged pull request,
    /// [`ReviewDomainError::ReviewerNotAssigned`] when `old_reviewer` holds no
    /// slot, and [`ReviewDomainError::AuthorAsReviewer`] or
    /// [`ReviewDomainError::DuplicateReviewer`] when `new_reviewer` is not
    /// eligible. The pull request is unchanged on error.
    pub fn replace_reviewer(
        &mut self,
        old_reviewer: &UserId,
        new_reviewer: UserId,
    ) -> Result<(), ReviewDomainError> {
        if self.is_merged() {
            return Err(ReviewDomainError::AlreadyMerged(
                self.pull_request_id.clone(),
            ));
        }
        let Some(slot) = self
            .assigned_reviewers
            .iter()
            .position(|reviewer| reviewer == old_reviewer)
        else {
            return Err(ReviewDomainError::ReviewerNotAssigned {
                pull_request_id: self.pull_request_id.clone(),
                user_id: old_reviewer.clone(),
            });
        };
        if new_reviewer == self.author_id {
            return Err(ReviewDomainError::AuthorAsReviewer(new_reviewer));
        }
        if self.has_reviewer(&new_reviewer) {
            return Err(ReviewDomainError::DuplicateReviewer(new_reviewer));
        }

        if let Some(current) = self.assigned_reviewers.get_mut(slot) {
            *current = new_reviewer;
        }
        self.version += 1;
        Ok(())
    }

    /// Returns the reduced view used in reviewer listings.
    #[must_use]
    pub fn to_short(&self) -> PullRequestShort {
        PullRequestShort {
            pull_request_id: self.pull_request_id.clone(),
            pull_request_name: self.pull_request_name.clone(),
            author_id: self.author_id.clone(),
            status: self.status,
        }
    }
}

/// Current time at the microsecond precision storage keeps.
fn now(clock: &impl Clock) -> DateTime<Utc> {
    clock.utc().trunc_subsecs(6)
}

fn validate_reviewers(author_id: &UserId, reviewers: &[UserId]) -> Result<(), ReviewDomainError> {
    if reviewers.len() > MAX_REVIEWERS {
        return Err(ReviewDomainError::TooManyReviewers {
            max: MAX_REVIEWERS,
            actual: reviewers.len(),
        });
    }
    let mut seen = HashSet::with_capacity(reviewers.len());
    for reviewer in reviewers {
        if reviewer == author_id {
            return Err(ReviewDomainError::AuthorAsReviewer(reviewer.clone()));
        }
        if !seen.insert(reviewer) {
            return Err(ReviewDomainError::DuplicateReviewer(reviewer.clone()));
        }
    }
    Ok(())
}

/// Reduced pull request view without the reviewer list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestShort {
    /// Pull request identifier.
    pub pull_request_id: PullRequestId,
    /// Display name.
    pub pull_request_name: String,
    /// Author.
    pub author_id: UserId,
    /// Lifecycle status.
    pub status: PullRequestStatus,
}
