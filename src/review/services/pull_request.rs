//! Pull request lifecycle: creation with automatic reviewers, merge, and
//! reviewer reassignment.

use super::error::{ReviewError, ReviewResult};
use crate::review::{
    domain::{MAX_REVIEWERS, PullRequest, PullRequestId, PullRequestShort, User, UserId},
    ports::{PullRequestRepository, RepositoryError, UserRepository},
    selection::ReviewerSelector,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Compare-and-swap attempts a merge makes before giving up.
const MERGE_ATTEMPTS: u32 = 3;

/// Request payload for opening a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePullRequestRequest {
    pull_request_id: String,
    pull_request_name: String,
    author_id: String,
}

impl CreatePullRequestRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
        }
    }
}

/// Outcome of a successful reviewer reassignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// Pull request after the swap.
    pub pull_request: PullRequest,
    /// Reviewer that took the outgoing reviewer's slot.
    pub replaced_by: UserId,
}

/// Pull request lifecycle orchestration service.
///
/// Holds no mutable state of its own; all coordination happens through the
/// repositories' atomic writes.
#[derive(Clone)]
pub struct PullRequestService<P, U, S, C>
where
    P: PullRequestRepository,
    U: UserRepository,
    S: ReviewerSelector,
    C: Clock + Send + Sync,
{
    pull_requests: Arc<P>,
    users: Arc<U>,
    selector: Arc<S>,
    clock: Arc<C>,
}

impl<P, U, S, C> PullRequestService<P, U, S, C>
where
    P: PullRequestRepository,
    U: UserRepository,
    S: ReviewerSelector,
    C: Clock + Send + Sync,
{
    /// Creates a new pull request service.
    #[must_use]
    pub const fn new(pull_requests: Arc<P>, users: Arc<U>, selector: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            pull_requests,
            users,
            selector,
            clock,
        }
    }

    /// Opens a pull request and assigns up to two active teammates of the
    /// author as reviewers.
    ///
    /// Fewer than two reviewers is not an error; an author without active
    /// teammates gets none.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::PullRequestExists`] when the identifier is taken
    /// (including a concurrent creation that wins the insert),
    /// [`ReviewError::NotFound`] when the author is unknown, and
    /// [`ReviewError::Invalid`] for malformed input.
    pub async fn create_pull_request(
        &self,
        request: CreatePullRequestRequest,
    ) -> ReviewResult<PullRequest> {
        let CreatePullRequestRequest {
            pull_request_id,
            pull_request_name,
            author_id,
        } = request;
        let id = PullRequestId::new(pull_request_id)?;
        let author = UserId::new(author_id)?;

        if self.pull_requests.exists(&id).await? {
            return Err(ReviewError::PullRequestExists(id));
        }
        let author_user = self.users.get_by_id(&author).await?;

        let candidates: Vec<User> = self
            .teammates_of(&author_user)
            .await?
            .into_iter()
            .filter(|user| user.is_active() && user.user_id() != &author)
            .collect();
        let reviewers = self.selector.select(&candidates, MAX_REVIEWERS);
        debug!(
            pull_request_id = %id,
            candidates = candidates.len(),
            "selected reviewers from author's team"
        );

        let pull_request = PullRequest::open(id, pull_request_name, author, reviewers, &*self.clock)?;
        self.pull_requests.create(&pull_request).await?;

        info!(
            pull_request_id = %pull_request.pull_request_id(),
            author_id = %pull_request.author_id(),
            reviewers = pull_request.assigned_reviewers().len(),
            "pull request created"
        );
        Ok(pull_request)
    }

    /// Merges a pull request.
    ///
    /// Merging an already-merged pull request returns it unchanged. A merge
    /// that loses a race re-reads the row: a concurrent merge is returned as
    /// is, and a concurrent reviewer change is merged on top of.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the pull request is unknown and
    /// a retryable [`ReviewError::Repository`] when storage times out or the
    /// row keeps changing underneath.
    pub async fn merge_pull_request(&self, pull_request_id: &str) -> ReviewResult<PullRequest> {
        let id = PullRequestId::new(pull_request_id)?;
        let mut pull_request = self.pull_requests.get_by_id(&id).await?;
        let mut attempt = 1;

        loop {
            if !pull_request.merge(&*self.clock) {
                debug!(pull_request_id = %id, "pull request already merged");
                return Ok(pull_request);
            }

            match self.pull_requests.update(&pull_request).await {
                Ok(()) => {
                    info!(pull_request_id = %id, "pull request merged");
                    return Ok(pull_request);
                }
                Err(RepositoryError::VersionConflict { .. }) if attempt < MERGE_ATTEMPTS => {
                    debug!(pull_request_id = %id, attempt, "merge raced an update, re-reading");
                    attempt += 1;
                    pull_request = self.pull_requests.get_by_id(&id).await?;
                }
                Err(err) => {
                    if err.is_transient() {
                        warn!(pull_request_id = %id, error = %err, "merge not persisted");
                    }
                    return Err(err.into());
                }
            }
        }
    }

    /// Replaces `old_reviewer_id` with a random active teammate of that
    /// reviewer, keeping the reviewer's slot.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] for an unknown pull request or
    /// reviewer, [`ReviewError::PullRequestMerged`] once merged,
    /// [`ReviewError::NotAssigned`] when the user holds no slot, and
    /// [`ReviewError::NoCandidate`] when nobody can take over. A concurrent
    /// write surfaces as a retryable [`ReviewError::Repository`]. Nothing is
    /// written on error.
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> ReviewResult<Reassignment> {
        let id = PullRequestId::new(pull_request_id)?;
        let old_reviewer = UserId::new(old_reviewer_id)?;
        let mut pull_request = self.pull_requests.get_by_id(&id).await?;

        if pull_request.is_merged() {
            return Err(ReviewError::PullRequestMerged(id));
        }
        if !pull_request.has_reviewer(&old_reviewer) {
            return Err(ReviewError::NotAssigned {
                pull_request_id: id,
                user_id: old_reviewer,
            });
        }
        let outgoing = self.users.get_by_id(&old_reviewer).await?;

        let candidates: Vec<User> = self
            .teammates_of(&outgoing)
            .await?
            .into_iter()
            .filter(|user| {
                user.is_active()
                    && user.user_id() != &old_reviewer
                    && user.user_id() != pull_request.author_id()
                    && !pull_request.has_reviewer(user.user_id())
            })
            .collect();
        debug!(
            pull_request_id = %id,
            candidates = candidates.len(),
            "replacement candidates for reviewer"
        );

        let Some(replacement) = self.selector.select(&candidates, 1).into_iter().next() else {
            return Err(ReviewError::NoCandidate(id));
        };
        pull_request.replace_reviewer(&old_reviewer, replacement.clone())?;

        if let Err(err) = self.pull_requests.update(&pull_request).await {
            if err.is_transient() {
                warn!(pull_request_id = %id, error = %err, "reassignment not persisted");
            }
            return Err(err.into());
        }

        info!(
            pull_request_id = %id,
            old_reviewer = %old_reviewer,
            new_reviewer = %replacement,
            "reviewer reassigned"
        );
        Ok(Reassignment {
            pull_request,
            replaced_by: replacement,
        })
    }

    /// Lists pull requests where the user is an assigned reviewer.
    ///
    /// An unknown user yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::Repository`] when the lookup fails.
    pub async fn get_pull_requests_by_reviewer(
        &self,
        reviewer_id: &str,
    ) -> ReviewResult<Vec<PullRequestShort>> {
        let reviewer = UserId::new(reviewer_id)?;
        let pull_requests = self.pull_requests.get_by_reviewer(&reviewer).await?;
        Ok(pull_requests.iter().map(PullRequest::to_short).collect())
    }

    /// Loads a pull request.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when the pull request is unknown.
    pub async fn get_pull_request(&self, pull_request_id: &str) -> ReviewResult<PullRequest> {
        let id = PullRequestId::new(pull_request_id)?;
        Ok(self.pull_requests.get_by_id(&id).await?)
    }

    /// Returns the user's current team roster, or nobody for a teamless user.
    async fn teammates_of(&self, user: &User) -> ReviewResult<Vec<User>> {
        match user.team_name() {
            Some(team_name) => Ok(self.users.get_by_team(team_name).await?),
            None => Ok(Vec::new()),
        }
    }
}
