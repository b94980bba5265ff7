//! In-memory store implementing every review repository port.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::review::{
    domain::{PullRequest, PullRequestId, Team, TeamName, User, UserId},
    ports::{
        PullRequestRepository, RepositoryError, RepositoryResult, TeamRepository, UserRepository,
        expected_stored_version,
    },
};

/// Thread-safe in-memory review store.
///
/// Users, derived teams, and pull requests share one lock so team creation
/// and compare-and-swap updates are atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReviewStore {
    state: Arc<RwLock<InMemoryReviewState>>,
}

#[derive(Debug, Default)]
struct InMemoryReviewState {
    users: HashMap<UserId, User>,
    user_order: Vec<UserId>,
    pull_requests: HashMap<PullRequestId, PullRequest>,
    pull_request_order: Vec<PullRequestId>,
}

impl InMemoryReviewState {
    fn upsert_user(&mut self, user: &User) {
        if self
            .users
            .insert(user.user_id().clone(), user.clone())
            .is_none()
        {
            self.user_order.push(user.user_id().clone());
        }
    }

    /// Moves an existing user into the member's team, keeping the stored
    /// username and activity flag. Unknown users are inserted as given.
    fn join_team(&mut self, member: User) {
        match self.users.get_mut(member.user_id()) {
            Some(existing) => {
                if let Some(team_name) = member.team_name() {
                    *existing = existing.clone().with_team(team_name.clone());
                }
            }
            None => {
                self.user_order.push(member.user_id().clone());
                self.users.insert(member.user_id().clone(), member);
            }
        }
    }

    fn team_exists(&self, team_name: &TeamName) -> bool {
        self.users
            .values()
            .any(|user| user.team_name() == Some(team_name))
    }

    fn users_in_team(&self, team_name: &TeamName) -> Vec<User> {
        self.user_order
            .iter()
            .filter_map(|user_id| self.users.get(user_id))
            .filter(|user| user.team_name() == Some(team_name))
            .cloned()
            .collect()
    }
}

impl InMemoryReviewStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, InMemoryReviewState>> {
        self.state
            .read()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, InMemoryReviewState>> {
        self.state
            .write()
            .map_err(|err| RepositoryError::persistence(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl UserRepository for InMemoryReviewStore {
    async fn create_or_update(&self, user: &User) -> RepositoryResult<()> {
        self.write()?.upsert_user(user);
        Ok(())
    }

    async fn get_by_id(&self, user_id: &UserId) -> RepositoryResult<User> {
        self.read()?
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| RepositoryError::UserNotFound(user_id.clone()))
    }

    async fn get_by_team(&self, team_name: &TeamName) -> RepositoryResult<Vec<User>> {
        Ok(self.read()?.users_in_team(team_name))
    }

    async fn set_active(&self, user_id: &UserId, is_active: bool) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| RepositoryError::UserNotFound(user_id.clone()))?;
        user.set_active(is_active);
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryReviewStore {
    async fn create(&self, team: &Team) -> RepositoryResult<()> {
        let mut state = self.write()?;
        if state.team_exists(team.team_name()) {
            return Err(RepositoryError::DuplicateTeam(team.team_name().clone()));
        }
        for user in team.to_users() {
            state.join_team(user);
        }
        Ok(())
    }

    async fn get_by_name(&self, team_name: &TeamName) -> RepositoryResult<Team> {
        let members = self.read()?.users_in_team(team_name);
        if members.is_empty() {
            return Err(RepositoryError::TeamNotFound(team_name.clone()));
        }
        Ok(Team::from_users(team_name.clone(), &members))
    }

    async fn exists(&self, team_name: &TeamName) -> RepositoryResult<bool> {
        Ok(self.read()?.team_exists(team_name))
    }
}

#[async_trait]
impl PullRequestRepository for InMemoryReviewStore {
    async fn create(&self, pull_request: &PullRequest) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let id = pull_request.pull_request_id();
        if state.pull_requests.contains_key(id) {
            return Err(RepositoryError::DuplicatePullRequest(id.clone()));
        }
        state.pull_requests.insert(id.clone(), pull_request.clone());
        state.pull_request_order.push(id.clone());
        Ok(())
    }

    async fn get_by_id(&self, pull_request_id: &PullRequestId) -> RepositoryResult<PullRequest> {
        self.read()?
            .pull_requests
            .get(pull_request_id)
            .cloned()
            .ok_or_else(|| RepositoryError::PullRequestNotFound(pull_request_id.clone()))
    }

    async fn get_by_reviewer(&self, reviewer_id: &UserId) -> RepositoryResult<Vec<PullRequest>> {
        let state = self.read()?;
        Ok(state
            .pull_request_order
            .iter()
            .filter_map(|id| state.pull_requests.get(id))
            .filter(|pull_request| pull_request.has_reviewer(reviewer_id))
            .cloned()
            .collect())
    }

    async fn update(&self, pull_request: &PullRequest) -> RepositoryResult<()> {
        let mut state = self.write()?;
        let id = pull_request.pull_request_id();
        let stored = state
            .pull_requests
            .get_mut(id)
            .ok_or_else(|| RepositoryError::PullRequestNotFound(id.clone()))?;

        let expected = expected_stored_version(pull_request);
        if expected != Some(stored.version()) {
            return Err(RepositoryError::VersionConflict {
                pull_request_id: id.clone(),
                expected: expected.unwrap_or_default(),
            });
        }
        *stored = pull_request.clone();
        Ok(())
    }

    async fn exists(&self, pull_request_id: &PullRequestId) -> RepositoryResult<bool> {
        Ok(self.read()?.pull_requests.contains_key(pull_request_id))
    }
}
