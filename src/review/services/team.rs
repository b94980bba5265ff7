//! Team creation and lookup.

use super::error::{ReviewError, ReviewResult};
use crate::review::{
    domain::{Team, TeamMember, TeamName, UserId},
    ports::TeamRepository,
};
use std::sync::Arc;
use tracing::info;

/// Request payload for one member of a new team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMemberRequest {
    user_id: String,
    username: String,
    is_active: bool,
}

impl TeamMemberRequest {
    /// Creates a member request.
    #[must_use]
    pub fn new(user_id: impl Into<String>, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active,
        }
    }
}

/// Request payload for creating a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTeamRequest {
    team_name: String,
    members: Vec<TeamMemberRequest>,
}

impl CreateTeamRequest {
    /// Creates a request for a team without members.
    #[must_use]
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            members: Vec::new(),
        }
    }

    /// Appends a member to the roster.
    #[must_use]
    pub fn with_member(
        mut self,
        user_id: impl Into<String>,
        username: impl Into<String>,
        is_active: bool,
    ) -> Self {
        self.members
            .push(TeamMemberRequest::new(user_id, username, is_active));
        self
    }

    /// Replaces the roster.
    #[must_use]
    pub fn with_members(mut self, members: impl IntoIterator<Item = TeamMemberRequest>) -> Self {
        self.members = members.into_iter().collect();
        self
    }
}

/// Team orchestration service.
#[derive(Clone)]
pub struct TeamService<T>
where
    T: TeamRepository,
{
    teams: Arc<T>,
}

impl<T> TeamService<T>
where
    T: TeamRepository,
{
    /// Creates a new team service.
    #[must_use]
    pub const fn new(teams: Arc<T>) -> Self {
        Self { teams }
    }

    /// Creates a team and returns the roster as stored.
    ///
    /// Members already in another team move to this one but keep their stored
    /// username and activity flag.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::TeamExists`] when a user already carries the
    /// name and [`ReviewError::Invalid`] for malformed input. Nothing is
    /// written on error.
    pub async fn create_team(&self, request: CreateTeamRequest) -> ReviewResult<Team> {
        let CreateTeamRequest { team_name, members } = request;
        let name = TeamName::new(team_name)?;
        let roster = members
            .into_iter()
            .map(|member| -> ReviewResult<TeamMember> {
                Ok(TeamMember::new(
                    UserId::new(member.user_id)?,
                    member.username,
                    member.is_active,
                ))
            })
            .collect::<ReviewResult<Vec<_>>>()?;
        let team = Team::new(name, roster)?;

        if self.teams.exists(team.team_name()).await? {
            return Err(ReviewError::TeamExists(team.team_name().clone()));
        }
        self.teams.create(&team).await?;
        let stored = self.teams.get_by_name(team.team_name()).await?;

        info!(
            team_name = %stored.team_name(),
            members = stored.members().len(),
            "team created"
        );
        Ok(stored)
    }

    /// Loads a team roster.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewError::NotFound`] when no user carries the name.
    pub async fn get_team(&self, team_name: &str) -> ReviewResult<Team> {
        let name = TeamName::new(team_name)?;
        Ok(self.teams.get_by_name(&name).await?)
    }
}
