//! User entity and team roster types.

use super::{ReviewDomainError, TeamName, UserId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A user who may author pull requests and review teammates' work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    user_id: UserId,
    username: String,
    team_name: Option<TeamName>,
    is_active: bool,
}

impl User {
    /// Creates an active user that does not belong to a team yet.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyUsername`] when the username is
    /// blank.
    pub fn new(user_id: UserId, username: impl Into<String>) -> Result<Self, ReviewDomainError> {
        let raw = username.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReviewDomainError::EmptyUsername);
        }
        Ok(Self {
            user_id,
            username: trimmed.to_owned(),
            team_name: None,
            is_active: true,
        })
    }

    /// Sets the user's team.
    #[must_use]
    pub fn with_team(mut self, team_name: TeamName) -> Self {
        self.team_name = Some(team_name);
        self
    }

    /// Sets the user's activity flag.
    #[must_use]
    pub const fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the user identifier.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Returns the display username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the user's team, if assigned.
    #[must_use]
    pub const fn team_name(&self) -> Option<&TeamName> {
        self.team_name.as_ref()
    }

    /// Returns whether the user can be picked as a reviewer.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Updates the activity flag in place.
    pub const fn set_active(&mut self, is_active: bool) {
        self.is_active = is_active;
    }
}

/// Team member as submitted on team creation and returned on team lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// Member identifier.
    pub user_id: UserId,
    /// Member display name.
    pub username: String,
    /// Whether the member is eligible for review assignment.
    pub is_active: bool,
}

impl TeamMember {
    /// Creates a team member.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>, is_active: bool) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_active,
        }
    }
}

impl From<&User> for TeamMember {
    fn from(user: &User) -> Self {
        Self::new(user.user_id.clone(), user.username.clone(), user.is_active)
    }
}

/// A team: the ordered roster of users sharing a team name.
///
/// Teams have no lifecycle of their own. A team exists while at least one
/// user carries its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    team_name: TeamName,
    members: Vec<TeamMember>,
}

impl Team {
    /// Creates a validated team roster with trimmed usernames.
    ///
    /// # Errors
    ///
    /// Returns [`ReviewDomainError::EmptyTeam`] when `members` is empty,
    /// [`ReviewDomainError::EmptyUsername`] when a member has a blank name, or
    /// [`ReviewDomainError::DuplicateTeamMember`] when a user appears twice.
    pub fn new(team_name: TeamName, members: Vec<TeamMember>) -> Result<Self, ReviewDomainError> {
        if members.is_empty() {
            return Err(ReviewDomainError::EmptyTeam);
        }
        let mut seen = HashSet::with_capacity(members.len());
        let mut roster = Vec::with_capacity(members.len());
        for member in members {
            let username = member.username.trim();
            if username.is_empty() {
                return Err(ReviewDomainError::EmptyUsername);
            }
            if !seen.insert(member.user_id.clone()) {
                return Err(ReviewDomainError::DuplicateTeamMember(member.user_id));
            }
            roster.push(TeamMember::new(
                member.user_id,
                username.to_owned(),
                member.is_active,
            ));
        }
        Ok(Self {
            team_name,
            members: roster,
        })
    }

    /// Rebuilds a team from users that already share `team_name`.
    #[must_use]
    pub fn from_users(team_name: TeamName, users: &[User]) -> Self {
        Self {
            team_name,
            members: users.iter().map(TeamMember::from).collect(),
        }
    }

    /// Returns the team name.
    #[must_use]
    pub const fn team_name(&self) -> &TeamName {
        &self.team_name
    }

    /// Returns members in roster order.
    #[must_use]
    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    /// Returns the users to upsert so each member carries this team's name.
    #[must_use]
    pub fn to_users(&self) -> Vec<User> {
        self.members
            .iter()
            .map(|member| User {
                user_id: member.user_id.clone(),
                username: member.username.clone(),
                team_name: Some(self.team_name.clone()),
                is_active: member.is_active,
            })
            .collect()
    }
}
