//! User activity management.

use super::error::ReviewResult;
use crate::review::{
    domain::{User, UserId},
    ports::UserRepository,
};
use std::sync::Arc;
use tracing::info;

/// User orchestration service.
#[derive(Clone)]
pub struct UserService<U>
where
    U: UserRepository,
{
    users: Arc<U>,
}

impl<U> UserService<U>
where
    U: UserRepository,
{
    /// Creates a new user service.
    #[must_use]
    pub const fn new(users: Arc<U>) -> Self {
        Self { users }
    }

    /// Sets a user's activity flag and returns the stored user.
    ///
    /// Deactivation does not touch pull requests the user reviews; replacing
    /// them is an explicit reassignment.
    ///
    /// # Errors
    ///
    /// Returns [`super::ReviewError::NotFound`] when the user does not exist.
    pub async fn set_is_active(&self, user_id: &str, is_active: bool) -> ReviewResult<User> {
        let id = UserId::new(user_id)?;
        self.users.set_active(&id, is_active).await?;
        let user = self.users.get_by_id(&id).await?;
        info!(user_id = %id, is_active, "user activity updated");
        Ok(user)
    }

    /// Loads a user.
    ///
    /// # Errors
    ///
    /// Returns [`super::ReviewError::NotFound`] when the user does not exist.
    pub async fn get_user(&self, user_id: &str) -> ReviewResult<User> {
        let id = UserId::new(user_id)?;
        Ok(self.users.get_by_id(&id).await?)
    }
}
