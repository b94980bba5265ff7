//! Diesel row models for review persistence.

use super::schema::{pull_requests, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for user records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// External user identifier.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Team name, if assigned.
    pub team_name: Option<String>,
    /// Activity flag.
    pub is_active: bool,
}

/// Insert model for user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    /// External user identifier.
    pub user_id: String,
    /// Display name.
    pub username: String,
    /// Team name, if assigned.
    pub team_name: Option<String>,
    /// Activity flag.
    pub is_active: bool,
}

/// Query result row for pull request records.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = pull_requests)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PullRequestRow {
    /// External pull request identifier.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub pull_request_id: String,
    /// Display name.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub pull_request_name: String,
    /// Author user identifier.
    #[diesel(sql_type = diesel::sql_types::Text)]
    pub author_id: String,
    /// Lifecycle status.
    #[diesel(sql_type = diesel::sql_types::Varchar)]
    pub status: String,
    /// JSON array of reviewer identifiers.
    #[diesel(sql_type = diesel::sql_types::Jsonb)]
    pub assigned_reviewers: Value,
    /// Optimistic-concurrency version.
    #[diesel(sql_type = diesel::sql_types::Int8)]
    pub version: i64,
    /// Creation timestamp.
    #[diesel(sql_type = diesel::sql_types::Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Merge timestamp.
    #[diesel(sql_type = diesel::sql_types::Nullable<diesel::sql_types::Timestamptz>)]
    pub merged_at: Option<DateTime<Utc>>,
}

/// Insert model for pull request records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = pull_requests)]
pub struct NewPullRequestRow {
    /// External pull request identifier.
    pub pull_request_id: String,
    /// Display name.
    pub pull_request_name: String,
    /// Author user identifier.
    pub author_id: String,
    /// Lifecycle status.
    pub status: String,
    /// JSON array of reviewer identifiers.
    pub assigned_reviewers: Value,
    /// Optimistic-concurrency version.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Merge timestamp.
    pub merged_at: Option<DateTime<Utc>>,
}
