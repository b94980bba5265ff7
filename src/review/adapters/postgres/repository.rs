//! `PostgreSQL` repository implementation for review storage.

use super::{
    models::{NewPullRequestRow, NewUserRow, PullRequestRow, UserRow},
    schema::{pull_requests, users},
};
use crate::config::{DEFAULT_STORAGE_TIMEOUT, ReviewdeskConfig};
use crate::review::{
    domain::{
        PersistedPullRequestData, PullRequest, PullRequestId, PullRequestStatus, Team, TeamName,
        User, UserId,
    },
    ports::{
        PullRequestRepository, RepositoryError, RepositoryResult, TeamRepository, UserRepository,
        expected_stored_version,
    },
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::upsert::excluded;
use std::time::Duration;
use tracing::warn;

/// `PostgreSQL` connection pool type used by review adapters.
pub type ReviewPgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool from service configuration.
///
/// # Errors
///
/// Returns [`RepositoryError::Persistence`] when the pool cannot open its
/// initial connections.
pub fn build_pool(config: &ReviewdeskConfig) -> RepositoryResult<ReviewPgPool> {
    let manager = ConnectionManager::<PgConnection>::new(config.database.database_url());
    Pool::builder()
        .max_size(config.database.pool_size)
        .connection_timeout(config.storage_timeout)
        .build(manager)
        .map_err(RepositoryError::persistence)
}

/// `PostgreSQL`-backed review repository.
///
/// Implements the user, team, and pull request ports over one pool.
#[derive(Debug, Clone)]
pub struct PostgresReviewRepository {
    pool: ReviewPgPool,
    storage_timeout: Duration,
}

impl PostgresReviewRepository {
    /// Creates a repository with the default per-call storage timeout.
    #[must_use]
    pub const fn new(pool: ReviewPgPool) -> Self {
        Self {
            pool,
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }

    /// Creates a repository and its pool from service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Persistence`] when the pool cannot be built.
    pub fn connect(config: &ReviewdeskConfig) -> RepositoryResult<Self> {
        Ok(Self::new(build_pool(config)?).with_storage_timeout(config.storage_timeout))
    }

    /// Overrides the per-call storage timeout.
    #[must_use]
    pub const fn with_storage_timeout(mut self, storage_timeout: Duration) -> Self {
        self.storage_timeout = storage_timeout;
        self
    }

    /// Runs a blocking Diesel operation on the blocking pool, bounded by the
    /// storage timeout.
    ///
    /// A timed-out call may still commit in the background; callers observe
    /// [`RepositoryError::Timeout`] and decide whether to retry.
    async fn run_blocking<F, T>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        let task = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RepositoryError::persistence)?;
            f(&mut connection)
        });
        match tokio::time::timeout(self.storage_timeout, task).await {
            Ok(joined) => joined.map_err(RepositoryError::persistence)?,
            Err(_) => {
                warn!(timeout = ?self.storage_timeout, "storage call timed out");
                Err(RepositoryError::Timeout(self.storage_timeout))
            }
        }
    }
}

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl UserRepository for PostgresReviewRepository {
    async fn create_or_update(&self, user: &User) -> RepositoryResult<()> {
        let row = to_new_user_row(user);
        self.run_blocking(move |connection| {
            upsert_users(connection, &[row])?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, user_id: &UserId) -> RepositoryResult<User> {
        let lookup = user_id.clone();
        self.run_blocking(move |connection| {
            let row = users::table
                .filter(users::user_id.eq(lookup.as_str()))
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?;
            row.map(row_to_user)
                .transpose()?
                .ok_or(RepositoryError::UserNotFound(lookup))
        })
        .await
    }

    async fn get_by_team(&self, team_name: &TeamName) -> RepositoryResult<Vec<User>> {
        let lookup = team_name.clone();
        self.run_blocking(move |connection| load_team_users(connection, &lookup))
            .await
    }

    async fn set_active(&self, user_id: &UserId, is_active: bool) -> RepositoryResult<()> {
        let lookup = user_id.clone();
        self.run_blocking(move |connection| {
            let updated = diesel::update(users::table.filter(users::user_id.eq(lookup.as_str())))
                .set(users::is_active.eq(is_active))
                .execute(connection)?;
            if updated == 0 {
                return Err(RepositoryError::UserNotFound(lookup));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TeamRepository for PostgresReviewRepository {
    async fn create(&self, team: &Team) -> RepositoryResult<()> {
        let team_name = team.team_name().clone();
        let rows: Vec<NewUserRow> = team.to_users().iter().map(to_new_user_row).collect();
        self.run_blocking(move |connection| {
            connection.transaction::<_, RepositoryError, _>(|tx| {
                // Serialises concurrent creations of the same team name; the
                // lock is released on commit or rollback.
                diesel::sql_query("SELECT pg_advisory_xact_lock(hashtext($1))")
                    .bind::<diesel::sql_types::Text, _>(team_name.as_str())
                    .execute(tx)?;
                if team_exists(tx, &team_name)? {
                    return Err(RepositoryError::DuplicateTeam(team_name.clone()));
                }
                join_team(tx, &rows)?;
                Ok(())
            })
        })
        .await
    }

    async fn get_by_name(&self, team_name: &TeamName) -> RepositoryResult<Team> {
        let lookup = team_name.clone();
        self.run_blocking(move |connection| {
            let members = load_team_users(connection, &lookup)?;
            if members.is_empty() {
                return Err(RepositoryError::TeamNotFound(lookup));
            }
            Ok(Team::from_users(lookup, &members))
        })
        .await
    }

    async fn exists(&self, team_name: &TeamName) -> RepositoryResult<bool> {
        let lookup = team_name.clone();
        self.run_blocking(move |connection| team_exists(connection, &lookup))
            .await
    }
}

#[async_trait]
impl PullRequestRepository for PostgresReviewRepository {
    async fn create(&self, pull_request: &PullRequest) -> RepositoryResult<()> {
        let pull_request_id = pull_request.pull_request_id().clone();
        let author_id = pull_request.author_id().clone();
        let new_row = to_new_pull_request_row(pull_request)?;

        self.run_blocking(move |connection| {
            // The primary key is the backstop for concurrent creations that
            // both passed the service's existence check.
            diesel::insert_into(pull_requests::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        RepositoryError::DuplicatePullRequest(pull_request_id.clone())
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        RepositoryError::UserNotFound(author_id.clone())
                    }
                    _ => RepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn get_by_id(&self, pull_request_id: &PullRequestId) -> RepositoryResult<PullRequest> {
        let lookup = pull_request_id.clone();
        self.run_blocking(move |connection| {
            let row = pull_requests::table
                .filter(pull_requests::pull_request_id.eq(lookup.as_str()))
                .select(PullRequestRow::as_select())
                .first::<PullRequestRow>(connection)
                .optional()?;
            row.map(row_to_pull_request)
                .transpose()?
                .ok_or(RepositoryError::PullRequestNotFound(lookup))
        })
        .await
    }

    async fn get_by_reviewer(&self, reviewer_id: &UserId) -> RepositoryResult<Vec<PullRequest>> {
        let lookup = reviewer_id.clone();
        self.run_blocking(move |connection| {
            let rows = diesel::sql_query(concat!(
                "SELECT pull_request_id, pull_request_name, author_id, status, ",
                "assigned_reviewers, version, created_at, merged_at ",
                "FROM pull_requests ",
                "WHERE assigned_reviewers @> jsonb_build_array($1::text) ",
                "ORDER BY created_seq",
            ))
            .bind::<diesel::sql_types::Text, _>(lookup.as_str())
            .load::<PullRequestRow>(connection)?;
            rows.into_iter().map(row_to_pull_request).collect()
        })
        .await
    }

    async fn update(&self, pull_request: &PullRequest) -> RepositoryResult<()> {
        let pull_request_id = pull_request.pull_request_id().clone();
        let expected = expected_stored_version(pull_request).ok_or_else(|| {
            RepositoryError::VersionConflict {
                pull_request_id: pull_request_id.clone(),
                expected: 0,
            }
        })?;
        let row = to_new_pull_request_row(pull_request)?;
        let expected_db = to_db_version(expected)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                pull_requests::table
                    .filter(pull_requests::pull_request_id.eq(pull_request_id.as_str()))
                    .filter(pull_requests::version.eq(expected_db)),
            )
            .set((
                pull_requests::pull_request_name.eq(&row.pull_request_name),
                pull_requests::author_id.eq(&row.author_id),
                pull_requests::status.eq(&row.status),
                pull_requests::assigned_reviewers.eq(&row.assigned_reviewers),
                pull_requests::version.eq(row.version),
                pull_requests::merged_at.eq(row.merged_at),
            ))
            .execute(connection)?;
            if updated > 0 {
                return Ok(());
            }
            if pull_request_exists(connection, &pull_request_id)? {
                Err(RepositoryError::VersionConflict {
                    pull_request_id,
                    expected,
                })
            } else {
                Err(RepositoryError::PullRequestNotFound(pull_request_id))
            }
        })
        .await
    }

    async fn exists(&self, pull_request_id: &PullRequestId) -> RepositoryResult<bool> {
        let lookup = pull_request_id.clone();
        self.run_blocking(move |connection| pull_request_exists(connection, &lookup))
            .await
    }
}

fn upsert_users(connection: &mut PgConnection, rows: &[NewUserRow]) -> RepositoryResult<()> {
    diesel::insert_into(users::table)
        .values(rows)
        .on_conflict(users::user_id)
        .do_update()
        .set((
            users::username.eq(excluded(users::username)),
            users::team_name.eq(excluded(users::team_name)),
            users::is_active.eq(excluded(users::is_active)),
        ))
        .execute(connection)?;
    Ok(())
}

/// Inserts new members and moves existing users into the team. Stored
/// usernames and activity flags of existing users are kept.
fn join_team(connection: &mut PgConnection, rows: &[NewUserRow]) -> RepositoryResult<()> {
    diesel::insert_into(users::table)
        .values(rows)
        .on_conflict(users::user_id)
        .do_update()
        .set(users::team_name.eq(excluded(users::team_name)))
        .execute(connection)?;
    Ok(())
}

fn load_team_users(
    connection: &mut PgConnection,
    team_name: &TeamName,
) -> RepositoryResult<Vec<User>> {
    users::table
        .filter(users::team_name.eq(team_name.as_str()))
        .order(users::roster_seq.asc())
        .select(UserRow::as_select())
        .load::<UserRow>(connection)?
        .into_iter()
        .map(row_to_user)
        .collect()
}

fn team_exists(connection: &mut PgConnection, team_name: &TeamName) -> RepositoryResult<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        users::table.filter(users::team_name.eq(team_name.as_str())),
    ))
    .get_result::<bool>(connection)?;
    Ok(exists)
}

fn pull_request_exists(
    connection: &mut PgConnection,
    pull_request_id: &PullRequestId,
) -> RepositoryResult<bool> {
    let exists = diesel::select(diesel::dsl::exists(
        pull_requests::table.filter(pull_requests::pull_request_id.eq(pull_request_id.as_str())),
    ))
    .get_result::<bool>(connection)?;
    Ok(exists)
}

fn to_new_user_row(user: &User) -> NewUserRow {
    NewUserRow {
        user_id: user.user_id().as_str().to_owned(),
        username: user.username().to_owned(),
        team_name: user.team_name().map(|name| name.as_str().to_owned()),
        is_active: user.is_active(),
    }
}

fn row_to_user(row: UserRow) -> RepositoryResult<User> {
    let UserRow {
        user_id,
        username,
        team_name,
        is_active,
    } = row;
    let mut user = User::new(
        UserId::new(user_id).map_err(RepositoryError::persistence)?,
        username,
    )
    .map_err(RepositoryError::persistence)?
    .with_active(is_active);
    if let Some(name) = team_name {
        user = user.with_team(TeamName::new(name).map_err(RepositoryError::persistence)?);
    }
    Ok(user)
}

fn to_db_version(version: u64) -> RepositoryResult<i64> {
    i64::try_from(version).map_err(RepositoryError::persistence)
}

fn to_new_pull_request_row(pull_request: &PullRequest) -> RepositoryResult<NewPullRequestRow> {
    let assigned_reviewers = serde_json::to_value(pull_request.assigned_reviewers())
        .map_err(RepositoryError::persistence)?;
    Ok(NewPullRequestRow {
        pull_request_id: pull_request.pull_request_id().as_str().to_owned(),
        pull_request_name: pull_request.pull_request_name().to_owned(),
        author_id: pull_request.author_id().as_str().to_owned(),
        status: pull_request.status().as_str().to_owned(),
        assigned_reviewers,
        version: to_db_version(pull_request.version())?,
        created_at: pull_request.created_at(),
        merged_at: pull_request.merged_at(),
    })
}

fn row_to_pull_request(row: PullRequestRow) -> RepositoryResult<PullRequest> {
    let PullRequestRow {
        pull_request_id,
        pull_request_name,
        author_id,
        status: persisted_status,
        assigned_reviewers: persisted_reviewers,
        version,
        created_at,
        merged_at,
    } = row;

    let status = PullRequestStatus::try_from(persisted_status.as_str())
        .map_err(RepositoryError::persistence)?;
    let assigned_reviewers = serde_json::from_value::<Vec<UserId>>(persisted_reviewers)
        .map_err(RepositoryError::persistence)?;

    let data = PersistedPullRequestData {
        pull_request_id: PullRequestId::new(pull_request_id)
            .map_err(RepositoryError::persistence)?,
        pull_request_name,
        author_id: UserId::new(author_id).map_err(RepositoryError::persistence)?,
        status,
        assigned_reviewers,
        created_at,
        merged_at,
        version: u64::try_from(version).map_err(RepositoryError::persistence)?,
    };
    Ok(PullRequest::from_persisted(data))
}
