//! Shared test helpers for `PostgreSQL` integration tests.

pub use super::cluster::{BoxError, PostgresCluster, boxed, postgres_cluster};
use super::cluster::TemporaryDatabase;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use reviewdesk::review::{
    adapters::postgres::PostgresReviewRepository,
    domain::{Team, TeamMember, TeamName, UserId},
    ports::TeamRepository,
};
use tokio::runtime::Runtime;
use uuid::Uuid;

/// SQL creating the review schema.
pub const CREATE_REVIEW_TABLES_SQL: &str =
    include_str!("../../migrations/2026-10-01-000000_create_review_tables/up.sql");

/// Template database name for the pre-migrated schema.
pub const TEMPLATE_DB: &str = "reviewdesk_test_template";

/// Repository over a throwaway database cloned from the template.
pub struct PreparedRepo {
    /// Repository for every review port.
    pub repo: PostgresReviewRepository,
    _database: TemporaryDatabase,
}

/// Builds the multi-threaded runtime the repository's blocking calls need.
///
/// # Errors
///
/// Returns an error when the runtime cannot start.
pub fn test_runtime() -> Result<Runtime, BoxError> {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .map_err(boxed)
}

/// Clones the migrated template and opens a repository on the copy.
///
/// # Errors
///
/// Returns an error when the template, database, or pool cannot be set up.
pub fn prepare_repository(cluster: PostgresCluster) -> Result<PreparedRepo, BoxError> {
    cluster.ensure_template_exists(TEMPLATE_DB, apply_migrations)?;
    let temp_db = cluster
        .temporary_database_from_template(&format!("test_{}", Uuid::new_v4()), TEMPLATE_DB)?;

    let manager = ConnectionManager::<PgConnection>::new(temp_db.url());
    let pool = Pool::builder()
        .max_size(8)
        .build(manager)
        .map_err(boxed)?;

    Ok(PreparedRepo {
        repo: PostgresReviewRepository::new(pool),
        _database: temp_db,
    })
}

fn apply_migrations(url: &str) -> Result<(), BoxError> {
    let mut conn = PgConnection::establish(url).map_err(boxed)?;
    conn.batch_execute(CREATE_REVIEW_TABLES_SQL)
        .map_err(boxed)?;
    Ok(())
}

/// Provides a [`DefaultClock`] for test fixtures.
#[rstest::fixture]
pub fn clock() -> DefaultClock {
    DefaultClock
}

/// Builds a user identifier.
///
/// # Errors
///
/// Returns an error when `value` is blank.
pub fn uid(value: &str) -> Result<UserId, BoxError> {
    UserId::new(value).map_err(boxed)
}

/// Stores a team from `(user_id, is_active)` pairs.
///
/// # Errors
///
/// Returns an error when the team is invalid or cannot be stored.
pub async fn seed_team(
    repo: &PostgresReviewRepository,
    name: &str,
    members: &[(&str, bool)],
) -> Result<Team, BoxError> {
    let roster = members
        .iter()
        .map(|(id, active)| -> Result<TeamMember, BoxError> {
            Ok(TeamMember::new(uid(id)?, format!("{id}-name"), *active))
        })
        .collect::<Result<Vec<_>, BoxError>>()?;
    let team_name = TeamName::new(name).map_err(boxed)?;
    let team = Team::new(team_name, roster).map_err(boxed)?;
    TeamRepository::create(repo, &team).await?;
    Ok(team)
}
