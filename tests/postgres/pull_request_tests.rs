//! Pull request storage and service tests for `PostgreSQL`.

use crate::postgres::helpers::{
    BoxError, PostgresCluster, boxed, clock, postgres_cluster, prepare_repository, seed_team,
    test_runtime, uid,
};
use mockable::DefaultClock;
use reviewdesk::review::{
    adapters::postgres::PostgresReviewRepository,
    domain::{PullRequest, PullRequestId, PullRequestStatus, UserId},
    ports::{PullRequestRepository, RepositoryError},
    selection::RandomReviewerSelector,
    services::{CreatePullRequestRequest, ErrorKind, PullRequestService},
};
use rstest::rstest;
use std::sync::Arc;

type PgPullRequestService = PullRequestService<
    PostgresReviewRepository,
    PostgresReviewRepository,
    RandomReviewerSelector,
    DefaultClock,
>;

fn pr_id(value: &str) -> Result<PullRequestId, BoxError> {
    PullRequestId::new(value).map_err(boxed)
}

fn open(
    clock: &DefaultClock,
    id: &str,
    author: &str,
    reviewers: &[&str],
) -> Result<PullRequest, BoxError> {
    let assigned = reviewers
        .iter()
        .map(|reviewer| uid(reviewer))
        .collect::<Result<Vec<UserId>, BoxError>>()?;
    PullRequest::open(pr_id(id)?, format!("{id} title"), uid(author)?, assigned, clock)
        .map_err(boxed)
}

fn service(repo: &PostgresReviewRepository) -> PgPullRequestService {
    let shared = Arc::new(repo.clone());
    PullRequestService::new(
        Arc::clone(&shared),
        shared,
        Arc::new(RandomReviewerSelector::seeded(7)),
        Arc::new(DefaultClock),
    )
}

#[rstest]
fn pull_request_round_trips_with_reviewer_order(
    clock: DefaultClock,
    postgres_cluster: Option<PostgresCluster>,
) -> Result<(), BoxError> {
    let Some(cluster) = postgres_cluster else {
        return Ok(());
    };
    let prepared = prepare_repository(cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;

    rt.block_on(async {
        seed_team(repo, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await?;
        let pull_request = open(&clock, "pr-1", "u1", &["u3", "u2"])?;
        PullRequestRepository::create(repo, &pull_request).await?;

        let loaded = PullRequestRepository::get_by_id(repo, pull_request.pull_request_id()).await?;
        assert_eq!(loaded, pull_request);
        assert_eq!(loaded.assigned_reviewers(), [uid("u3")?, uid("u2")?]);
        assert_eq!(loaded.status(), PullRequestStatus::Open);
        assert!(PullRequestRepository::exists(repo, &pr_id("pr-1")?).await?);
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn duplicate_identifier_and_unknown_author_are_rejected(
    clock: DefaultClock,
    postgres_cluster: Option<PostgresCluster>,
) -> Result<(), BoxError> {
    let Some(cluster) = postgres_cluster else {
        return Ok(());
    };
    let prepared = prepare_repository(cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;

    rt.block_on(async {
        seed_team(repo, "backend", &[("u1", true), ("u2", true)]).await?;
        PullRequestRepository::create(repo, &open(&clock, "pr-1", "u1", &[])?).await?;

        let duplicate =
            PullRequestRepository::create(repo, &open(&clock, "pr-1", "u2", &[])?).await;
        assert!(
            matches!(duplicate, Err(RepositoryError::DuplicatePullRequest(ref id)) if id.as_str() == "pr-1"),
            "got: {duplicate:?}"
        );

        let orphan = PullRequestRepository::create(repo, &open(&clock, "pr-2", "ghost", &[])?).await;
        assert!(
            matches!(orphan, Err(RepositoryError::UserNotFound(ref id)) if id.as_str() == "ghost"),
            "got: {orphan:?}"
        );
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn stale_update_conflicts_and_missing_row_is_not_found(
    clock: DefaultClock,
    postgres_cluster: Option<PostgresCluster>,
) -> Result<(), BoxError> {
    let Some(cluster) = postgres_cluster else {
        return Ok(());
    };
    let prepared = prepare_repository(cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;

    rt.block_on(async {
        seed_team(repo, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await?;
        let pull_request = open(&clock, "pr-1", "u1", &["u2"])?;
        PullRequestRepository::create(repo, &pull_request).await?;

        let mut first = pull_request.clone();
        first.replace_reviewer(&uid("u2")?, uid("u3")?)?;
        repo.update(&first).await?;

        let mut stale = pull_request.clone();
        assert!(stale.merge(&clock));
        let conflict = repo.update(&stale).await;
        assert!(
            matches!(conflict, Err(RepositoryError::VersionConflict { expected: 0, .. })),
            "got: {conflict:?}"
        );

        let stored = PullRequestRepository::get_by_id(repo, &pr_id("pr-1")?).await?;
        assert_eq!(stored.version(), 1);
        assert_eq!(stored.assigned_reviewers(), [uid("u3")?]);

        let mut ghost = open(&clock, "pr-ghost", "u1", &[])?;
        ghost.merge(&clock);
        let missing = repo.update(&ghost).await;
        assert!(
            matches!(missing, Err(RepositoryError::PullRequestNotFound(_))),
            "got: {missing:?}"
        );
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn reviewer_listing_follows_creation_order(
    clock: DefaultClock,
    postgres_cluster: Option<PostgresCluster>,
) -> Result<(), BoxError> {
    let Some(cluster) = postgres_cluster else {
        return Ok(());
    };
    let prepared = prepare_repository(cluster)?;
    let repo = &prepared.repo;
    let rt = test_runtime()?;

    rt.block_on(async {
        seed_team(repo, "backend", &[("u1", true), ("u2", true), ("u3", true)]).await?;
        for (id, reviewers) in [
            ("pr-b", &["u2"][..]),
            ("pr-a", &["u3"][..]),
            ("pr-c", &["u3", "u2"][..]),
        ] {
            PullRequestRepository::create(repo, &open(&clock, id, "u1", reviewers)?).await?;
        }

        let reviewing = repo.get_by_reviewer(&uid("u2")?).await?;
        let ids: Vec<&str> = reviewing
            .iter()
            .map(|pull_request| pull_request.pull_request_id().as_str())
            .collect();
        assert_eq!(ids, ["pr-b", "pr-c"]);
        assert!(repo.get_by_reviewer(&uid("ghost")?).await?.is_empty());
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn service_lifecycle_runs_against_postgres(
    postgres_cluster: Option<PostgresCluster>,
) -> Result<(), BoxError> {
    let Some(cluster) = postgres_cluster else {
        return Ok(());
    };
    let prepared = prepare_repository(cluster)?;
    let repo = &prepared.repo;
    let pull_requests = service(repo);
    let rt = test_runtime()?;

    rt.block_on(async {
        seed_team(
            repo,
            "backend",
            &[("u1", true), ("u2", true), ("u3", true), ("u4", true), ("u5", false)],
        )
        .await?;

        let created = pull_requests
            .create_pull_request(CreatePullRequestRequest::new("pr-1", "Add search", "u1"))
            .await?;
        assert_eq!(created.assigned_reviewers().len(), 2);
        assert!(!created.has_reviewer(&uid("u1")?));
        assert!(!created.has_reviewer(&uid("u5")?));

        let outgoing = created.assigned_reviewers()[0].clone();
        let reassignment = pull_requests
            .reassign_reviewer("pr-1", outgoing.as_str())
            .await?;
        assert_eq!(
            reassignment.pull_request.assigned_reviewers()[0],
            reassignment.replaced_by
        );
        assert_eq!(reassignment.pull_request.version(), 1);

        let merged = pull_requests.merge_pull_request("pr-1").await?;
        assert!(merged.is_merged());
        let again = pull_requests.merge_pull_request("pr-1").await?;
        assert_eq!(again, merged);

        let rejected = pull_requests
            .reassign_reviewer("pr-1", reassignment.replaced_by.as_str())
            .await;
        assert!(
            matches!(rejected, Err(ref err) if err.kind() == ErrorKind::PullRequestMerged),
            "got: {rejected:?}"
        );

        let listed = pull_requests
            .get_pull_requests_by_reviewer(reassignment.replaced_by.as_str())
            .await?;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, PullRequestStatus::Merged);
        Ok::<(), BoxError>(())
    })
}

#[rstest]
fn concurrent_merges_agree_on_one_version(
    postgres_cluster: Option<PostgresCluster>,
) -> Result<(), BoxError> {
    let Some(cluster) = postgres_cluster else {
        return Ok(());
    };
    let prepared = prepare_repository(cluster)?;
    let pull_requests = Arc::new(service(&prepared.repo));
    let rt = test_runtime()?;

    let merged = rt.block_on(async {
        seed_team(&prepared.repo, "backend", &[("u1", true), ("u2", true)]).await?;
        pull_requests
            .create_pull_request(CreatePullRequestRequest::new("pr-1", "Race", "u1"))
            .await?;

        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let service = Arc::clone(&pull_requests);
            tasks.spawn(async move { service.merge_pull_request("pr-1").await });
        }
        let mut merged = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            merged.push(joined??);
        }
        Ok::<_, BoxError>(merged)
    })?;

    let first = merged.first().ok_or("no merge results")?;
    assert_eq!(first.version(), 1);
    assert!(
        merged.iter().all(|pull_request| pull_request == first),
        "merges disagree: {merged:?}"
    );
    Ok(())
}
