//! Integration tests for the job approval workflow.

use std::sync::Arc;
use std::time::Duration;

use jobmarket::approval::{ApprovalService, JobEditPayload, NewJobInput};
use jobmarket::cache::LruJobViewCache;
use jobmarket::models::status::ApprovalStatus;
use jobmarket::models::{job, job_approval_log, job_approval_request};
use jobmarket::repositories::JobFieldCollections;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

#[path = "test_utils/mod.rs"]
mod test_utils;

const ADMIN: i64 = 900;
const BUSINESS: i64 = 100;

async fn service() -> (ApprovalService, DatabaseConnection) {
    let db = test_utils::setup_db().await;
    let cache = Arc::new(LruJobViewCache::new(16, Duration::from_secs(60)));
    (ApprovalService::new(db.clone(), cache), db)
}

fn new_job(title: &str) -> NewJobInput {
    NewJobInput {
        campaign_id: 1,
        title: title.to_string(),
        description: None,
        deadline: "2026-12-31".parse().unwrap(),
        employer_verified: false,
        fields: JobFieldCollections::default(),
    }
}

fn edit(title: &str) -> JobEditPayload {
    JobEditPayload {
        title: Some(title.to_string()),
        ..Default::default()
    }
}

async fn pending_count(db: &DatabaseConnection, job_id: i64) -> u64 {
    job_approval_request::Entity::find()
        .filter(job_approval_request::Column::JobId.eq(job_id))
        .filter(job_approval_request::Column::Status.eq("pending"))
        .count(db)
        .await
        .unwrap()
}

async fn current_pending(db: &DatabaseConnection, job_id: i64) -> job_approval_request::Model {
    job_approval_request::Entity::find()
        .filter(job_approval_request::Column::JobId.eq(job_id))
        .filter(job_approval_request::Column::Status.eq("pending"))
        .one(db)
        .await
        .unwrap()
        .expect("a pending request")
}

async fn job_status(db: &DatabaseConnection, job_id: i64) -> String {
    job::Entity::find_by_id(job_id)
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .status
}

/// The end-to-end scenario: create, approve, edit, reject, re-reject.
#[tokio::test]
async fn full_lifecycle_scenario() {
    let (svc, db) = service().await;

    let (created, r1) = svc.create_job(BUSINESS, new_job("Driver")).await.unwrap();
    assert_eq!(created.status, "pending");

    let resolved = svc
        .approve(ADMIN, r1.id, ApprovalStatus::Approved, None)
        .await
        .unwrap();
    assert_eq!(resolved.status, "approved");
    assert_eq!(job_status(&db, created.id).await, "published");

    svc.submit_edit(BUSINESS, created.id, edit("Senior driver"))
        .await
        .unwrap();
    let r2 = current_pending(&db, created.id).await;
    assert!(r2.data.is_some());

    let rejected = svc
        .approve_update(ADMIN, r2.id, ApprovalStatus::Rejected, Some("typo".into()))
        .await
        .unwrap();
    assert_eq!(rejected.status, "rejected");

    // Job row is untouched by the rejected edit.
    let reloaded = job::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, "Driver");
    assert_eq!(reloaded.status, "published");

    let err = svc
        .approve_update(ADMIN, r2.id, ApprovalStatus::Rejected, None)
        .await
        .unwrap_err();
    assert_eq!(err.message.as_ref(), "Job already approved");

    let logs = job_approval_log::Entity::find()
        .filter(job_approval_log::Column::JobId.eq(created.id))
        .order_by_asc(job_approval_log::Column::Id)
        .all(&db)
        .await
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(
        (logs[0].previous_status.as_str(), logs[0].new_status.as_str()),
        ("pending", "approved")
    );
    assert_eq!(
        (logs[1].previous_status.as_str(), logs[1].new_status.as_str()),
        ("pending", "rejected")
    );
}

/// Stop is only accepted for a published job, and failure leaves no trace.
#[tokio::test]
async fn stop_is_rejected_while_pending_and_leaves_state_unchanged() {
    let (svc, db) = service().await;
    let (created, r1) = svc.create_job(BUSINESS, new_job("Cook")).await.unwrap();

    let err = svc
        .approve_update(ADMIN, r1.id, ApprovalStatus::Stopped, None)
        .await
        .unwrap_err();
    assert_eq!(err.message.as_ref(), "Invalid status");

    assert_eq!(job_status(&db, created.id).await, "pending");
    assert_eq!(current_pending(&db, created.id).await.id, r1.id);
    let logs = job_approval_log::Entity::find()
        .filter(job_approval_log::Column::JobId.eq(created.id))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(logs, 0);

    svc.approve(ADMIN, r1.id, ApprovalStatus::Approved, None)
        .await
        .unwrap();
    svc.approve_update(ADMIN, r1.id, ApprovalStatus::Stopped, None)
        .await
        .unwrap();
    assert_eq!(job_status(&db, created.id).await, "stopped");
}

/// Editing a stopped job re-opens moderation only when its last request
/// was approved; otherwise the edit applies directly.
#[tokio::test]
async fn stopped_job_edit_paths_depend_on_last_resolution() {
    let (svc, db) = service().await;

    // Path 1: approved then stopped. The last request ended approved, so
    // the edit is parked as a new pending request with payload.
    let (approved_job, r1) = svc.create_job(BUSINESS, new_job("Guard")).await.unwrap();
    svc.approve(ADMIN, r1.id, ApprovalStatus::Approved, None)
        .await
        .unwrap();
    svc.approve_update(ADMIN, r1.id, ApprovalStatus::Stopped, None)
        .await
        .unwrap();

    svc.submit_edit(BUSINESS, approved_job.id, edit("Night guard"))
        .await
        .unwrap();
    let reloaded = job::Entity::find_by_id(approved_job.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, "Guard");
    assert_eq!(reloaded.status, "stopped");
    assert!(current_pending(&db, approved_job.id).await.data.is_some());

    // Path 2: stopped while an edit was still pending. That request was
    // marked stopped with the job, so the next edit applies directly and
    // the job returns to pending.
    let (parked_job, r1) = svc.create_job(BUSINESS, new_job("Porter")).await.unwrap();
    svc.approve(ADMIN, r1.id, ApprovalStatus::Approved, None)
        .await
        .unwrap();
    svc.submit_edit(BUSINESS, parked_job.id, edit("Head porter"))
        .await
        .unwrap();
    let r2 = current_pending(&db, parked_job.id).await;
    svc.approve_update(ADMIN, r2.id, ApprovalStatus::Stopped, None)
        .await
        .unwrap();

    svc.submit_edit(BUSINESS, parked_job.id, edit("Day porter"))
        .await
        .unwrap();
    let reloaded = job::Entity::find_by_id(parked_job.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, "Day porter");
    assert_eq!(reloaded.status, "pending");
}

/// Invariant: at most one pending request per job across random
/// interleavings of edits and resolutions.
#[tokio::test]
async fn at_most_one_pending_request_invariant() {
    let (svc, db) = service().await;
    let (created, r1) = svc.create_job(BUSINESS, new_job("Packer")).await.unwrap();
    assert_eq!(pending_count(&db, created.id).await, 1);

    svc.submit_edit(BUSINESS, created.id, edit("a")).await.unwrap();
    assert_eq!(pending_count(&db, created.id).await, 1);
    let _ = r1;

    let current = current_pending(&db, created.id).await;
    svc.approve(ADMIN, current.id, ApprovalStatus::Approved, None)
        .await
        .unwrap();
    assert_eq!(pending_count(&db, created.id).await, 0);

    for title in ["b", "c", "d"] {
        svc.submit_edit(BUSINESS, created.id, edit(title)).await.unwrap();
        assert_eq!(pending_count(&db, created.id).await, 1);
    }

    let current = current_pending(&db, created.id).await;
    svc.approve_update(ADMIN, current.id, ApprovalStatus::Approved, None)
        .await
        .unwrap();
    assert_eq!(pending_count(&db, created.id).await, 0);

    let reloaded = job::Entity::find_by_id(created.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.title, "d");
}

/// Concurrent resolution attempts on one request: exactly one commits,
/// the other fails its precondition, and a single audit row is written.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_resolution_serializes() {
    let (svc, db) = service().await;
    let svc = Arc::new(svc);

    for round in 0..10 {
        let (created, r1) = svc
            .create_job(BUSINESS, new_job(&format!("Welder {round}")))
            .await
            .unwrap();

        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let a = {
            let svc = svc.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                svc.approve(ADMIN, r1.id, ApprovalStatus::Approved, None).await
            })
        };
        let b = {
            let svc = svc.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                svc.approve(ADMIN, r1.id, ApprovalStatus::Rejected, None).await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = results.iter().find(|r| r.is_err()).unwrap();
        assert_eq!(
            failure.as_ref().unwrap_err().message.as_ref(),
            "Invalid status"
        );

        // The losing resolution must not have appended a second log row.
        let logs = job_approval_log::Entity::find()
            .filter(job_approval_log::Column::JobId.eq(created.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(logs, 1);
    }
}
