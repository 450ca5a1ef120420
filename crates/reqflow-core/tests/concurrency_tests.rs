//! Concurrent mutations of one request

use futures::future::join_all;
use reqflow_core::{EngineError, TransitionError};
use reqflow_model::{Decision, NotificationKind, RequestStatus};
use reqflow_test_utils::{
    access_form, day, offboarding_form, onboarding_form, requester, TestHarness,
};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_task_completions_complete_the_request_once() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Laura Vidal", "11223344C").await;
    let filed = h
        .engine
        .file_offboarding(offboarding_form(employee.id, day(2024, 5, 31)), requester())
        .await
        .unwrap();

    let handles: Vec<_> = filed
        .tasks
        .iter()
        .map(|task| {
            let engine = h.engine.clone();
            let task_id = task.id;
            tokio::spawn(async move { engine.complete_task(task_id, None).await })
        })
        .collect();

    let outcomes: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let completions = outcomes
        .iter()
        .filter(|o| o.reached(RequestStatus::Completed))
        .count();
    assert_eq!(completions, 1);

    let completed_notices = h
        .engine
        .notifications()
        .await
        .unwrap()
        .into_iter()
        .filter(|n| {
            n.kind == NotificationKind::RequestCompleted
                && n.href.as_deref() == Some(format!("/requests/{}", filed.request.id).as_str())
        })
        .count();
    assert_eq!(completed_notices, 1);
    assert_eq!(
        h.engine.request(filed.request.id).await.unwrap().status,
        RequestStatus::Completed
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_onboarding_it_tasks_hand_off_once() {
    let h = TestHarness::new();
    let filed = h
        .engine
        .file_onboarding(onboarding_form("Sofia Pons", "12121212S"), requester())
        .await
        .unwrap();

    let it_tasks: Vec<_> = filed
        .tasks
        .iter()
        .filter(|t| t.assignee_department == "IT")
        .map(|t| t.id)
        .collect();
    assert_eq!(it_tasks.len(), 3);

    let results = join_all(it_tasks.into_iter().map(|task_id| {
        let engine = h.engine.clone();
        async move { engine.complete_task(task_id, None).await }
    }))
    .await;

    let handoffs = results
        .into_iter()
        .map(Result::unwrap)
        .filter(|o| o.reached(RequestStatus::PendingHrProcessing))
        .count();
    assert_eq!(handoffs, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_resolutions_accept_exactly_one() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Robert Grau", "77889900G").await;
    let filed = h
        .engine
        .file_access(access_form(employee.id, &["ERP"]), requester())
        .await
        .unwrap();
    let approval_id = filed.approval.unwrap().id;

    let handles: Vec<_> = [Decision::Approve, Decision::Reject, Decision::Approve]
        .into_iter()
        .map(|decision| {
            let engine = h.engine.clone();
            tokio::spawn(async move {
                engine
                    .resolve_approval(approval_id, decision, Some("decided".into()))
                    .await
            })
        })
        .collect();

    let mut accepted = 0;
    for joined in join_all(handles).await {
        match joined.unwrap() {
            Ok(_) => accepted += 1,
            Err(EngineError::InvalidTransition(TransitionError::ApprovalAlreadyResolved)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(accepted, 1);

    let status = h.engine.request(filed.request.id).await.unwrap().status;
    assert!(matches!(
        status,
        RequestStatus::PendingItProcessing | RequestStatus::Rejected
    ));
}
