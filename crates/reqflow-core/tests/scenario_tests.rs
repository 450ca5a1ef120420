//! End-to-end request scenarios over the sample catalog

use pretty_assertions::assert_eq;
use reqflow_core::{Clock, EngineError, EngineWarning, TransitionError, ValidationError};
use reqflow_model::{
    ApprovalStatus, Decision, NotificationKind, Recipient, RequestKind, RequestStatus, UserId,
};
use reqflow_test_utils::{
    access_form, access_form_of, day, offboarding_form, onboarding_form, requester, TestHarness,
};

#[tokio::test]
async fn access_without_approval_completes_with_its_only_task() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Marc Soler", "66778899F").await;

    let filed = h
        .engine
        .file_access(access_form(employee.id, &["VPN"]), requester())
        .await
        .unwrap();
    assert_eq!(filed.request.status, RequestStatus::Pending);
    assert!(filed.approval.is_none());
    assert_eq!(filed.tasks.len(), 1);
    assert_eq!(filed.request.assigned_department, "Informàtica");

    let outcome = h.engine.complete_task(filed.tasks[0].id, None).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Completed);
    assert!(outcome.reached(RequestStatus::Completed));
    let kinds: Vec<NotificationKind> = outcome.notifications.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![NotificationKind::TaskCompleted, NotificationKind::RequestCompleted]
    );
}

#[tokio::test]
async fn gated_access_rejected_by_manager_records_the_reason() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Carles Bosch", "87654321B").await;

    let filed = h
        .engine
        .file_access(
            access_form_of("access_request_critical", employee.id, &["ERP"]),
            requester(),
        )
        .await
        .unwrap();
    assert_eq!(filed.request.status, RequestStatus::PendingManagerApproval);
    let approval = filed.approval.unwrap();
    assert_eq!(approval.status, ApprovalStatus::Pending);
    assert_eq!(h.engine.approvals_for(filed.request.id).await.unwrap().len(), 1);

    let outcome = h
        .engine
        .resolve_approval(approval.id, Decision::Reject, Some("policy violation".into()))
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Rejected);
    assert_eq!(outcome.request.rejection_reason(), Some("policy violation"));

    let stored = h.engine.request(filed.request.id).await.unwrap();
    assert_eq!(stored.rejection_reason(), Some("policy violation"));
    assert_eq!(
        outcome.approval.unwrap().approved_at,
        Some(h.clock.now())
    );
}

#[tokio::test]
async fn offboarding_adds_one_revocation_task_per_held_system() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Laura Vidal", "11223344C").await;
    assert_eq!(h.grant(employee.id, &["ERP"]).await.status, RequestStatus::Completed);
    assert_eq!(h.grant(employee.id, &["CRM"]).await.status, RequestStatus::Completed);

    let last_day = day(2024, 5, 31);
    let filed = h
        .engine
        .file_offboarding(offboarding_form(employee.id, last_day), requester())
        .await
        .unwrap();

    let revocations: Vec<_> = filed
        .tasks
        .iter()
        .filter(|t| t.task_template_id.is_none())
        .collect();
    assert_eq!(filed.tasks.len(), 5 + 2);
    assert_eq!(revocations.len(), 2);
    assert!(revocations[0].title.contains("\"ERP\""));
    assert!(revocations[1].title.contains("\"CRM\""));
    for task in &revocations {
        assert_eq!(task.assignee_department, "Informàtica");
        assert_eq!(task.visible_from, Some(last_day));
        assert_eq!(task.due_date, Some(last_day));
    }
    let orders: Vec<u32> = filed.tasks.iter().map(|t| t.order).collect();
    assert_eq!(orders, vec![1, 2, 3, 4, 5, 6, 7]);

    assert!(!filed.employee.is_active());
    assert_eq!(filed.employee.offboarding_request_id, Some(filed.request.id));
}

#[tokio::test]
async fn onboarding_hands_off_to_hr_once_then_closes_explicitly() {
    let h = TestHarness::new();
    let filed = h
        .engine
        .file_onboarding(onboarding_form("Sofia Pons", "12121212S"), requester())
        .await
        .unwrap();
    assert_eq!(filed.request.assigned_department, "Recursos Humans");
    assert_eq!(filed.employee.onboarding_request_id, Some(filed.request.id));
    assert!(filed.tasks[0].title.ends_with("for Sofia Pons"));

    let mut handoffs = 0;
    for task in &filed.tasks {
        let outcome = h.engine.complete_task(task.id, None).await.unwrap();
        handoffs += outcome
            .notifications
            .iter()
            .filter(|n| n.kind == NotificationKind::HandedOffToHr)
            .count();
        if task.order == 4 {
            assert_eq!(outcome.request.status, RequestStatus::PendingHrProcessing);
            assert_eq!(outcome.request.assigned_department, "Recursos Humans");
        }
    }
    assert_eq!(handoffs, 1);

    let request = h.engine.request(filed.request.id).await.unwrap();
    assert_eq!(request.status, RequestStatus::PendingHrProcessing);

    let outcome = h.engine.finalize(filed.request.id).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Completed);
}

#[tokio::test]
async fn hr_validation_variant_waits_for_final_validation() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Jordi Martí", "44556677D").await;
    let filed = h
        .engine
        .file_access(
            access_form_of("access_hr_validation", employee.id, &["BI"]),
            requester(),
        )
        .await
        .unwrap();
    assert_eq!(filed.request.status, RequestStatus::Pending);

    let outcome = h.engine.complete_task(filed.tasks[0].id, None).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::PendingFinalValidation);
    assert_eq!(outcome.request.assigned_department, "Recursos Humans");
    assert!(outcome
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::AwaitingFinalValidation
            && n.recipient == Recipient::Department("Recursos Humans".into())));

    let err = h.engine.finalize(filed.request.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition(TransitionError::FinalizeNotAllowed { .. })
    ));

    let outcome = h.engine.complete_task(filed.tasks[1].id, None).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::PendingFinalValidation);
    assert!(outcome.transitions.is_empty());

    let outcome = h.engine.finalize(filed.request.id).await.unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Completed);
    assert_eq!(h.engine.current_accesses(employee.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn approval_resolves_exactly_once() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Robert Grau", "77889900G").await;
    let filed = h
        .engine
        .file_access(access_form(employee.id, &["CRM"]), requester())
        .await
        .unwrap();
    let approval = filed.approval.unwrap();

    let first = h
        .engine
        .resolve_approval(approval.id, Decision::Approve, Some("ok".into()))
        .await
        .unwrap();
    assert_eq!(first.request.status, RequestStatus::PendingItProcessing);
    let approved_at = first.approval.unwrap().approved_at;
    assert!(approved_at.is_some());

    h.advance(chrono::Duration::hours(1));
    for decision in [Decision::Approve, Decision::Reject] {
        let err = h
            .engine
            .resolve_approval(approval.id, decision, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidTransition(TransitionError::ApprovalAlreadyResolved)
        ));
    }

    let stored = h.engine.approvals_for(filed.request.id).await.unwrap();
    assert_eq!(stored[0].status, ApprovalStatus::Approved);
    assert_eq!(stored[0].approved_at, approved_at);
    assert_eq!(
        h.engine.request(filed.request.id).await.unwrap().status,
        RequestStatus::PendingItProcessing
    );
}

#[tokio::test]
async fn approver_inbox_lists_only_pending_approvals() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Anna Puig", "12345678A").await;
    let approver = UserId::from("user_004");

    let filed = h
        .engine
        .file_access(access_form(employee.id, &["ERP"]), requester())
        .await
        .unwrap();
    assert_eq!(filed.approval.as_ref().unwrap().approver_id, approver);
    assert!(filed
        .notifications
        .iter()
        .any(|n| n.kind == NotificationKind::ApprovalRequired
            && n.recipient == Recipient::User(approver.clone())));

    let inbox = h.engine.pending_approvals_for(&approver).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert!(h
        .engine
        .pending_approvals_for(&UserId::from("user_005"))
        .await
        .unwrap()
        .is_empty());

    h.engine
        .resolve_approval(inbox[0].id, Decision::Approve, None)
        .await
        .unwrap();
    assert!(h.engine.pending_approvals_for(&approver).await.unwrap().is_empty());
}

#[tokio::test]
async fn mixed_policies_route_to_first_and_attach_a_note() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Elena Roca", "55667788E").await;

    let filed = h
        .engine
        .file_access(
            access_form(employee.id, &["VPN", "ERP", "Eina de Gestió de Projectes"]),
            requester(),
        )
        .await
        .unwrap();
    let approval = filed.approval.unwrap();
    assert_eq!(approval.approver_id, UserId::from("user_004"));
    assert!(approval.comments.starts_with("Note: "));
    let note = match &filed.request.details {
        reqflow_model::RequestDetails::Access {
            multi_system_approval_note,
            ..
        } => multi_system_approval_note.clone(),
        other => panic!("unexpected details {other:?}"),
    };
    assert_eq!(note.as_deref(), Some(h.engine.config().multi_system_approval_note.as_str()));

    let same_policy = h
        .engine
        .file_access(access_form(employee.id, &["ERP", "CRM"]), requester())
        .await
        .unwrap();
    assert_eq!(same_policy.approval.unwrap().comments, "");
}

#[tokio::test]
async fn unknown_systems_are_reported_not_rejected() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Clara Font", "10101010Z").await;
    let filed = h
        .engine
        .file_access(access_form(employee.id, &["Mainframe"]), requester())
        .await
        .unwrap();
    assert_eq!(filed.request.status, RequestStatus::Pending);
    assert_eq!(
        filed.warnings,
        vec![EngineWarning::UnknownSystem {
            system: "Mainframe".to_string()
        }]
    );
}

#[tokio::test]
async fn transfer_rules() {
    let h = TestHarness::new();
    let onboarding = h
        .engine
        .file_onboarding(onboarding_form("Pau Vila", "22334455K"), requester())
        .await
        .unwrap();
    let id = onboarding.request.id;

    let err = h.engine.transfer(id, "RRHH".into()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::SameDepartment(_))
    ));

    let to_it = h.engine.transfer(id, "Informàtica".into()).await.unwrap();
    assert_eq!(to_it.request.status, RequestStatus::Pending);
    assert_eq!(to_it.request.assigned_department, "Informàtica");
    assert!(to_it.transitions.is_empty());

    let back = h.engine.transfer(id, "Recursos Humans".into()).await.unwrap();
    assert_eq!(back.request.status, RequestStatus::PendingHrProcessing);
    assert_eq!(back.notifications[0].kind, NotificationKind::Transferred);

    let employee = h.seed_employee("Marta Soler", "33445566L").await;
    let gated = h
        .engine
        .file_access(access_form(employee.id, &["ERP"]), requester())
        .await
        .unwrap();
    let moved = h
        .engine
        .transfer(gated.request.id, "Recursos Humans".into())
        .await
        .unwrap();
    assert_eq!(moved.request.status, RequestStatus::Pending);
    let approvals = h.engine.approvals_for(gated.request.id).await.unwrap();
    assert_eq!(approvals[0].status, ApprovalStatus::Pending);
}

#[tokio::test]
async fn cancelled_requests_are_frozen() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Jordi Puig", "99001122M").await;
    let filed = h
        .engine
        .file_access(access_form(employee.id, &["VPN"]), requester())
        .await
        .unwrap();

    let err = h.engine.cancel(filed.request.id, "  ".into()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::Empty { field: "reason" })
    ));

    let outcome = h
        .engine
        .cancel(filed.request.id, "Duplicate request".into())
        .await
        .unwrap();
    assert_eq!(outcome.request.status, RequestStatus::Cancelled);
    assert_eq!(outcome.request.cancellation_reason(), Some("Duplicate request"));

    let err = h.engine.cancel(filed.request.id, "Again".into()).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition(TransitionError::RequestTerminal(RequestStatus::Cancelled))
    ));
    let err = h.engine.complete_task(filed.tasks[0].id, None).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidTransition(TransitionError::RequestTerminal(_))
    ));
}

#[tokio::test]
async fn offboarding_tasks_stay_hidden_until_the_last_day() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Nil Ferrer", "55443322N").await;
    let last_day = day(2024, 5, 31);
    let filed = h
        .engine
        .file_offboarding(offboarding_form(employee.id, last_day), requester())
        .await
        .unwrap();

    let visible = h.engine.visible_tasks().await.unwrap();
    assert!(visible.iter().all(|t| t.request_id != filed.request.id));

    let on_last_day = h.engine.visible_tasks_on(last_day).await.unwrap();
    assert_eq!(
        on_last_day
            .iter()
            .filter(|t| t.request_id == filed.request.id)
            .count(),
        filed.tasks.len()
    );
}

#[tokio::test]
async fn filing_checks_the_request_type_and_employee() {
    let h = TestHarness::new();

    let mut legacy = onboarding_form("Pere Mir", "66554433P");
    legacy.request_type_id = "onboarding_legacy".into();
    assert!(matches!(
        h.engine.file_onboarding(legacy, requester()).await.unwrap_err(),
        EngineError::Validation(ValidationError::RequestTypeDisabled(_))
    ));

    let employee = h.seed_employee("Pere Mir", "66554433P").await;
    assert!(matches!(
        h.engine
            .file_access(access_form_of("onboarding_general", employee.id, &["VPN"]), requester())
            .await
            .unwrap_err(),
        EngineError::Validation(ValidationError::RequestTypeMismatch { .. })
    ));

    h.engine
        .file_offboarding(offboarding_form(employee.id, day(2024, 6, 28)), requester())
        .await
        .unwrap();
    assert!(matches!(
        h.engine
            .file_access(access_form(employee.id, &["VPN"]), requester())
            .await
            .unwrap_err(),
        EngineError::Validation(ValidationError::EmployeeInactive(_))
    ));
}

#[tokio::test]
async fn onboarding_reuses_an_employee_with_the_same_nif() {
    let h = TestHarness::new();
    let first = h.seed_employee("Laia Serra", "77665544Q").await;

    let mut again = onboarding_form("Laia Serra Bosch", "77665544Q");
    again.department = "Vendes".to_string();
    let filed = h.engine.file_onboarding(again, requester()).await.unwrap();

    assert_eq!(filed.employee.id, first.id);
    assert_eq!(filed.employee.full_name, "Laia Serra Bosch");
    assert_eq!(filed.employee.department, "Vendes");
    assert_eq!(filed.request.kind(), RequestKind::Onboarding);
}

#[tokio::test]
async fn notifications_are_listed_most_recent_first() {
    let h = TestHarness::new();
    let employee = h.seed_employee("Ona Riba", "88776655R").await;
    let filed = h
        .engine
        .file_access(access_form(employee.id, &["VPN"]), requester())
        .await
        .unwrap();
    h.engine.complete_task(filed.tasks[0].id, None).await.unwrap();

    let all = h.engine.notifications().await.unwrap();
    assert_eq!(all[0].kind, NotificationKind::RequestCompleted);
    assert_eq!(all[1].kind, NotificationKind::TaskCompleted);
    assert_eq!(all[2].kind, NotificationKind::RequestFiled);
}
