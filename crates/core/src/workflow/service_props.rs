//! Property-based tests for the approval state machine.
//!
//! These drive `ApprovalService` over randomly generated routes and walk
//! full process traversals, checking the ordering and terminality
//! properties of the workflow.

use proptest::prelude::*;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::route::{ApprovalRoute, Stage};
use crate::workflow::service::ApprovalService;
use crate::workflow::types::{
    ApprovalAction, InvoiceStatus, PaymentStatus, ProcessStatus, StagePermissions,
};

/// Strategy for generating random UUIDs.
fn arb_uuid() -> impl Strategy<Value = Uuid> {
    any::<u128>().prop_map(Uuid::from_u128)
}

/// Strategy for generating non-empty comments.
fn arb_comment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9][a-zA-Z0-9 ]{0,40}".prop_map(String::from)
}

/// Strategy for a route with 1 to 6 gapless stages.
fn arb_route() -> impl Strategy<Value = ApprovalRoute> {
    (1usize..=6, any::<bool>()).prop_map(|(n, with_statuses)| {
        let stages = (0..n)
            .map(|i| {
                let order_index = i32::try_from(i).unwrap();
                Stage {
                    id: 100 + order_index,
                    route_id: 1,
                    order_index,
                    role_id: 10 + order_index,
                    name: Some(format!("Stage {order_index}")),
                    resulting_payment_status: with_statuses.then_some(PaymentStatus::UnderReview),
                    resulting_invoice_status: with_statuses.then_some(InvoiceStatus::UnderReview),
                    permissions: StagePermissions::default(),
                }
            })
            .collect();

        ApprovalRoute {
            id: 1,
            invoice_type_id: 7,
            name: "Generated".to_string(),
            is_active: true,
            stages,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A freshly started process always enters stage 0, regardless of
    /// route length or the outcome of an earlier terminal process.
    #[test]
    fn prop_start_enters_stage_zero(
        route in arb_route(),
        payment_id in arb_uuid(),
        prior in prop_oneof![
            Just(None),
            Just(Some(ProcessStatus::Approved)),
            Just(Some(ProcessStatus::Rejected)),
        ],
    ) {
        let action = ApprovalService::start(&route, payment_id, prior).unwrap();
        prop_assert_eq!(action.first_stage_id, route.stage_at(0).unwrap().id);
        prop_assert_eq!(action.payment_status, PaymentStatus::UnderReview);
        prop_assert_eq!(action.invoice_status, InvoiceStatus::UnderReview);
    }

    /// Starting while a pending process exists always fails, for any route.
    #[test]
    fn prop_start_blocked_by_pending_process(
        route in arb_route(),
        payment_id in arb_uuid(),
    ) {
        let result = ApprovalService::start(&route, payment_id, Some(ProcessStatus::Pending));
        prop_assert!(
            matches!(result, Err(WorkflowError::ProcessAlreadyExists { .. })),
            "expected ProcessAlreadyExists, got {:?}",
            result
        );
    }

    /// Walking a route with approvals visits every stage exactly once in
    /// order and completes exactly at the last stage.
    #[test]
    fn prop_full_approval_walk(
        route in arb_route(),
        user in arb_uuid(),
    ) {
        let n = i32::try_from(route.stage_count()).unwrap();
        let mut stage_index = 0;
        let mut visited = vec![0];

        loop {
            let action = ApprovalService::approve(
                ProcessStatus::Pending,
                stage_index,
                &route,
                user,
                None,
            ).unwrap();

            match action {
                ApprovalAction::Advance { stage_id, next_stage_index, .. } => {
                    // Approved the stage we sit at, advanced by exactly one.
                    prop_assert_eq!(stage_id, route.stage_at(stage_index).unwrap().id);
                    prop_assert_eq!(next_stage_index, stage_index + 1);
                    stage_index = next_stage_index;
                    visited.push(stage_index);
                }
                ApprovalAction::Complete { stage_id, payment_status, invoice_status, .. } => {
                    prop_assert_eq!(stage_id, route.stage_at(stage_index).unwrap().id);
                    prop_assert_eq!(stage_index, n - 1);
                    prop_assert_eq!(payment_status, PaymentStatus::ApprovedForPayment);
                    prop_assert_eq!(invoice_status, InvoiceStatus::ApprovedForPayment);
                    break;
                }
            }
        }

        let expected: Vec<i32> = (0..n).collect();
        prop_assert_eq!(visited, expected);
    }

    /// Rejection at any reachable stage is terminal and carries the
    /// cancelled statuses.
    #[test]
    fn prop_reject_terminal_at_any_stage(
        route in arb_route(),
        user in arb_uuid(),
        comment in arb_comment(),
        index_seed in any::<u8>(),
    ) {
        let n = i32::try_from(route.stage_count()).unwrap();
        let stage_index = i32::from(index_seed) % n;

        let action = ApprovalService::reject(
            ProcessStatus::Pending,
            stage_index,
            &route,
            user,
            comment.clone(),
        ).unwrap();

        prop_assert_eq!(action.stage_id, route.stage_at(stage_index).unwrap().id);
        prop_assert_eq!(action.acted_by, user);
        prop_assert_eq!(action.comment, comment);
        prop_assert_eq!(action.payment_status, PaymentStatus::Cancelled);
        prop_assert_eq!(action.invoice_status, InvoiceStatus::Cancelled);
    }

    /// Terminal processes refuse both approve and reject.
    #[test]
    fn prop_terminal_processes_are_frozen(
        route in arb_route(),
        user in arb_uuid(),
        comment in arb_comment(),
        terminal in prop_oneof![
            Just(ProcessStatus::Approved),
            Just(ProcessStatus::Rejected),
        ],
    ) {
        let approve = ApprovalService::approve(terminal, 0, &route, user, None);
        prop_assert!(
            matches!(approve, Err(WorkflowError::ProcessNotPending { .. })),
            "expected ProcessNotPending, got {:?}",
            approve
        );

        let reject = ApprovalService::reject(terminal, 0, &route, user, comment);
        prop_assert!(
            matches!(reject, Err(WorkflowError::ProcessNotPending { .. })),
            "expected ProcessNotPending, got {:?}",
            reject
        );
    }

    /// Whitespace-only comments never reject, whatever the process state.
    #[test]
    fn prop_blank_comment_never_rejects(
        route in arb_route(),
        user in arb_uuid(),
        blank in "[ \t]{0,8}",
        status in prop_oneof![
            Just(ProcessStatus::Pending),
            Just(ProcessStatus::Approved),
            Just(ProcessStatus::Rejected),
        ],
    ) {
        let result = ApprovalService::reject(status, 0, &route, user, blank);
        prop_assert!(matches!(result, Err(WorkflowError::CommentRequired)));
    }

    /// Permissions come from the current stage for pending processes and
    /// are empty for terminal ones.
    #[test]
    fn prop_permissions_follow_process_state(
        mut route in arb_route(),
        index_seed in any::<u8>(),
    ) {
        let n = i32::try_from(route.stage_count()).unwrap();
        let stage_index = i32::from(index_seed) % n;
        let pos = usize::try_from(stage_index).unwrap();
        route.stages[pos].permissions.can_edit_amount = true;

        let pending = ApprovalService::current_stage_permissions(
            ProcessStatus::Pending,
            stage_index,
            &route,
        ).unwrap();
        prop_assert!(pending.can_edit_amount);

        let approved = ApprovalService::current_stage_permissions(
            ProcessStatus::Approved,
            stage_index,
            &route,
        ).unwrap();
        prop_assert!(approved.is_empty());
    }
}
