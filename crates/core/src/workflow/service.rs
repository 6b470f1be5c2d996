//! State transition logic for the payment approval workflow.
//!
//! This module implements the core state machine: starting a process on
//! a route, advancing through stages on approval, and terminal rejection.
//! All methods are stateless associated functions that validate a
//! transition and return a typed action with audit data; executing the
//! transition against the store is the persistence layer's job.

use chrono::Utc;
use uuid::Uuid;

use crate::workflow::error::WorkflowError;
use crate::workflow::route::ApprovalRoute;
use crate::workflow::types::{
    ApprovalAction, InvoiceStatus, PaymentStatus, ProcessStatus, RejectAction, StagePermissions,
    StartAction,
};

/// Stateless service for approval process transitions.
pub struct ApprovalService;

impl ApprovalService {
    /// Validates starting a new approval process for a payment.
    ///
    /// # Arguments
    /// * `route` - The active route matched for the payment's invoice type
    /// * `payment_id` - The payment entering approval
    /// * `latest_status` - Status of the payment's most recent process, if any
    ///
    /// # Returns
    /// * `Ok(StartAction)` with the first stage and the "in review" statuses
    /// * `Err(WorkflowError::ProcessAlreadyExists)` if the latest process is still pending
    /// * `Err(WorkflowError::NoStagesConfigured)` if the route has no stages
    /// * `Err(WorkflowError::StageNotFound)` if the route has stages but none at index 0
    pub fn start(
        route: &ApprovalRoute,
        payment_id: Uuid,
        latest_status: Option<ProcessStatus>,
    ) -> Result<StartAction, WorkflowError> {
        // A payment may re-enter approval only once its previous process
        // is terminal.
        if latest_status == Some(ProcessStatus::Pending) {
            return Err(WorkflowError::ProcessAlreadyExists { payment_id });
        }

        if route.is_empty() {
            return Err(WorkflowError::NoStagesConfigured { route_id: route.id });
        }

        let first_stage = route
            .stage_at(0)
            .ok_or(WorkflowError::StageNotFound {
                route_id: route.id,
                stage_index: 0,
            })?;

        Ok(StartAction {
            first_stage_id: first_stage.id,
            payment_status: PaymentStatus::UnderReview,
            invoice_status: InvoiceStatus::UnderReview,
        })
    }

    /// Validates approving the current stage of a process.
    ///
    /// The next stage is resolved at `stage_index + 1`; if it exists the
    /// action advances the process, otherwise the last stage was just
    /// approved and the process completes.
    ///
    /// # Arguments
    /// * `status` - The process's current status
    /// * `stage_index` - The process's current stage index
    /// * `route` - The route the process is traversing
    /// * `acted_by` - The approving user
    /// * `comment` - Optional approver comment
    ///
    /// # Returns
    /// * `Ok(ApprovalAction::Advance)` or `Ok(ApprovalAction::Complete)`
    /// * `Err(WorkflowError::ProcessNotPending)` if the process is terminal
    /// * `Err(WorkflowError::StageNotFound)` if the route no longer has the current stage
    pub fn approve(
        status: ProcessStatus,
        stage_index: i32,
        route: &ApprovalRoute,
        acted_by: Uuid,
        comment: Option<String>,
    ) -> Result<ApprovalAction, WorkflowError> {
        if status != ProcessStatus::Pending {
            return Err(WorkflowError::ProcessNotPending { status });
        }

        let stage = route
            .stage_at(stage_index)
            .ok_or(WorkflowError::StageNotFound {
                route_id: route.id,
                stage_index,
            })?;

        let acted_at = Utc::now();

        match route.stage_at(stage_index + 1) {
            Some(next) => Ok(ApprovalAction::Advance {
                stage_id: stage.id,
                next_stage_index: next.order_index,
                next_stage_id: next.id,
                acted_by,
                acted_at,
                comment,
                stage_payment_status: stage.resulting_payment_status,
                stage_invoice_status: stage.resulting_invoice_status,
            }),
            None => Ok(ApprovalAction::Complete {
                stage_id: stage.id,
                acted_by,
                acted_at,
                comment,
                stage_payment_status: stage.resulting_payment_status,
                stage_invoice_status: stage.resulting_invoice_status,
                payment_status: PaymentStatus::ApprovedForPayment,
                invoice_status: InvoiceStatus::ApprovedForPayment,
            }),
        }
    }

    /// Validates rejecting the current stage of a process.
    ///
    /// Rejection is always terminal: no stage after a rejection is ever
    /// visited. The payment may re-enter approval only via a brand-new
    /// process.
    ///
    /// # Arguments
    /// * `status` - The process's current status
    /// * `stage_index` - The process's current stage index
    /// * `route` - The route the process is traversing
    /// * `acted_by` - The rejecting user
    /// * `comment` - Mandatory rejection reason
    ///
    /// # Returns
    /// * `Ok(RejectAction)`
    /// * `Err(WorkflowError::CommentRequired)` if the comment is empty or whitespace
    /// * `Err(WorkflowError::ProcessNotPending)` if the process is terminal
    /// * `Err(WorkflowError::StageNotFound)` if the route no longer has the current stage
    pub fn reject(
        status: ProcessStatus,
        stage_index: i32,
        route: &ApprovalRoute,
        acted_by: Uuid,
        comment: String,
    ) -> Result<RejectAction, WorkflowError> {
        if comment.trim().is_empty() {
            return Err(WorkflowError::CommentRequired);
        }

        if status != ProcessStatus::Pending {
            return Err(WorkflowError::ProcessNotPending { status });
        }

        let stage = route
            .stage_at(stage_index)
            .ok_or(WorkflowError::StageNotFound {
                route_id: route.id,
                stage_index,
            })?;

        Ok(RejectAction {
            stage_id: stage.id,
            acted_by,
            acted_at: Utc::now(),
            comment,
            payment_status: PaymentStatus::Cancelled,
            invoice_status: InvoiceStatus::Cancelled,
        })
    }

    /// Returns the permissions granted at the process's current stage.
    ///
    /// A process that is not pending grants nothing.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::StageNotFound` if the process is pending
    /// but the route no longer contains its current stage.
    pub fn current_stage_permissions(
        status: ProcessStatus,
        stage_index: i32,
        route: &ApprovalRoute,
    ) -> Result<StagePermissions, WorkflowError> {
        if status != ProcessStatus::Pending {
            return Ok(StagePermissions::default());
        }

        let stage = route
            .stage_at(stage_index)
            .ok_or(WorkflowError::StageNotFound {
                route_id: route.id,
                stage_index,
            })?;

        Ok(stage.permissions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::route::Stage;

    fn stage(id: i32, order_index: i32) -> Stage {
        Stage {
            id,
            route_id: 1,
            order_index,
            role_id: 10 + order_index,
            name: None,
            resulting_payment_status: None,
            resulting_invoice_status: None,
            permissions: StagePermissions::default(),
        }
    }

    fn two_stage_route() -> ApprovalRoute {
        ApprovalRoute {
            id: 1,
            invoice_type_id: 7,
            name: "Standard 2-stage".to_string(),
            is_active: true,
            stages: vec![stage(100, 0), stage(101, 1)],
        }
    }

    #[test]
    fn test_start_fresh_payment() {
        let route = two_stage_route();
        let action = ApprovalService::start(&route, Uuid::new_v4(), None).unwrap();

        assert_eq!(action.first_stage_id, 100);
        assert_eq!(action.payment_status, PaymentStatus::UnderReview);
        assert_eq!(action.invoice_status, InvoiceStatus::UnderReview);
    }

    #[test]
    fn test_start_with_pending_process_fails() {
        let route = two_stage_route();
        let payment_id = Uuid::new_v4();
        let result = ApprovalService::start(&route, payment_id, Some(ProcessStatus::Pending));

        match result {
            Err(WorkflowError::ProcessAlreadyExists { payment_id: id }) => {
                assert_eq!(id, payment_id);
            }
            _ => panic!("Expected ProcessAlreadyExists"),
        }
    }

    #[test]
    fn test_start_after_terminal_process_succeeds() {
        let route = two_stage_route();
        assert!(
            ApprovalService::start(&route, Uuid::new_v4(), Some(ProcessStatus::Approved)).is_ok()
        );
        assert!(
            ApprovalService::start(&route, Uuid::new_v4(), Some(ProcessStatus::Rejected)).is_ok()
        );
    }

    #[test]
    fn test_start_empty_route_fails() {
        let mut route = two_stage_route();
        route.stages.clear();

        let result = ApprovalService::start(&route, Uuid::new_v4(), None);
        assert!(matches!(
            result,
            Err(WorkflowError::NoStagesConfigured { route_id: 1 })
        ));
    }

    #[test]
    fn test_approve_advances_to_next_stage() {
        let route = two_stage_route();
        let user = Uuid::new_v4();
        let action =
            ApprovalService::approve(ProcessStatus::Pending, 0, &route, user, None).unwrap();
        assert_eq!(action.new_process_status(), ProcessStatus::Pending);
        assert_eq!(action.stage_id(), 100);

        match action {
            ApprovalAction::Advance {
                stage_id,
                next_stage_index,
                next_stage_id,
                acted_by,
                ..
            } => {
                assert_eq!(stage_id, 100);
                assert_eq!(next_stage_index, 1);
                assert_eq!(next_stage_id, 101);
                assert_eq!(acted_by, user);
            }
            _ => panic!("Expected Advance"),
        }
    }

    #[test]
    fn test_approve_last_stage_completes() {
        let route = two_stage_route();
        let action = ApprovalService::approve(
            ProcessStatus::Pending,
            1,
            &route,
            Uuid::new_v4(),
            Some("ok".to_string()),
        )
        .unwrap();
        assert_eq!(action.new_process_status(), ProcessStatus::Approved);

        match action {
            ApprovalAction::Complete {
                stage_id,
                payment_status,
                invoice_status,
                comment,
                ..
            } => {
                assert_eq!(stage_id, 101);
                assert_eq!(payment_status, PaymentStatus::ApprovedForPayment);
                assert_eq!(invoice_status, InvoiceStatus::ApprovedForPayment);
                assert_eq!(comment.as_deref(), Some("ok"));
            }
            _ => panic!("Expected Complete"),
        }
    }

    #[test]
    fn test_approve_carries_stage_statuses() {
        let mut route = two_stage_route();
        route.stages[0].resulting_payment_status = Some(PaymentStatus::UnderReview);

        let action =
            ApprovalService::approve(ProcessStatus::Pending, 0, &route, Uuid::new_v4(), None)
                .unwrap();

        match action {
            ApprovalAction::Advance {
                stage_payment_status,
                stage_invoice_status,
                ..
            } => {
                assert_eq!(stage_payment_status, Some(PaymentStatus::UnderReview));
                assert_eq!(stage_invoice_status, None);
            }
            _ => panic!("Expected Advance"),
        }
    }

    #[test]
    fn test_approve_terminal_process_fails() {
        let route = two_stage_route();

        for status in [ProcessStatus::Approved, ProcessStatus::Rejected] {
            let result =
                ApprovalService::approve(status, 1, &route, Uuid::new_v4(), None);
            assert!(matches!(
                result,
                Err(WorkflowError::ProcessNotPending { .. })
            ));
        }
    }

    #[test]
    fn test_approve_dangling_stage_index_fails() {
        let route = two_stage_route();
        let result = ApprovalService::approve(ProcessStatus::Pending, 5, &route, Uuid::new_v4(), None);

        assert!(matches!(
            result,
            Err(WorkflowError::StageNotFound {
                route_id: 1,
                stage_index: 5
            })
        ));
    }

    #[test]
    fn test_reject_is_terminal_at_any_stage() {
        let route = two_stage_route();

        for index in [0, 1] {
            let action = ApprovalService::reject(
                ProcessStatus::Pending,
                index,
                &route,
                Uuid::new_v4(),
                "wrong amount".to_string(),
            )
            .unwrap();

            assert_eq!(action.stage_id, 100 + index);
            assert_eq!(action.comment, "wrong amount");
            assert_eq!(action.payment_status, PaymentStatus::Cancelled);
            assert_eq!(action.invoice_status, InvoiceStatus::Cancelled);
        }
    }

    #[test]
    fn test_reject_empty_comment_fails() {
        let route = two_stage_route();
        let result = ApprovalService::reject(
            ProcessStatus::Pending,
            0,
            &route,
            Uuid::new_v4(),
            String::new(),
        );
        assert!(matches!(result, Err(WorkflowError::CommentRequired)));
    }

    #[test]
    fn test_reject_whitespace_comment_fails() {
        let route = two_stage_route();
        let result = ApprovalService::reject(
            ProcessStatus::Pending,
            0,
            &route,
            Uuid::new_v4(),
            "   ".to_string(),
        );
        assert!(matches!(result, Err(WorkflowError::CommentRequired)));
    }

    #[test]
    fn test_reject_terminal_process_fails() {
        let route = two_stage_route();
        let result = ApprovalService::reject(
            ProcessStatus::Rejected,
            0,
            &route,
            Uuid::new_v4(),
            "again".to_string(),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::ProcessNotPending { .. })
        ));
    }

    #[test]
    fn test_permissions_for_pending_process() {
        let mut route = two_stage_route();
        route.stages[1].permissions = StagePermissions {
            can_edit_amount: true,
            ..StagePermissions::default()
        };

        let perms =
            ApprovalService::current_stage_permissions(ProcessStatus::Pending, 1, &route).unwrap();
        assert!(perms.can_edit_amount);

        let perms =
            ApprovalService::current_stage_permissions(ProcessStatus::Pending, 0, &route).unwrap();
        assert!(perms.is_empty());
    }

    #[test]
    fn test_permissions_empty_for_terminal_process() {
        let mut route = two_stage_route();
        route.stages[0].permissions.can_add_files = true;

        let perms =
            ApprovalService::current_stage_permissions(ProcessStatus::Approved, 0, &route).unwrap();
        assert!(perms.is_empty());
    }

    #[test]
    fn test_permissions_dangling_index_fails() {
        let route = two_stage_route();
        let result = ApprovalService::current_stage_permissions(ProcessStatus::Pending, 9, &route);
        assert!(matches!(result, Err(WorkflowError::StageNotFound { .. })));
    }
}
