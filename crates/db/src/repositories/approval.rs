//! Workflow engine for payment approval processes.
//!
//! Orchestrates process creation, stage advancement, rejection, and
//! status propagation over the route catalog, process store, and step
//! ledger. This is the only component with business-rule logic; the
//! pure transition decisions live in `payflow_core` and are executed
//! here against the store in a fixed write order.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, EntityTrait};
use tracing::{debug, warn};
use uuid::Uuid;

use payflow_core::workflow::{
    ApprovalAction, ApprovalRoute, ApprovalService, InvoiceStatus, PaymentStatus, ProcessStatus,
    Stage, StagePermissions, StepAction, WorkflowError,
};

use crate::entities::{approval_steps, payment_approvals, payments};
use crate::repositories::process::{parse_status, ProcessStore};
use crate::repositories::propagation::{DbStatusPropagator, PropagationError, StatusPropagator};
use crate::repositories::route::RouteRepository;
use crate::repositories::step::StepLedger;

/// Result of starting an approval process.
#[derive(Debug)]
pub struct StartOutcome {
    /// The freshly created process, at stage 0 and pending.
    pub approval: payment_approvals::Model,
    /// Propagation failure, if any. The process itself is committed.
    pub propagation: Option<PropagationError>,
}

/// Result of approving the current stage of a process.
#[derive(Debug)]
pub struct ApproveOutcome {
    /// The process after the transition.
    pub approval: payment_approvals::Model,
    /// True when the last stage was just approved.
    pub completed: bool,
    /// Propagation failure, if any. The transition itself is committed.
    pub propagation: Option<PropagationError>,
}

/// Result of rejecting a process.
#[derive(Debug)]
pub struct RejectOutcome {
    /// The process after the transition, terminally rejected.
    pub approval: payment_approvals::Model,
    /// Propagation failure, if any. The transition itself is committed.
    pub propagation: Option<PropagationError>,
}

/// Lightweight answer to "is this payment mid-review?".
#[derive(Debug)]
pub struct ReviewStatus {
    /// True when a pending process exists for the payment.
    pub under_review: bool,
    /// The pending process, when one exists.
    pub approval: Option<payment_approvals::Model>,
}

/// A process with its steps, ordered for audit display.
#[derive(Debug)]
pub struct ApprovalHistory {
    /// The payment's most recent process.
    pub approval: payment_approvals::Model,
    /// Its steps, sorted by the owning stage's `order_index`.
    pub steps: Vec<approval_steps::Model>,
}

/// A pending process whose current stage is owned by a queried role.
#[derive(Debug)]
pub struct PendingApproval {
    /// The pending process.
    pub approval: payment_approvals::Model,
    /// The resolved current stage.
    pub stage: Stage,
}

/// Result for a single process in a bulk operation.
#[derive(Debug, Clone)]
pub struct BulkActionItem {
    /// Process ID.
    pub approval_id: Uuid,
    /// Whether the action succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
}

/// Result of a bulk approve/reject operation.
#[derive(Debug, Clone)]
pub struct BulkActionResult {
    /// Results for each process, in request order.
    pub results: Vec<BulkActionItem>,
    /// Number of successful actions.
    pub success_count: usize,
    /// Number of failed actions.
    pub failure_count: usize,
    /// Total amount of the successfully processed payments.
    pub total_amount: Decimal,
}

/// Workflow engine repository for payment approval processes.
#[derive(Clone)]
pub struct ApprovalRepository {
    db: DatabaseConnection,
    routes: RouteRepository,
    processes: ProcessStore,
    steps: StepLedger,
    propagator: Arc<dyn StatusPropagator>,
}

impl ApprovalRepository {
    /// Creates a new approval repository with the database-backed
    /// status propagator.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let propagator = Arc::new(DbStatusPropagator::new(db.clone()));
        Self::with_propagator(db, propagator)
    }

    /// Creates a new approval repository with a custom propagator.
    #[must_use]
    pub fn with_propagator(db: DatabaseConnection, propagator: Arc<dyn StatusPropagator>) -> Self {
        Self {
            routes: RouteRepository::new(db.clone()),
            processes: ProcessStore::new(db.clone()),
            steps: StepLedger::new(db.clone()),
            db,
            propagator,
        }
    }

    /// Starts an approval process for a payment.
    ///
    /// Writes apply in a fixed order: process row, first step row, then
    /// status propagation. A crash between the first two leaves a
    /// repairable gap that read paths self-heal (see
    /// [`Self::repair_missing_step`]).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No active route exists for the invoice type
    /// - The route has no stages
    /// - A still-pending process already exists for the payment
    /// - A store write fails
    pub async fn start_process(
        &self,
        payment_id: Uuid,
        invoice_type_id: i32,
        started_by: Uuid,
    ) -> Result<StartOutcome, WorkflowError> {
        let route = self
            .routes
            .get_active_route(invoice_type_id)
            .await?
            .ok_or(WorkflowError::NoRouteConfigured { invoice_type_id })?;

        let latest = self.processes.latest_for_payment(payment_id).await?;
        let latest_status = latest.as_ref().map(parse_status).transpose()?;

        let action = ApprovalService::start(&route, payment_id, latest_status)?;

        let approval = self
            .processes
            .insert(payment_id, route.id, started_by)
            .await?;
        self.steps
            .insert_pending(approval.id, action.first_stage_id)
            .await?;

        debug!(
            approval_id = %approval.id,
            payment_id = %payment_id,
            route_id = route.id,
            "approval process started"
        );

        let propagation = self
            .propagate(
                payment_id,
                Some(action.payment_status),
                Some(action.invoice_status),
            )
            .await;

        Ok(StartOutcome {
            approval,
            propagation,
        })
    }

    /// Approves the current stage of a process.
    ///
    /// The process row is advanced (or finalized) through a
    /// compare-and-set guarded on its status and stage index, so of two
    /// concurrent calls exactly one wins; the loser fails with
    /// `ProcessNotPending` and mutates nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The process is not found or not pending
    /// - The route no longer contains the current stage
    /// - A store write fails
    #[allow(clippy::too_many_lines)]
    pub async fn approve(
        &self,
        approval_id: Uuid,
        acted_by: Uuid,
        comment: Option<String>,
    ) -> Result<ApproveOutcome, WorkflowError> {
        let approval = self
            .processes
            .get(approval_id)
            .await?
            .ok_or(WorkflowError::ProcessNotFound(approval_id))?;
        let status = parse_status(&approval)?;
        let route = self.load_route(&approval).await?;

        self.repair_missing_step(&approval, status, &route).await?;

        let action = ApprovalService::approve(
            status,
            approval.current_stage_index,
            &route,
            acted_by,
            comment,
        )?;

        let (completed, propagation) = match action {
            ApprovalAction::Advance {
                stage_id,
                next_stage_index,
                next_stage_id,
                acted_by,
                acted_at,
                comment,
                stage_payment_status,
                stage_invoice_status,
            } => {
                let won = self
                    .processes
                    .advance(approval_id, approval.current_stage_index, next_stage_index)
                    .await?;
                if !won {
                    return Err(self.lost_race(approval_id).await);
                }

                self.resolve_step(
                    approval_id,
                    stage_id,
                    StepAction::Approved,
                    acted_by,
                    acted_at,
                    comment,
                )
                .await?;
                self.steps
                    .insert_pending(approval_id, next_stage_id)
                    .await?;

                debug!(
                    approval_id = %approval_id,
                    next_stage_index,
                    "approval advanced to next stage"
                );

                let propagation = self
                    .propagate(approval.payment_id, stage_payment_status, stage_invoice_status)
                    .await;
                (false, propagation)
            }
            ApprovalAction::Complete {
                stage_id,
                acted_by,
                acted_at,
                comment,
                stage_payment_status,
                stage_invoice_status,
                payment_status,
                invoice_status,
            } => {
                let won = self
                    .processes
                    .finalize(
                        approval_id,
                        approval.current_stage_index,
                        ProcessStatus::Approved,
                    )
                    .await?;
                if !won {
                    return Err(self.lost_race(approval_id).await);
                }

                self.resolve_step(
                    approval_id,
                    stage_id,
                    StepAction::Approved,
                    acted_by,
                    acted_at,
                    comment,
                )
                .await?;

                debug!(approval_id = %approval_id, "approval process completed");

                // Stage-declared statuses apply first, then the terminal
                // ones; the first failure wins.
                let propagation = match self
                    .propagate(approval.payment_id, stage_payment_status, stage_invoice_status)
                    .await
                {
                    Some(err) => Some(err),
                    None => {
                        self.propagate(
                            approval.payment_id,
                            Some(payment_status),
                            Some(invoice_status),
                        )
                        .await
                    }
                };
                (true, propagation)
            }
        };

        let approval = self.refetch(approval_id).await?;
        Ok(ApproveOutcome {
            approval,
            completed,
            propagation,
        })
    }

    /// Rejects the current stage of a process, terminally.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The comment is empty or whitespace-only
    /// - The process is not found or not pending
    /// - The route no longer contains the current stage
    /// - A store write fails
    pub async fn reject(
        &self,
        approval_id: Uuid,
        acted_by: Uuid,
        comment: String,
    ) -> Result<RejectOutcome, WorkflowError> {
        let approval = self
            .processes
            .get(approval_id)
            .await?
            .ok_or(WorkflowError::ProcessNotFound(approval_id))?;
        let status = parse_status(&approval)?;
        let route = self.load_route(&approval).await?;

        self.repair_missing_step(&approval, status, &route).await?;

        let action = ApprovalService::reject(
            status,
            approval.current_stage_index,
            &route,
            acted_by,
            comment,
        )?;

        let won = self
            .processes
            .finalize(
                approval_id,
                approval.current_stage_index,
                ProcessStatus::Rejected,
            )
            .await?;
        if !won {
            return Err(self.lost_race(approval_id).await);
        }

        self.resolve_step(
            approval_id,
            action.stage_id,
            StepAction::Rejected,
            action.acted_by,
            action.acted_at,
            Some(action.comment),
        )
        .await?;

        debug!(approval_id = %approval_id, "approval process rejected");

        let propagation = self
            .propagate(
                approval.payment_id,
                Some(action.payment_status),
                Some(action.invoice_status),
            )
            .await;

        let approval = self.refetch(approval_id).await?;
        Ok(RejectOutcome {
            approval,
            propagation,
        })
    }

    /// Returns the permissions granted at the process's current stage,
    /// or the empty set when the process is no longer pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the process is not found or the route no
    /// longer contains the current stage.
    pub async fn current_stage_permissions(
        &self,
        approval_id: Uuid,
    ) -> Result<StagePermissions, WorkflowError> {
        let approval = self
            .processes
            .get(approval_id)
            .await?
            .ok_or(WorkflowError::ProcessNotFound(approval_id))?;
        let status = parse_status(&approval)?;

        if status != ProcessStatus::Pending {
            return Ok(StagePermissions::default());
        }

        let route = self.load_route(&approval).await?;
        ApprovalService::current_stage_permissions(status, approval.current_stage_index, &route)
    }

    /// Returns the payment's most recent process with its steps ordered
    /// by stage `order_index`, or `None` when the payment was never
    /// routed for approval.
    ///
    /// Reading is self-healing: a pending process missing the step for
    /// its current stage gets it re-inserted here.
    pub async fn history(&self, payment_id: Uuid) -> Result<Option<ApprovalHistory>, WorkflowError> {
        let Some(approval) = self.processes.latest_for_payment(payment_id).await? else {
            return Ok(None);
        };
        let status = parse_status(&approval)?;

        let route = self.routes.get_route(approval.route_id).await?;
        if let Some(route) = route.as_ref() {
            self.repair_missing_step(&approval, status, route).await?;
        }

        let mut steps = self.steps.list_for_approval(approval.id).await?;
        if let Some(route) = route.as_ref() {
            let order: HashMap<i32, i32> = route
                .stages
                .iter()
                .map(|s| (s.id, s.order_index))
                .collect();
            steps.sort_by_key(|s| order.get(&s.stage_id).copied().unwrap_or(i32::MAX));
        }

        Ok(Some(ApprovalHistory { approval, steps }))
    }

    /// Checks whether a payment is mid-review, without loading history.
    pub async fn is_under_review(&self, payment_id: Uuid) -> Result<ReviewStatus, WorkflowError> {
        let approval = self.processes.pending_for_payment(payment_id).await?;
        Ok(ReviewStatus {
            under_review: approval.is_some(),
            approval,
        })
    }

    /// Lists pending processes whose current stage is owned by a role.
    ///
    /// Project-scoped visibility (`own_projects_only`) is the caller's
    /// concern; this returns the full role queue.
    pub async fn pending_for_role(
        &self,
        role_id: i32,
    ) -> Result<Vec<PendingApproval>, WorkflowError> {
        let pending = self.processes.list_pending().await?;

        let mut result = Vec::new();
        for approval in pending {
            let Some(route) = self.routes.get_route(approval.route_id).await? else {
                warn!(approval_id = %approval.id, "pending process references a missing route");
                continue;
            };
            let Some(stage) = route.stage_at(approval.current_stage_index) else {
                warn!(
                    approval_id = %approval.id,
                    stage_index = approval.current_stage_index,
                    "pending process points at a missing stage"
                );
                continue;
            };

            if stage.role_id == role_id {
                result.push(PendingApproval {
                    stage: stage.clone(),
                    approval,
                });
            }
        }

        Ok(result)
    }

    /// Approves multiple processes, one at a time.
    ///
    /// Failures are captured per item and never abort the batch.
    pub async fn bulk_approve(
        &self,
        approval_ids: Vec<Uuid>,
        acted_by: Uuid,
        comment: Option<String>,
    ) -> Result<BulkActionResult, WorkflowError> {
        let mut results = Vec::with_capacity(approval_ids.len());
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_amount = Decimal::ZERO;

        for approval_id in approval_ids {
            match self.approve(approval_id, acted_by, comment.clone()).await {
                Ok(outcome) => {
                    success_count += 1;
                    total_amount += self.payment_amount(outcome.approval.payment_id).await?;
                    results.push(BulkActionItem {
                        approval_id,
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    failure_count += 1;
                    results.push(BulkActionItem {
                        approval_id,
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(BulkActionResult {
            results,
            success_count,
            failure_count,
            total_amount,
        })
    }

    /// Rejects multiple processes, one at a time.
    ///
    /// An empty comment fails every item up front without touching any
    /// process.
    pub async fn bulk_reject(
        &self,
        approval_ids: Vec<Uuid>,
        acted_by: Uuid,
        comment: String,
    ) -> Result<BulkActionResult, WorkflowError> {
        if comment.trim().is_empty() {
            let results: Vec<BulkActionItem> = approval_ids
                .iter()
                .map(|&approval_id| BulkActionItem {
                    approval_id,
                    success: false,
                    error: Some(WorkflowError::CommentRequired.to_string()),
                })
                .collect();
            return Ok(BulkActionResult {
                failure_count: results.len(),
                success_count: 0,
                results,
                total_amount: Decimal::ZERO,
            });
        }

        let mut results = Vec::with_capacity(approval_ids.len());
        let mut success_count = 0;
        let mut failure_count = 0;
        let mut total_amount = Decimal::ZERO;

        for approval_id in approval_ids {
            match self.reject(approval_id, acted_by, comment.clone()).await {
                Ok(outcome) => {
                    success_count += 1;
                    total_amount += self.payment_amount(outcome.approval.payment_id).await?;
                    results.push(BulkActionItem {
                        approval_id,
                        success: true,
                        error: None,
                    });
                }
                Err(e) => {
                    failure_count += 1;
                    results.push(BulkActionItem {
                        approval_id,
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        Ok(BulkActionResult {
            results,
            success_count,
            failure_count,
            total_amount,
        })
    }

    // ========================================================================
    // Helper methods
    // ========================================================================

    /// Loads the route a process is traversing.
    ///
    /// A deleted route surfaces as `StageNotFound` at the current index:
    /// the stage list no longer contains it.
    async fn load_route(
        &self,
        approval: &payment_approvals::Model,
    ) -> Result<ApprovalRoute, WorkflowError> {
        self.routes
            .get_route(approval.route_id)
            .await?
            .ok_or(WorkflowError::StageNotFound {
                route_id: approval.route_id,
                stage_index: approval.current_stage_index,
            })
    }

    /// Re-inserts the pending step for the current stage when it is
    /// missing.
    ///
    /// A pending process with no step at its current stage is the
    /// footprint of a crash between the process write and the step
    /// write; the gap is repaired on read.
    async fn repair_missing_step(
        &self,
        approval: &payment_approvals::Model,
        status: ProcessStatus,
        route: &ApprovalRoute,
    ) -> Result<(), WorkflowError> {
        if status != ProcessStatus::Pending {
            return Ok(());
        }
        let Some(stage) = route.stage_at(approval.current_stage_index) else {
            return Ok(());
        };

        if self.steps.find(approval.id, stage.id).await?.is_none() {
            warn!(
                approval_id = %approval.id,
                stage_id = stage.id,
                "repairing missing pending step"
            );
            self.steps.insert_pending(approval.id, stage.id).await?;
        }

        Ok(())
    }

    /// Resolves a step, tolerating an already-resolved row.
    async fn resolve_step(
        &self,
        approval_id: Uuid,
        stage_id: i32,
        action: StepAction,
        acted_by: Uuid,
        acted_at: DateTime<Utc>,
        comment: Option<String>,
    ) -> Result<(), WorkflowError> {
        let resolved = self
            .steps
            .resolve(approval_id, stage_id, action, acted_by, acted_at, comment)
            .await?;
        if !resolved {
            warn!(
                approval_id = %approval_id,
                stage_id,
                "step was not pending at resolution time"
            );
        }
        Ok(())
    }

    /// Builds the error for a lost compare-and-set race.
    async fn lost_race(&self, approval_id: Uuid) -> WorkflowError {
        let status = match self.processes.get(approval_id).await {
            Ok(Some(model)) => ProcessStatus::parse(&model.status).unwrap_or(ProcessStatus::Pending),
            _ => ProcessStatus::Pending,
        };
        WorkflowError::ProcessNotPending { status }
    }

    /// Re-reads a process after a transition.
    async fn refetch(
        &self,
        approval_id: Uuid,
    ) -> Result<payment_approvals::Model, WorkflowError> {
        self.processes
            .get(approval_id)
            .await?
            .ok_or(WorkflowError::ProcessNotFound(approval_id))
    }

    /// Propagates statuses to the payment and its parent invoice.
    ///
    /// Runs strictly after the process/step pair has committed. A
    /// failure is logged and returned for the outcome, never rolled
    /// back: status can always be re-derived from the process state by
    /// a repair pass.
    async fn propagate(
        &self,
        payment_id: Uuid,
        payment_status: Option<PaymentStatus>,
        invoice_status: Option<InvoiceStatus>,
    ) -> Option<PropagationError> {
        if payment_status.is_none() && invoice_status.is_none() {
            return None;
        }

        if let Some(status) = payment_status {
            if let Err(e) = self.propagator.set_payment_status(payment_id, status).await {
                warn!(payment_id = %payment_id, error = %e, "payment status propagation failed");
                return Some(e);
            }
        }

        if let Some(status) = invoice_status {
            let invoice_id = match self.payment_invoice(payment_id).await {
                Ok(Some(invoice_id)) => invoice_id,
                Ok(None) => {
                    let e = PropagationError::PaymentNotFound(payment_id);
                    warn!(payment_id = %payment_id, error = %e, "invoice status propagation failed");
                    return Some(e);
                }
                Err(e) => {
                    warn!(payment_id = %payment_id, error = %e, "invoice status propagation failed");
                    return Some(e);
                }
            };

            if let Err(e) = self.propagator.set_invoice_status(invoice_id, status).await {
                warn!(invoice_id = %invoice_id, error = %e, "invoice status propagation failed");
                return Some(e);
            }
        }

        None
    }

    /// Resolves the parent invoice of a payment.
    async fn payment_invoice(&self, payment_id: Uuid) -> Result<Option<Uuid>, PropagationError> {
        payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await
            .map_err(|e| PropagationError::Database(e.to_string()))
            .map(|payment| payment.map(|p| p.invoice_id))
    }

    /// Reads a payment's amount, zero when the row is gone.
    async fn payment_amount(&self, payment_id: Uuid) -> Result<Decimal, WorkflowError> {
        let amount = payments::Entity::find_by_id(payment_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?
            .map_or(Decimal::ZERO, |p| p.amount);
        Ok(amount)
    }
}
