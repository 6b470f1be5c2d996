//! Workflow domain types for the payment approval state machine.
//!
//! This module defines the process and step statuses, the status codes
//! propagated to payments and invoices, stage permission flags, and the
//! action types produced by the approval service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Overall status of an approval process.
///
/// A process starts `pending` at stage 0 and moves through its route's
/// stages. The valid transitions are:
/// - Pending → Pending (approve, next stage exists)
/// - Pending → Approved (approve, last stage)
/// - Pending → Rejected (reject, any stage)
///
/// `Approved` and `Rejected` are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    /// The process is waiting on the current stage's owner.
    Pending,
    /// All stages approved the payment (terminal).
    Approved,
    /// Some stage rejected the payment (terminal).
    Rejected,
}

impl ProcessStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the process can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action recorded on an approval step.
///
/// A step is created `pending` the moment its stage is entered and is
/// resolved exactly once to `approved` or `rejected`; it is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepAction {
    /// The stage owner has not acted yet.
    Pending,
    /// The stage owner approved.
    Approved,
    /// The stage owner rejected.
    Rejected,
}

impl StepAction {
    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true if the step has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment status codes propagated by the workflow engine.
///
/// These are dictionary codes, resolved to status rows by the persistence
/// layer. An unresolvable code is a propagation failure, never a silently
/// substituted default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment created, not yet routed for approval.
    Created,
    /// Payment is traversing an approval route.
    UnderReview,
    /// Fully approved, released for payment.
    ApprovedForPayment,
    /// Payment executed.
    Paid,
    /// Rejected or withdrawn.
    Cancelled,
}

impl PaymentStatus {
    /// Returns the dictionary code for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::UnderReview => "under_review",
            Self::ApprovedForPayment => "approved_for_payment",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its dictionary code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "under_review" => Some(Self::UnderReview),
            "approved_for_payment" => Some(Self::ApprovedForPayment),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Invoice status codes propagated by the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Invoice created.
    Created,
    /// A payment of this invoice is under approval.
    UnderReview,
    /// Approved, awaiting payment.
    ApprovedForPayment,
    /// Partially covered by executed payments.
    PartiallyPaid,
    /// Fully paid.
    Paid,
    /// Cancelled.
    Cancelled,
}

impl InvoiceStatus {
    /// Returns the dictionary code for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::UnderReview => "under_review",
            Self::ApprovedForPayment => "approved_for_payment",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from its dictionary code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "created" => Some(Self::Created),
            "under_review" => Some(Self::UnderReview),
            "approved_for_payment" => Some(Self::ApprovedForPayment),
            "partially_paid" => Some(Self::PartiallyPaid),
            "paid" => Some(Self::Paid),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permission flags granted to the acting role while a process sits at
/// a stage.
///
/// Callers use these to gate edits to the payment and its invoice during
/// review. All flags default to false; a stage with no permission set
/// grants nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagePermissions {
    /// The role may edit the payment amount.
    #[serde(default)]
    pub can_edit_amount: bool,
    /// The role may edit the payment date.
    #[serde(default)]
    pub can_edit_date: bool,
    /// The role may attach files to the payment.
    #[serde(default)]
    pub can_add_files: bool,
    /// The role may edit the payment description.
    #[serde(default)]
    pub can_edit_description: bool,
}

impl StagePermissions {
    /// Returns true if no permission is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of validating a `StartProcess` request.
///
/// Carries the first stage to enter and the statuses to propagate once
/// the process and its first step are durably written.
#[derive(Debug, Clone)]
pub struct StartAction {
    /// The stage at `order_index` 0, entered by the new process.
    pub first_stage_id: i32,
    /// Status to propagate to the payment.
    pub payment_status: PaymentStatus,
    /// Status to propagate to the parent invoice.
    pub invoice_status: InvoiceStatus,
}

/// State transition produced by `Approve`, with audit data.
///
/// The persistence layer executes the transition in a fixed order:
/// compare-and-set on the process row, step resolution, next step
/// insertion (Advance only), then status propagation.
#[derive(Debug, Clone)]
pub enum ApprovalAction {
    /// The current stage approved and a later stage exists.
    Advance {
        /// The stage that was just approved.
        stage_id: i32,
        /// `order_index` of the next stage.
        next_stage_index: i32,
        /// Id of the next stage, for the new pending step.
        next_stage_id: i32,
        /// The approving user.
        acted_by: Uuid,
        /// When the approval happened.
        acted_at: DateTime<Utc>,
        /// Optional approver comment.
        comment: Option<String>,
        /// Stage-declared payment status, applied on approval.
        stage_payment_status: Option<PaymentStatus>,
        /// Stage-declared invoice status, applied on approval.
        stage_invoice_status: Option<InvoiceStatus>,
    },
    /// The last stage approved; the process is complete.
    Complete {
        /// The stage that was just approved.
        stage_id: i32,
        /// The approving user.
        acted_by: Uuid,
        /// When the approval happened.
        acted_at: DateTime<Utc>,
        /// Optional approver comment.
        comment: Option<String>,
        /// Stage-declared payment status, applied before the terminal one.
        stage_payment_status: Option<PaymentStatus>,
        /// Stage-declared invoice status, applied before the terminal one.
        stage_invoice_status: Option<InvoiceStatus>,
        /// Terminal payment status for a fully approved process.
        payment_status: PaymentStatus,
        /// Terminal invoice status for a fully approved process.
        invoice_status: InvoiceStatus,
    },
}

impl ApprovalAction {
    /// Returns the id of the stage the action resolves.
    #[must_use]
    pub fn stage_id(&self) -> i32 {
        match self {
            Self::Advance { stage_id, .. } | Self::Complete { stage_id, .. } => *stage_id,
        }
    }

    /// Returns the process status after this action.
    #[must_use]
    pub fn new_process_status(&self) -> ProcessStatus {
        match self {
            Self::Advance { .. } => ProcessStatus::Pending,
            Self::Complete { .. } => ProcessStatus::Approved,
        }
    }
}

/// State transition produced by `Reject`, with audit data.
///
/// Rejection is always terminal: the process moves to `rejected` and no
/// later stage is ever visited.
#[derive(Debug, Clone)]
pub struct RejectAction {
    /// The stage that rejected.
    pub stage_id: i32,
    /// The rejecting user.
    pub acted_by: Uuid,
    /// When the rejection happened.
    pub acted_at: DateTime<Utc>,
    /// Mandatory rejection reason.
    pub comment: String,
    /// Terminal payment status for a rejected process.
    pub payment_status: PaymentStatus,
    /// Terminal invoice status for a rejected process.
    pub invoice_status: InvoiceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ProcessStatus::Pending, "pending")]
    #[case(ProcessStatus::Approved, "approved")]
    #[case(ProcessStatus::Rejected, "rejected")]
    fn test_process_status_round_trip(#[case] status: ProcessStatus, #[case] s: &str) {
        assert_eq!(status.as_str(), s);
        assert_eq!(ProcessStatus::parse(s), Some(status));
        assert_eq!(ProcessStatus::parse(&s.to_uppercase()), Some(status));
        assert_eq!(format!("{status}"), s);
    }

    #[test]
    fn test_process_status_parse_invalid() {
        assert_eq!(ProcessStatus::parse("waiting"), None);
        assert_eq!(ProcessStatus::parse(""), None);
    }

    #[test]
    fn test_process_status_terminal() {
        assert!(!ProcessStatus::Pending.is_terminal());
        assert!(ProcessStatus::Approved.is_terminal());
        assert!(ProcessStatus::Rejected.is_terminal());
    }

    #[rstest]
    #[case(StepAction::Pending, "pending", false)]
    #[case(StepAction::Approved, "approved", true)]
    #[case(StepAction::Rejected, "rejected", true)]
    fn test_step_action_round_trip(
        #[case] action: StepAction,
        #[case] s: &str,
        #[case] resolved: bool,
    ) {
        assert_eq!(action.as_str(), s);
        assert_eq!(StepAction::parse(s), Some(action));
        assert_eq!(action.is_resolved(), resolved);
    }

    #[rstest]
    #[case(PaymentStatus::Created, "created")]
    #[case(PaymentStatus::UnderReview, "under_review")]
    #[case(PaymentStatus::ApprovedForPayment, "approved_for_payment")]
    #[case(PaymentStatus::Paid, "paid")]
    #[case(PaymentStatus::Cancelled, "cancelled")]
    fn test_payment_status_round_trip(#[case] status: PaymentStatus, #[case] code: &str) {
        assert_eq!(status.as_str(), code);
        assert_eq!(PaymentStatus::parse(code), Some(status));
    }

    #[rstest]
    #[case(InvoiceStatus::Created, "created")]
    #[case(InvoiceStatus::UnderReview, "under_review")]
    #[case(InvoiceStatus::ApprovedForPayment, "approved_for_payment")]
    #[case(InvoiceStatus::PartiallyPaid, "partially_paid")]
    #[case(InvoiceStatus::Paid, "paid")]
    #[case(InvoiceStatus::Cancelled, "cancelled")]
    fn test_invoice_status_round_trip(#[case] status: InvoiceStatus, #[case] code: &str) {
        assert_eq!(status.as_str(), code);
        assert_eq!(InvoiceStatus::parse(code), Some(status));
    }

    #[test]
    fn test_payment_status_parse_invalid() {
        assert_eq!(PaymentStatus::parse("in_payment"), None);
        assert_eq!(InvoiceStatus::parse("3"), None);
    }

    #[test]
    fn test_permissions_default_empty() {
        let perms = StagePermissions::default();
        assert!(perms.is_empty());
        assert!(!perms.can_edit_amount);
        assert!(!perms.can_add_files);
    }

    #[test]
    fn test_permissions_from_json() {
        let perms: StagePermissions = serde_json::from_value(serde_json::json!({
            "can_edit_amount": true,
            "can_add_files": true
        }))
        .unwrap();

        assert!(perms.can_edit_amount);
        assert!(perms.can_add_files);
        assert!(!perms.can_edit_date);
        assert!(!perms.can_edit_description);
        assert!(!perms.is_empty());
    }

    #[test]
    fn test_permissions_ignore_unknown_keys() {
        let perms: StagePermissions = serde_json::from_value(serde_json::json!({
            "can_edit_date": true,
            "legacy_flag": true
        }))
        .unwrap();

        assert!(perms.can_edit_date);
    }
}
