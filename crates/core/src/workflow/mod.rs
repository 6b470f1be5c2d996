//! Multi-stage payment approval workflow for Payflow.
//!
//! This module implements the approval process state machine: a payment
//! traverses the ordered stages of an approval route, each stage owned
//! by a role, until the last stage approves it or any stage rejects it.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (statuses, actions, permissions)
//! - `route` - Approval route and stage catalog types
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic

pub mod error;
pub mod route;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use route::{ApprovalRoute, Stage};
pub use service::ApprovalService;
pub use types::{
    ApprovalAction, InvoiceStatus, PaymentStatus, ProcessStatus, RejectAction, StagePermissions,
    StartAction, StepAction,
};
