//! Repository abstractions for the approval workflow.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. The `ApprovalRepository` is the workflow engine proper;
//! the others are the narrow store accessors it orchestrates.

pub mod approval;
pub mod process;
pub mod propagation;
pub mod route;
pub mod step;

pub use approval::{
    ApprovalHistory, ApprovalRepository, ApproveOutcome, BulkActionItem, BulkActionResult,
    PendingApproval, RejectOutcome, ReviewStatus, StartOutcome,
};
pub use process::ProcessStore;
pub use propagation::{DbStatusPropagator, PropagationError, StatusPropagator};
pub use route::RouteRepository;
pub use step::StepLedger;
