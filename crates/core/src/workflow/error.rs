//! Workflow error types for the payment approval engine.

use thiserror::Error;
use uuid::Uuid;

use crate::workflow::types::ProcessStatus;

/// Errors that can occur during approval workflow operations.
///
/// Configuration errors (`NoRouteConfigured`, `NoStagesConfigured`,
/// `StageNotFound`, `InvalidStatusCode`) are administrative mistakes and
/// are always reported, never auto-retried. Concurrency errors
/// (`ProcessAlreadyExists`, `ProcessNotPending`) are expected under
/// concurrent use and are safe to surface as "already handled".
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No active approval route exists for the invoice type.
    #[error("No active approval route configured for invoice type {invoice_type_id}")]
    NoRouteConfigured {
        /// The invoice type without a route.
        invoice_type_id: i32,
    },

    /// The matched route has no stages.
    #[error("Approval route {route_id} has no stages configured")]
    NoStagesConfigured {
        /// The route without stages.
        route_id: i32,
    },

    /// The route no longer contains a stage at the process's current index.
    #[error("Stage at index {stage_index} not found in route {route_id}")]
    StageNotFound {
        /// The route that was searched.
        route_id: i32,
        /// The dangling stage index.
        stage_index: i32,
    },

    /// A still-pending approval process already exists for the payment.
    #[error("An approval process is already running for payment {payment_id}")]
    ProcessAlreadyExists {
        /// The payment with a running process.
        payment_id: Uuid,
    },

    /// The process has already been resolved.
    #[error("Approval process is not pending (status: {status})")]
    ProcessNotPending {
        /// The process's actual status.
        status: ProcessStatus,
    },

    /// Approval process not found.
    #[error("Approval process {0} not found")]
    ProcessNotFound(Uuid),

    /// A rejection requires a non-empty comment.
    #[error("A comment is required to reject a payment")]
    CommentRequired,

    /// A stage carries a status code missing from the dictionary.
    #[error("Unknown status code in stage configuration: {code}")]
    InvalidStatusCode {
        /// The unparseable code.
        code: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl WorkflowError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::CommentRequired => 400,

            Self::NoRouteConfigured { .. } | Self::ProcessNotFound(_) => 404,

            Self::ProcessAlreadyExists { .. } | Self::ProcessNotPending { .. } => 409,

            Self::NoStagesConfigured { .. }
            | Self::StageNotFound { .. }
            | Self::InvalidStatusCode { .. } => 422,

            Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoRouteConfigured { .. } => "NO_ROUTE_CONFIGURED",
            Self::NoStagesConfigured { .. } => "NO_STAGES_CONFIGURED",
            Self::StageNotFound { .. } => "STAGE_NOT_FOUND",
            Self::ProcessAlreadyExists { .. } => "PROCESS_ALREADY_EXISTS",
            Self::ProcessNotPending { .. } => "PROCESS_NOT_PENDING",
            Self::ProcessNotFound(_) => "PROCESS_NOT_FOUND",
            Self::CommentRequired => "COMMENT_REQUIRED",
            Self::InvalidStatusCode { .. } => "INVALID_STATUS_CODE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_route_configured_error() {
        let err = WorkflowError::NoRouteConfigured { invoice_type_id: 3 };
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "NO_ROUTE_CONFIGURED");
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_no_stages_configured_error() {
        let err = WorkflowError::NoStagesConfigured { route_id: 5 };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "NO_STAGES_CONFIGURED");
    }

    #[test]
    fn test_stage_not_found_error() {
        let err = WorkflowError::StageNotFound {
            route_id: 5,
            stage_index: 2,
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "STAGE_NOT_FOUND");
        assert!(err.to_string().contains("index 2"));
    }

    #[test]
    fn test_process_already_exists_error() {
        let err = WorkflowError::ProcessAlreadyExists {
            payment_id: Uuid::nil(),
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "PROCESS_ALREADY_EXISTS");
    }

    #[test]
    fn test_process_not_pending_error() {
        let err = WorkflowError::ProcessNotPending {
            status: ProcessStatus::Approved,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "PROCESS_NOT_PENDING");
        assert!(err.to_string().contains("approved"));
    }

    #[test]
    fn test_comment_required_error() {
        let err = WorkflowError::CommentRequired;
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "COMMENT_REQUIRED");
    }

    #[test]
    fn test_process_not_found_error() {
        let err = WorkflowError::ProcessNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "PROCESS_NOT_FOUND");
    }

    #[test]
    fn test_invalid_status_code_error() {
        let err = WorkflowError::InvalidStatusCode {
            code: "in_payment".to_string(),
        };
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_STATUS_CODE");
        assert!(err.to_string().contains("in_payment"));
    }
}
