//! Status propagation to payments and invoices.
//!
//! The workflow engine calls this component only after the core
//! process/step state has durably transitioned. Propagation failures
//! are a partial success: they are surfaced distinctly and never roll
//! the workflow state back, since status can always be re-derived from
//! the process.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use thiserror::Error;
use uuid::Uuid;

use payflow_core::workflow::{InvoiceStatus, PaymentStatus};

use crate::entities::{invoice_statuses, invoices, payment_statuses, payments};

/// Errors that can occur while propagating statuses.
///
/// An unresolvable status code is reported instead of being substituted
/// with a fallback id; a misconfigured dictionary must surface, not
/// guess.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The payment status code has no dictionary row.
    #[error("Payment status code '{code}' not found in dictionary")]
    UnknownPaymentStatus {
        /// The unresolved code.
        code: String,
    },

    /// The invoice status code has no dictionary row.
    #[error("Invoice status code '{code}' not found in dictionary")]
    UnknownInvoiceStatus {
        /// The unresolved code.
        code: String,
    },

    /// The payment row does not exist.
    #[error("Payment {0} not found")]
    PaymentNotFound(Uuid),

    /// The invoice row does not exist.
    #[error("Invoice {0} not found")]
    InvoiceNotFound(Uuid),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

/// Side-effect component that reflects stage outcomes onto the payment
/// and its parent invoice.
///
/// Isolated behind a trait so the engine can be exercised with a
/// recording fake and so a failed propagation can be retried
/// independently of the workflow transition that triggered it.
#[async_trait]
pub trait StatusPropagator: Send + Sync {
    /// Sets the payment's status to the given code.
    async fn set_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> Result<(), PropagationError>;

    /// Sets the invoice's status to the given code.
    async fn set_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), PropagationError>;
}

/// Propagator writing through to the payments/invoices tables.
#[derive(Debug, Clone)]
pub struct DbStatusPropagator {
    db: DatabaseConnection,
}

impl DbStatusPropagator {
    /// Creates a new database-backed propagator.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolves a payment status code to its dictionary id.
    async fn payment_status_id(&self, status: PaymentStatus) -> Result<i32, PropagationError> {
        payment_statuses::Entity::find()
            .filter(payment_statuses::Column::Code.eq(status.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| PropagationError::Database(e.to_string()))?
            .map(|row| row.id)
            .ok_or_else(|| PropagationError::UnknownPaymentStatus {
                code: status.as_str().to_string(),
            })
    }

    /// Resolves an invoice status code to its dictionary id.
    async fn invoice_status_id(&self, status: InvoiceStatus) -> Result<i32, PropagationError> {
        invoice_statuses::Entity::find()
            .filter(invoice_statuses::Column::Code.eq(status.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| PropagationError::Database(e.to_string()))?
            .map(|row| row.id)
            .ok_or_else(|| PropagationError::UnknownInvoiceStatus {
                code: status.as_str().to_string(),
            })
    }
}

#[async_trait]
impl StatusPropagator for DbStatusPropagator {
    async fn set_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
    ) -> Result<(), PropagationError> {
        let status_id = self.payment_status_id(status).await?;

        let result = payments::Entity::update_many()
            .col_expr(payments::Column::StatusId, Expr::value(status_id))
            .col_expr(
                payments::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(payments::Column::Id.eq(payment_id))
            .exec(&self.db)
            .await
            .map_err(|e| PropagationError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(PropagationError::PaymentNotFound(payment_id));
        }

        Ok(())
    }

    async fn set_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<(), PropagationError> {
        let status_id = self.invoice_status_id(status).await?;

        let result = invoices::Entity::update_many()
            .col_expr(invoices::Column::StatusId, Expr::value(status_id))
            .col_expr(
                invoices::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(invoices::Column::Id.eq(invoice_id))
            .exec(&self.db)
            .await
            .map_err(|e| PropagationError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(PropagationError::InvoiceNotFound(invoice_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagation_error_display() {
        let err = PropagationError::UnknownPaymentStatus {
            code: "approved_for_payment".to_string(),
        };
        assert!(err.to_string().contains("approved_for_payment"));

        let err = PropagationError::PaymentNotFound(Uuid::nil());
        assert!(err.to_string().contains("not found"));
    }
}
