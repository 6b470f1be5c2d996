//! Approval process store.
//!
//! Persists one `payment_approvals` row per approval run. The process
//! row is the only resource requiring compare-and-set discipline: the
//! guarded writes below filter on the expected status and stage index
//! so that of two concurrent resolutions exactly one wins.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use payflow_core::workflow::{ProcessStatus, WorkflowError};

use crate::entities::payment_approvals;

/// Store for approval process rows.
#[derive(Debug, Clone)]
pub struct ProcessStore {
    db: DatabaseConnection,
}

impl ProcessStore {
    /// Creates a new process store.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a fresh process at stage 0 with status `pending`.
    pub async fn insert(
        &self,
        payment_id: Uuid,
        route_id: i32,
        started_by: Uuid,
    ) -> Result<payment_approvals::Model, WorkflowError> {
        let now = Utc::now().into();
        let process = payment_approvals::ActiveModel {
            id: Set(Uuid::new_v4()),
            payment_id: Set(payment_id),
            route_id: Set(route_id),
            current_stage_index: Set(0),
            status: Set(ProcessStatus::Pending.as_str().to_string()),
            started_by: Set(started_by),
            created_at: Set(now),
            updated_at: Set(now),
        };

        process
            .insert(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Fetches a process by id.
    pub async fn get(
        &self,
        approval_id: Uuid,
    ) -> Result<Option<payment_approvals::Model>, WorkflowError> {
        payment_approvals::Entity::find_by_id(approval_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Fetches the most recent process for a payment, by creation order.
    pub async fn latest_for_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<payment_approvals::Model>, WorkflowError> {
        payment_approvals::Entity::find()
            .filter(payment_approvals::Column::PaymentId.eq(payment_id))
            .order_by_desc(payment_approvals::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Fetches the pending process for a payment, if one is running.
    pub async fn pending_for_payment(
        &self,
        payment_id: Uuid,
    ) -> Result<Option<payment_approvals::Model>, WorkflowError> {
        payment_approvals::Entity::find()
            .filter(payment_approvals::Column::PaymentId.eq(payment_id))
            .filter(payment_approvals::Column::Status.eq(ProcessStatus::Pending.as_str()))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Lists all pending processes, newest first.
    pub async fn list_pending(&self) -> Result<Vec<payment_approvals::Model>, WorkflowError> {
        payment_approvals::Entity::find()
            .filter(payment_approvals::Column::Status.eq(ProcessStatus::Pending.as_str()))
            .order_by_desc(payment_approvals::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Advances a pending process to the next stage index.
    ///
    /// Compare-and-set: the update only applies while the process is
    /// still pending at `expected_stage_index`. Returns false when the
    /// guard missed, meaning a concurrent call resolved the stage first.
    pub async fn advance(
        &self,
        approval_id: Uuid,
        expected_stage_index: i32,
        next_stage_index: i32,
    ) -> Result<bool, WorkflowError> {
        let result = payment_approvals::Entity::update_many()
            .col_expr(
                payment_approvals::Column::CurrentStageIndex,
                Expr::value(next_stage_index),
            )
            .col_expr(
                payment_approvals::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(payment_approvals::Column::Id.eq(approval_id))
            .filter(payment_approvals::Column::Status.eq(ProcessStatus::Pending.as_str()))
            .filter(payment_approvals::Column::CurrentStageIndex.eq(expected_stage_index))
            .exec(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Moves a pending process to a terminal status.
    ///
    /// Compare-and-set with the same guard as [`Self::advance`].
    pub async fn finalize(
        &self,
        approval_id: Uuid,
        expected_stage_index: i32,
        status: ProcessStatus,
    ) -> Result<bool, WorkflowError> {
        let result = payment_approvals::Entity::update_many()
            .col_expr(
                payment_approvals::Column::Status,
                Expr::value(status.as_str()),
            )
            .col_expr(
                payment_approvals::Column::UpdatedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(Utc::now())),
            )
            .filter(payment_approvals::Column::Id.eq(approval_id))
            .filter(payment_approvals::Column::Status.eq(ProcessStatus::Pending.as_str()))
            .filter(payment_approvals::Column::CurrentStageIndex.eq(expected_stage_index))
            .exec(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }
}

/// Parses a stored process status, reporting corruption instead of
/// guessing.
pub(crate) fn parse_status(model: &payment_approvals::Model) -> Result<ProcessStatus, WorkflowError> {
    ProcessStatus::parse(&model.status).ok_or_else(|| {
        WorkflowError::Database(format!(
            "Process {} has unknown status '{}'",
            model.id, model.status
        ))
    })
}
