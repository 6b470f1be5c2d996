//! Approval step ledger.
//!
//! Append-mostly log of stage visits: one insert when a stage is
//! entered, one in-place update when its owner decides. A resolved step
//! is never reopened; the resolve update is guarded on `action =
//! 'pending'`.

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use payflow_core::workflow::{StepAction, WorkflowError};

use crate::entities::approval_steps;

/// Ledger for approval step rows.
#[derive(Debug, Clone)]
pub struct StepLedger {
    db: DatabaseConnection,
}

impl StepLedger {
    /// Creates a new step ledger.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records that a process entered a stage, as a pending step.
    pub async fn insert_pending(
        &self,
        approval_id: Uuid,
        stage_id: i32,
    ) -> Result<approval_steps::Model, WorkflowError> {
        let step = approval_steps::ActiveModel {
            id: Set(Uuid::new_v4()),
            approval_id: Set(approval_id),
            stage_id: Set(stage_id),
            action: Set(StepAction::Pending.as_str().to_string()),
            acted_by: Set(None),
            acted_at: Set(None),
            comment: Set(None),
            created_at: Set(Utc::now().into()),
        };

        step.insert(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Resolves a pending step to its terminal action, stamping actor,
    /// timestamp, and comment.
    ///
    /// Returns false when the step was already resolved; the one-way
    /// `pending → approved | rejected` transition is enforced here.
    pub async fn resolve(
        &self,
        approval_id: Uuid,
        stage_id: i32,
        action: StepAction,
        acted_by: Uuid,
        acted_at: DateTime<Utc>,
        comment: Option<String>,
    ) -> Result<bool, WorkflowError> {
        let result = approval_steps::Entity::update_many()
            .col_expr(approval_steps::Column::Action, Expr::value(action.as_str()))
            .col_expr(approval_steps::Column::ActedBy, Expr::value(acted_by))
            .col_expr(
                approval_steps::Column::ActedAt,
                Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(acted_at)),
            )
            .col_expr(approval_steps::Column::Comment, Expr::value(comment))
            .filter(approval_steps::Column::ApprovalId.eq(approval_id))
            .filter(approval_steps::Column::StageId.eq(stage_id))
            .filter(approval_steps::Column::Action.eq(StepAction::Pending.as_str()))
            .exec(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Fetches the step a process recorded for a stage, if any.
    pub async fn find(
        &self,
        approval_id: Uuid,
        stage_id: i32,
    ) -> Result<Option<approval_steps::Model>, WorkflowError> {
        approval_steps::Entity::find()
            .filter(approval_steps::Column::ApprovalId.eq(approval_id))
            .filter(approval_steps::Column::StageId.eq(stage_id))
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }

    /// Lists the steps of a process in insertion order.
    ///
    /// Chronological order matches stage order for a well-formed process;
    /// callers needing strict stage order sort against the route.
    pub async fn list_for_approval(
        &self,
        approval_id: Uuid,
    ) -> Result<Vec<approval_steps::Model>, WorkflowError> {
        approval_steps::Entity::find()
            .filter(approval_steps::Column::ApprovalId.eq(approval_id))
            .order_by_asc(approval_steps::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))
    }
}
