//! `SeaORM` Entity for approval steps.
//!
//! One row per stage actually visited by a process, unique on
//! `(approval_id, stage_id)`. Created `pending` when the stage is
//! entered, resolved in place exactly once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_steps")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub approval_id: Uuid,
    pub stage_id: i32,
    pub action: String,
    pub acted_by: Option<Uuid>,
    pub acted_at: Option<DateTimeWithTimeZone>,
    pub comment: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payment_approvals::Entity",
        from = "Column::ApprovalId",
        to = "super::payment_approvals::Column::Id"
    )]
    PaymentApprovals,
    #[sea_orm(
        belongs_to = "super::workflow_stages::Entity",
        from = "Column::StageId",
        to = "super::workflow_stages::Column::Id"
    )]
    WorkflowStages,
}

impl Related<super::payment_approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentApprovals.def()
    }
}

impl Related<super::workflow_stages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkflowStages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
