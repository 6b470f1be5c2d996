//! `SeaORM` Entity for approval routes.
//!
//! Routes are created by administrators and are read-only to the engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "approval_routes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub invoice_type_id: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoice_types::Entity",
        from = "Column::InvoiceTypeId",
        to = "super::invoice_types::Column::Id"
    )]
    InvoiceTypes,
    #[sea_orm(has_many = "super::workflow_stages::Entity")]
    WorkflowStages,
    #[sea_orm(has_many = "super::payment_approvals::Entity")]
    PaymentApprovals,
}

impl Related<super::invoice_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceTypes.def()
    }
}

impl Related<super::workflow_stages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkflowStages.def()
    }
}

impl Related<super::payment_approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentApprovals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
