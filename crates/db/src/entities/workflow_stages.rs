//! `SeaORM` Entity for workflow stages.
//!
//! A stage belongs to exactly one route; order within the route is a
//! unique, gapless `order_index` starting at 0. Resulting statuses are
//! stored as dictionary codes, permissions as a JSON object.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "workflow_stages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub route_id: i32,
    pub order_index: i32,
    pub role_id: i32,
    pub name: Option<String>,
    pub resulting_payment_status: Option<String>,
    pub resulting_invoice_status: Option<String>,
    pub permissions: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::approval_routes::Entity",
        from = "Column::RouteId",
        to = "super::approval_routes::Column::Id"
    )]
    ApprovalRoutes,
    #[sea_orm(has_many = "super::approval_steps::Entity")]
    ApprovalSteps,
}

impl Related<super::approval_routes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalRoutes.def()
    }
}

impl Related<super::approval_steps::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ApprovalSteps.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
