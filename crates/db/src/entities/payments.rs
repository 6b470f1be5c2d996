//! `SeaORM` Entity for payments.
//!
//! Payments are owned by the excluded CRUD layer; the workflow engine
//! reads the invoice linkage and amount and writes the status field.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub payment_number: i32,
    pub amount: Decimal,
    pub status_id: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::invoices::Entity",
        from = "Column::InvoiceId",
        to = "super::invoices::Column::Id"
    )]
    Invoices,
    #[sea_orm(
        belongs_to = "super::payment_statuses::Entity",
        from = "Column::StatusId",
        to = "super::payment_statuses::Column::Id"
    )]
    PaymentStatuses,
    #[sea_orm(has_many = "super::payment_approvals::Entity")]
    PaymentApprovals,
}

impl Related<super::invoices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl Related<super::payment_statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentStatuses.def()
    }
}

impl Related<super::payment_approvals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PaymentApprovals.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
