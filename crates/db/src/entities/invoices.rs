//! `SeaORM` Entity for invoices.
//!
//! Invoices are owned by the excluded CRUD layer; the workflow engine
//! only reads the payment linkage and writes the status field.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub invoice_type_id: i32,
    pub status_id: i32,
    pub amount: Decimal,
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
    #[sea_orm(
        belongs_to = "super::invoice_statuses::Entity",
        from = "Column::StatusId",
        to = "super::invoice_statuses::Column::Id"
    )]
    InvoiceStatuses,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::invoice_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceTypes.def()
    }
}

impl Related<super::invoice_statuses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::InvoiceStatuses.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
