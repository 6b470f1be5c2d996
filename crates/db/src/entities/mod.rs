//! `SeaORM` entity definitions for the approval workflow schema.

pub mod approval_routes;
pub mod approval_steps;
pub mod invoice_statuses;
pub mod invoice_types;
pub mod invoices;
pub mod payment_approvals;
pub mod payment_statuses;
pub mod payments;
pub mod workflow_stages;
