//! Database layer with `SeaORM` entities and workflow repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the approval workflow schema
//! - Repository abstractions for route catalog, process store, step
//!   ledger, and status propagation
//! - The `ApprovalRepository` workflow engine orchestration
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{ApprovalRepository, RouteRepository};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
