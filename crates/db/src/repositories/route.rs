//! Route catalog access.
//!
//! Loads approval routes and their stages into the typed core
//! representation. Routes are immutable within a single engine call:
//! each operation loads them once and treats the result as a snapshot.

use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use payflow_core::workflow::{
    ApprovalRoute, InvoiceStatus, PaymentStatus, Stage, StagePermissions, WorkflowError,
};

use crate::entities::{approval_routes, workflow_stages};

/// Repository for approval route lookups.
#[derive(Debug, Clone)]
pub struct RouteRepository {
    db: DatabaseConnection,
}

impl RouteRepository {
    /// Creates a new route repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Loads the active approval route for an invoice type, with its
    /// stages ordered by `order_index`.
    ///
    /// When administrators have misconfigured several active routes for
    /// one invoice type, the first by name wins, matching the catalog's
    /// display order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stage configuration
    /// cannot be parsed.
    pub async fn get_active_route(
        &self,
        invoice_type_id: i32,
    ) -> Result<Option<ApprovalRoute>, WorkflowError> {
        let route = approval_routes::Entity::find()
            .filter(approval_routes::Column::InvoiceTypeId.eq(invoice_type_id))
            .filter(approval_routes::Column::IsActive.eq(true))
            .order_by_asc(approval_routes::Column::Name)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        match route {
            Some(route) => Ok(Some(self.load_stages(route).await?)),
            None => Ok(None),
        }
    }

    /// Loads a route by id regardless of its active flag.
    ///
    /// Running processes keep traversing a route that was deactivated
    /// mid-flight; only new processes are blocked by deactivation.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the stage configuration
    /// cannot be parsed.
    pub async fn get_route(&self, route_id: i32) -> Result<Option<ApprovalRoute>, WorkflowError> {
        let route = approval_routes::Entity::find_by_id(route_id)
            .one(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        match route {
            Some(route) => Ok(Some(self.load_stages(route).await?)),
            None => Ok(None),
        }
    }

    /// Attaches the ordered stage list to a route row.
    async fn load_stages(
        &self,
        route: approval_routes::Model,
    ) -> Result<ApprovalRoute, WorkflowError> {
        let stages = workflow_stages::Entity::find()
            .filter(workflow_stages::Column::RouteId.eq(route.id))
            .order_by_asc(workflow_stages::Column::OrderIndex)
            .all(&self.db)
            .await
            .map_err(|e| WorkflowError::Database(e.to_string()))?;

        let stages = stages
            .into_iter()
            .map(stage_to_core)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ApprovalRoute {
            id: route.id,
            invoice_type_id: route.invoice_type_id,
            name: route.name,
            is_active: route.is_active,
            stages,
        })
    }
}

/// Converts a stage row into the typed core representation.
///
/// Unknown status codes and malformed permission JSON are reported as
/// configuration errors rather than silently defaulted.
fn stage_to_core(model: workflow_stages::Model) -> Result<Stage, WorkflowError> {
    let resulting_payment_status = model
        .resulting_payment_status
        .as_deref()
        .map(|code| {
            PaymentStatus::parse(code).ok_or_else(|| WorkflowError::InvalidStatusCode {
                code: code.to_string(),
            })
        })
        .transpose()?;

    let resulting_invoice_status = model
        .resulting_invoice_status
        .as_deref()
        .map(|code| {
            InvoiceStatus::parse(code).ok_or_else(|| WorkflowError::InvalidStatusCode {
                code: code.to_string(),
            })
        })
        .transpose()?;

    let permissions = match model.permissions {
        Some(json) => serde_json::from_value::<StagePermissions>(json).map_err(|e| {
            WorkflowError::Database(format!("Invalid permissions JSON for stage {}: {e}", model.id))
        })?,
        None => StagePermissions::default(),
    };

    Ok(Stage {
        id: model.id,
        route_id: model.route_id,
        order_index: model.order_index,
        role_id: model.role_id,
        name: model.name,
        resulting_payment_status,
        resulting_invoice_status,
        permissions,
    })
}
