//! Approval route and stage catalog types.
//!
//! Routes are created by administrators and are read-only to the engine.
//! A route binds an invoice type to an ordered list of role-owned stages;
//! stage order is a unique, gapless `order_index` starting at 0.

use serde::{Deserialize, Serialize};

use crate::workflow::types::{InvoiceStatus, PaymentStatus, StagePermissions};

/// One role-owned step within an approval route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Unique identifier for the stage.
    pub id: i32,
    /// The route this stage belongs to.
    pub route_id: i32,
    /// Position within the route, 0-based and gapless.
    pub order_index: i32,
    /// The role that owns decisions at this stage.
    pub role_id: i32,
    /// Optional human-readable stage name.
    pub name: Option<String>,
    /// Payment status applied when this stage approves.
    pub resulting_payment_status: Option<PaymentStatus>,
    /// Invoice status applied when this stage approves.
    pub resulting_invoice_status: Option<InvoiceStatus>,
    /// Permissions granted to the acting role while the process sits here.
    pub permissions: StagePermissions,
}

/// An ordered template of approval stages bound to one invoice type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRoute {
    /// Unique identifier for the route.
    pub id: i32,
    /// The invoice type this route governs.
    pub invoice_type_id: i32,
    /// Human-readable route name.
    pub name: String,
    /// Inactive routes are never matched for new processes.
    pub is_active: bool,
    /// Stages sorted by `order_index`.
    pub stages: Vec<Stage>,
}

impl ApprovalRoute {
    /// Resolves the stage at the given `order_index`.
    ///
    /// This is an explicit linear scan on every call rather than a cached
    /// pointer: routes can be edited between calls, and a dangling index
    /// must surface as a lookup miss, not undefined behavior.
    #[must_use]
    pub fn stage_at(&self, order_index: i32) -> Option<&Stage> {
        self.stages.iter().find(|s| s.order_index == order_index)
    }

    /// Returns the number of stages in the route.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the route has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
