//! Workflow migration: approval routes, stages, processes, and steps.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(WORKFLOW_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(
            "DROP TABLE IF EXISTS approval_steps CASCADE;
             DROP TABLE IF EXISTS payment_approvals CASCADE;
             DROP TABLE IF EXISTS workflow_stages CASCADE;
             DROP TABLE IF EXISTS approval_routes CASCADE;",
        )
        .await?;
        Ok(())
    }
}

const WORKFLOW_SQL: &str = r"
-- Approval routes, admin-managed and read-only to the engine
CREATE TABLE approval_routes (
    id SERIAL PRIMARY KEY,
    invoice_type_id INTEGER NOT NULL REFERENCES invoice_types(id),
    name VARCHAR(200) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Stages: role_id is an opaque reference into the external role directory
CREATE TABLE workflow_stages (
    id SERIAL PRIMARY KEY,
    route_id INTEGER NOT NULL REFERENCES approval_routes(id) ON DELETE CASCADE,
    order_index INTEGER NOT NULL CHECK (order_index >= 0),
    role_id INTEGER NOT NULL,
    name VARCHAR(200),
    resulting_payment_status VARCHAR(32),
    resulting_invoice_status VARCHAR(32),
    permissions JSONB,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_stages_route_order UNIQUE (route_id, order_index)
);

-- One process per approval run; the permanent audit anchor.
-- At-most-one pending process per payment is an engine invariant,
-- deliberately not a schema constraint.
CREATE TABLE payment_approvals (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    payment_id UUID NOT NULL REFERENCES payments(id),
    route_id INTEGER NOT NULL REFERENCES approval_routes(id),
    current_stage_index INTEGER NOT NULL DEFAULT 0 CHECK (current_stage_index >= 0),
    status VARCHAR(16) NOT NULL DEFAULT 'pending'
        CHECK (status IN ('pending', 'approved', 'rejected')),
    started_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- One step per stage visited; acted_by references the external user
-- directory
CREATE TABLE approval_steps (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    approval_id UUID NOT NULL REFERENCES payment_approvals(id) ON DELETE CASCADE,
    stage_id INTEGER NOT NULL REFERENCES workflow_stages(id),
    action VARCHAR(16) NOT NULL DEFAULT 'pending'
        CHECK (action IN ('pending', 'approved', 'rejected')),
    acted_by UUID,
    acted_at TIMESTAMPTZ,
    comment TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_steps_approval_stage UNIQUE (approval_id, stage_id)
);

CREATE INDEX idx_routes_invoice_type ON approval_routes(invoice_type_id) WHERE is_active;
CREATE INDEX idx_stages_route ON workflow_stages(route_id, order_index);
CREATE INDEX idx_approvals_payment ON payment_approvals(payment_id, created_at DESC);
CREATE INDEX idx_approvals_status ON payment_approvals(status) WHERE status = 'pending';
CREATE INDEX idx_steps_approval ON approval_steps(approval_id);
";
