//! OTB schema migration.
//!
//! Creates the season and category reference tables, the planning inputs
//! (`otb_plan`, `purchase_orders`), the materialized `otb_positions`, the
//! adjustment ledger and the audit log. Requires PostgreSQL 15 or newer for
//! `NULLS NOT DISTINCT`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(REFERENCE_TABLES_SQL).await?;
        db.execute_unprepared(PLANNING_TABLES_SQL).await?;
        db.execute_unprepared(OTB_TABLES_SQL).await?;
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE season_status AS ENUM (
    'created', 'locations_defined', 'plan_uploaded', 'otb_uploaded', 'range_uploaded', 'locked'
);
CREATE TYPE po_status AS ENUM (
    'draft', 'submitted', 'confirmed', 'shipped', 'partial', 'complete', 'cancelled'
);
CREATE TYPE po_source AS ENUM ('csv', 'api');
CREATE TYPE adjustment_status AS ENUM ('pending', 'approved', 'rejected');
CREATE TYPE audit_action AS ENUM (
    'create', 'update', 'delete', 'approve', 'lock', 'unlock',
    'login', 'logout', 'upload', 'workflow_transition'
);
";

const REFERENCE_TABLES_SQL: &str = r"
CREATE TABLE seasons (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID,
    season_code VARCHAR(50) NOT NULL,
    name VARCHAR(255) NOT NULL,
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status season_status NOT NULL DEFAULT 'created',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_seasons_company_code UNIQUE (company_id, season_code),
    CONSTRAINT chk_season_dates CHECK (end_date >= start_date)
);

CREATE INDEX idx_seasons_company ON seasons(company_id);

CREATE TABLE categories (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    name VARCHAR(255) NOT NULL,
    code VARCHAR(50),
    description TEXT,
    parent_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    level INTEGER NOT NULL DEFAULT 0,
    path TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_categories_parent ON categories(parent_id);
";

const PLANNING_TABLES_SQL: &str = r"
CREATE TABLE otb_plan (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    season_id UUID NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
    location_id UUID NOT NULL,
    category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    month DATE NOT NULL,
    planned_sales NUMERIC(15, 2) NOT NULL DEFAULT 0,
    planned_closing_stock NUMERIC(15, 2) NOT NULL DEFAULT 0,
    opening_stock NUMERIC(15, 2) NOT NULL DEFAULT 0,
    on_order NUMERIC(15, 2) NOT NULL DEFAULT 0,
    approved_spend_limit NUMERIC(15, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_otb_plan_season_category ON otb_plan(season_id, category_id, month);

CREATE TABLE purchase_orders (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    season_id UUID NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
    location_id UUID NOT NULL,
    category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    po_number VARCHAR(100) NOT NULL,
    order_date DATE,
    po_value NUMERIC(15, 2) NOT NULL DEFAULT 0,
    status po_status NOT NULL DEFAULT 'draft',
    source po_source NOT NULL DEFAULT 'api',
    supplier_name VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_purchase_orders_season_category
    ON purchase_orders(season_id, category_id, order_date)
    WHERE status <> 'cancelled';
";

const OTB_TABLES_SQL: &str = r"
CREATE TABLE otb_positions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    season_id UUID NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
    category_id UUID REFERENCES categories(id) ON DELETE CASCADE,
    month DATE NOT NULL,
    planned_otb NUMERIC(15, 2) NOT NULL DEFAULT 0,
    consumed_otb NUMERIC(15, 2) NOT NULL DEFAULT 0,
    available_otb NUMERIC(15, 2) NOT NULL DEFAULT 0,
    last_calculated TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_otb_positions_bucket UNIQUE NULLS NOT DISTINCT (season_id, category_id, month),
    CONSTRAINT chk_otb_positions_available CHECK (available_otb >= 0),
    CONSTRAINT chk_otb_positions_month CHECK (date_trunc('month', month)::date = month)
);

CREATE INDEX idx_otb_positions_season_month ON otb_positions(season_id, month);

CREATE TABLE otb_adjustments (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    season_id UUID NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
    from_category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    to_category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
    amount NUMERIC(15, 2) NOT NULL,
    reason TEXT NOT NULL,
    status adjustment_status NOT NULL DEFAULT 'pending',
    approved_by UUID,
    approved_at TIMESTAMPTZ,
    rejection_reason TEXT,
    created_by UUID,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_otb_adjustments_amount CHECK (amount > 0),
    CONSTRAINT chk_otb_adjustments_review CHECK (
        (status = 'pending' AND approved_at IS NULL)
        OR (status <> 'pending' AND approved_at IS NOT NULL)
    )
);

CREATE INDEX idx_otb_adjustments_season ON otb_adjustments(season_id, created_at DESC);
CREATE INDEX idx_otb_adjustments_approved
    ON otb_adjustments(season_id, from_category_id, to_category_id)
    WHERE status = 'approved';
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    entity_type VARCHAR(100) NOT NULL,
    entity_id UUID NOT NULL,
    action audit_action NOT NULL,
    user_id UUID,
    timestamp TIMESTAMPTZ NOT NULL DEFAULT now(),
    old_data JSONB,
    new_data JSONB,
    description TEXT,
    ip_address VARCHAR(45),
    user_agent TEXT,
    season_id UUID REFERENCES seasons(id) ON DELETE SET NULL
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity_type, entity_id, timestamp DESC);
CREATE INDEX idx_audit_logs_season ON audit_logs(season_id, timestamp DESC);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_seasons_updated_at BEFORE UPDATE ON seasons
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_categories_updated_at BEFORE UPDATE ON categories
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_otb_plan_updated_at BEFORE UPDATE ON otb_plan
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_purchase_orders_updated_at BEFORE UPDATE ON purchase_orders
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_otb_positions_updated_at BEFORE UPDATE ON otb_positions
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_otb_adjustments_updated_at BEFORE UPDATE ON otb_adjustments
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS otb_adjustments CASCADE;
DROP TABLE IF EXISTS otb_positions CASCADE;
DROP TABLE IF EXISTS purchase_orders CASCADE;
DROP TABLE IF EXISTS otb_plan CASCADE;
DROP TABLE IF EXISTS categories CASCADE;
DROP TABLE IF EXISTS seasons CASCADE;
DROP FUNCTION IF EXISTS set_updated_at() CASCADE;
DROP TYPE IF EXISTS audit_action;
DROP TYPE IF EXISTS adjustment_status;
DROP TYPE IF EXISTS po_source;
DROP TYPE IF EXISTS po_status;
DROP TYPE IF EXISTS season_status;
";
