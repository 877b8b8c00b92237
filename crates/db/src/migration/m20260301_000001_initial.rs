//! Initial schema: users, invoices, payments, receipts, ledger, payouts and
//! provider events.
//!
//! Ids and timestamps are always supplied by the application, so no column
//! relies on a backend-specific default.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for statement in UP {
            db.execute_unprepared(statement).await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        for table in [
            "provider_events",
            "payouts",
            "ledger_entries",
            "ledger_accounts",
            "receipts",
            "payments",
            "invoices",
            "users",
        ] {
            db.execute_unprepared(&format!("DROP TABLE IF EXISTS {table}"))
                .await?;
        }
        Ok(())
    }
}

const UP: &[&str] = &[
    r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL UNIQUE,
    full_name VARCHAR(255) NOT NULL,
    role VARCHAR(16) NOT NULL CHECK (role IN ('tenant', 'landlord', 'staff')),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)",
    r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    landlord_id UUID NOT NULL REFERENCES users(id),
    tenant_id UUID NOT NULL REFERENCES users(id),
    number VARCHAR(32) UNIQUE,
    amount_minor BIGINT NOT NULL CHECK (amount_minor > 0),
    currency CHAR(3) NOT NULL,
    status VARCHAR(16) NOT NULL
        CHECK (status IN ('draft', 'issued', 'paid', 'overdue', 'void')),
    description TEXT,
    due_date DATE NOT NULL,
    issued_at TIMESTAMPTZ,
    paid_at TIMESTAMPTZ,
    voided_at TIMESTAMPTZ,
    voided_by UUID REFERENCES users(id),
    void_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_invoice_parties CHECK (landlord_id <> tenant_id),
    CONSTRAINT chk_invoice_number_issued CHECK (status = 'draft' OR number IS NOT NULL OR status = 'void')
)",
    "CREATE INDEX idx_invoices_status_due ON invoices(status, due_date)",
    "CREATE INDEX idx_invoices_landlord ON invoices(landlord_id, created_at)",
    "CREATE INDEX idx_invoices_tenant ON invoices(tenant_id, created_at)",
    r"
CREATE TABLE payments (
    id UUID PRIMARY KEY,
    invoice_id UUID NOT NULL REFERENCES invoices(id),
    payer_id UUID NOT NULL REFERENCES users(id),
    amount_minor BIGINT NOT NULL CHECK (amount_minor > 0),
    currency CHAR(3) NOT NULL,
    status VARCHAR(16) NOT NULL CHECK (status IN ('submitted', 'confirmed', 'failed')),
    reference VARCHAR(255) NOT NULL,
    provider VARCHAR(64),
    external_id VARCHAR(255),
    confirmed_at TIMESTAMPTZ,
    confirmed_by UUID REFERENCES users(id),
    confirmation_source VARCHAR(80),
    failed_at TIMESTAMPTZ,
    failure_reason TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_payments_provider_external UNIQUE (provider, external_id)
)",
    "CREATE INDEX idx_payments_invoice ON payments(invoice_id)",
    r"
CREATE TABLE receipts (
    id UUID PRIMARY KEY,
    payment_id UUID NOT NULL UNIQUE REFERENCES payments(id),
    invoice_id UUID NOT NULL UNIQUE REFERENCES invoices(id),
    amount_minor BIGINT NOT NULL CHECK (amount_minor > 0),
    currency CHAR(3) NOT NULL,
    issued_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
)",
    r"
CREATE TABLE ledger_accounts (
    id UUID PRIMARY KEY,
    landlord_id UUID NOT NULL REFERENCES users(id),
    currency CHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_ledger_accounts_landlord_currency UNIQUE (landlord_id, currency)
)",
    r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    ledger_account_id UUID NOT NULL REFERENCES ledger_accounts(id),
    landlord_id UUID NOT NULL REFERENCES users(id),
    currency CHAR(3) NOT NULL,
    entry_type VARCHAR(8) NOT NULL CHECK (entry_type IN ('credit', 'debit')),
    amount_minor BIGINT NOT NULL CHECK (amount_minor > 0),
    source VARCHAR(8) NOT NULL CHECK (source IN ('payment', 'payout')),
    payment_id UUID UNIQUE REFERENCES payments(id),
    payout_id UUID UNIQUE,
    account_version BIGINT NOT NULL CHECK (account_version > 0),
    previous_balance_minor BIGINT NOT NULL,
    current_balance_minor BIGINT NOT NULL,
    memo TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_ledger_entries_account_version UNIQUE (ledger_account_id, account_version),
    CONSTRAINT chk_ledger_entries_source_ref CHECK (
        (source = 'payment' AND payment_id IS NOT NULL AND payout_id IS NULL)
        OR (source = 'payout' AND payout_id IS NOT NULL AND payment_id IS NULL)
    ),
    CONSTRAINT chk_ledger_entries_running_balance CHECK (
        (entry_type = 'credit' AND current_balance_minor = previous_balance_minor + amount_minor)
        OR (entry_type = 'debit' AND current_balance_minor = previous_balance_minor - amount_minor)
    )
)",
    "CREATE INDEX idx_ledger_entries_landlord ON ledger_entries(landlord_id, currency)",
    r"
CREATE TABLE payouts (
    id UUID PRIMARY KEY,
    landlord_id UUID NOT NULL REFERENCES users(id),
    amount_minor BIGINT NOT NULL CHECK (amount_minor > 0),
    currency CHAR(3) NOT NULL,
    status VARCHAR(16) NOT NULL CHECK (status IN ('pending', 'approved', 'denied')),
    notes TEXT,
    requested_at TIMESTAMPTZ NOT NULL,
    decided_by UUID REFERENCES users(id),
    decided_at TIMESTAMPTZ,
    decision_notes TEXT,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
)",
    "CREATE INDEX idx_payouts_landlord ON payouts(landlord_id, created_at)",
    r"
CREATE TABLE provider_events (
    id UUID PRIMARY KEY,
    provider VARCHAR(64) NOT NULL,
    event_id VARCHAR(255) NOT NULL,
    event_type VARCHAR(128) NOT NULL,
    status VARCHAR(16) NOT NULL
        CHECK (status IN ('succeeded', 'failed', 'requires_action', 'pending')),
    payment_id UUID REFERENCES payments(id),
    received_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_provider_events_delivery UNIQUE (provider, event_id)
)",
];
