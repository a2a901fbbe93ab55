//! Trust ledger migration.
//!
//! Creates the trust accounting tables, enums, constraints and the triggers
//! that make the transaction log and audit log append-only at the database
//! level, even if application logic fails.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: COLLABORATOR RECORDS
        // ============================================================
        db.execute_unprepared(CLIENTS_SQL).await?;
        db.execute_unprepared(MATTERS_SQL).await?;

        // ============================================================
        // PART 3: TRUST TABLES
        // ============================================================
        db.execute_unprepared(TRUST_ACCOUNTS_SQL).await?;
        db.execute_unprepared(TRUST_LEDGERS_SQL).await?;
        db.execute_unprepared(TRUST_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(TRUST_AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 4: IMMUTABILITY TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
CREATE TYPE trust_transaction_type AS ENUM (
    'deposit',
    'withdrawal',
    'transfer_in',
    'transfer_out',
    'interest',
    'bank_fee',
    'void_reversal'
);

CREATE TYPE trust_transaction_source AS ENUM (
    'wire',
    'check',
    'cash',
    'ach',
    'credit_card',
    'money_order',
    'cashiers_check',
    'internal_transfer',
    'other'
);
";

const CLIENTS_SQL: &str = r"
CREATE TABLE clients (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const MATTERS_SQL: &str = r"
CREATE TABLE matters (
    id UUID PRIMARY KEY,
    client_id UUID NOT NULL REFERENCES clients(id),
    name VARCHAR(255) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_matters_client UNIQUE (id, client_id)
);

CREATE INDEX idx_matters_client ON matters(client_id);
";

const TRUST_ACCOUNTS_SQL: &str = r"
CREATE TABLE trust_accounts (
    id UUID PRIMARY KEY,
    name VARCHAR(500) NOT NULL,
    bank_name VARCHAR(500) NOT NULL,
    -- Masked: only the last four digits are ever stored
    account_number VARCHAR(16) NOT NULL,
    routing_number VARCHAR(500),
    description TEXT,
    bank_balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    last_reconciled_at TIMESTAMPTZ,
    last_reconciled_balance NUMERIC(19, 4),
    next_transaction_number BIGINT NOT NULL DEFAULT 1,
    is_active BOOLEAN NOT NULL DEFAULT true,
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_next_transaction_number CHECK (next_transaction_number >= 1)
);
";

const TRUST_LEDGERS_SQL: &str = r"
CREATE TABLE trust_ledgers (
    id UUID PRIMARY KEY,
    trust_account_id UUID NOT NULL REFERENCES trust_accounts(id),
    client_id UUID NOT NULL REFERENCES clients(id),
    matter_id UUID,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    -- Ledgers can never be overdrawn
    CONSTRAINT chk_ledger_balance_non_negative CHECK (balance >= 0),
    -- A NULL matter is the client's general ledger and is unique too
    CONSTRAINT uq_trust_ledgers_key UNIQUE NULLS NOT DISTINCT (trust_account_id, client_id, matter_id),
    -- A matter ledger must belong to the matter's own client
    CONSTRAINT fk_trust_ledgers_matter FOREIGN KEY (matter_id, client_id)
        REFERENCES matters(id, client_id)
);

CREATE INDEX idx_trust_ledgers_client ON trust_ledgers(client_id);
";

const TRUST_TRANSACTIONS_SQL: &str = r"
CREATE TABLE trust_transactions (
    id UUID PRIMARY KEY,
    trust_account_id UUID NOT NULL REFERENCES trust_accounts(id),
    trust_ledger_id UUID NOT NULL REFERENCES trust_ledgers(id),
    transaction_number BIGINT NOT NULL,
    transaction_type trust_transaction_type NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    running_balance NUMERIC(19, 4) NOT NULL,
    description TEXT NOT NULL,
    reference VARCHAR(500),
    payee VARCHAR(500),
    payor VARCHAR(500),
    check_number VARCHAR(500),
    source trust_transaction_source,
    transaction_date DATE NOT NULL,

    is_cleared BOOLEAN NOT NULL DEFAULT false,
    cleared_date DATE,

    is_voided BOOLEAN NOT NULL DEFAULT false,
    voided_at TIMESTAMPTZ,
    void_reason TEXT,
    voiding_transaction_id UUID,
    voided_transaction_id UUID,
    related_transaction_id UUID,

    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT uq_trust_transactions_number UNIQUE (trust_account_id, transaction_number),
    CONSTRAINT chk_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_running_balance_non_negative CHECK (running_balance >= 0),
    CONSTRAINT chk_transaction_number_positive CHECK (transaction_number >= 1),
    CONSTRAINT chk_cleared_date CHECK (is_cleared OR cleared_date IS NULL),
    CONSTRAINT chk_void_fields CHECK (
        (is_voided AND voided_at IS NOT NULL AND void_reason IS NOT NULL AND voiding_transaction_id IS NOT NULL)
        OR (NOT is_voided AND voided_at IS NULL AND void_reason IS NULL AND voiding_transaction_id IS NULL)
    ),
    CONSTRAINT chk_reversal_link CHECK (
        (transaction_type = 'void_reversal') = (voided_transaction_id IS NOT NULL)
    ),
    -- Transfer sides reference each other; both ids exist by commit time
    CONSTRAINT fk_related_transaction FOREIGN KEY (related_transaction_id)
        REFERENCES trust_transactions(id) DEFERRABLE INITIALLY DEFERRED,
    CONSTRAINT fk_voiding_transaction FOREIGN KEY (voiding_transaction_id)
        REFERENCES trust_transactions(id) DEFERRABLE INITIALLY DEFERRED,
    CONSTRAINT fk_voided_transaction FOREIGN KEY (voided_transaction_id)
        REFERENCES trust_transactions(id)
);

CREATE INDEX idx_trust_transactions_ledger ON trust_transactions(trust_ledger_id, transaction_number);
CREATE INDEX idx_trust_transactions_date ON trust_transactions(trust_account_id, transaction_date);
CREATE INDEX idx_trust_transactions_uncleared ON trust_transactions(trust_account_id)
    WHERE is_cleared = false AND is_voided = false;
CREATE UNIQUE INDEX idx_trust_transactions_one_reversal ON trust_transactions(voided_transaction_id)
    WHERE voided_transaction_id IS NOT NULL;
";

const TRUST_AUDIT_LOGS_SQL: &str = r"
CREATE TABLE trust_audit_logs (
    id UUID PRIMARY KEY,
    trust_account_id UUID NOT NULL REFERENCES trust_accounts(id),
    trust_ledger_id UUID REFERENCES trust_ledgers(id),
    action VARCHAR(64) NOT NULL,
    entity_type VARCHAR(64) NOT NULL,
    entity_id UUID NOT NULL,
    previous_value JSONB,
    new_value JSONB,
    actor_id UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_trust_audit_logs_account ON trust_audit_logs(trust_account_id, created_at DESC);
CREATE INDEX idx_trust_audit_logs_entity ON trust_audit_logs(entity_id);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_trust_delete
-- Financial records are retained; nothing is ever hard-deleted
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_trust_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Cannot delete from %: trust records are retained permanently', TG_TABLE_NAME;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_trust_accounts_no_delete
BEFORE DELETE ON trust_accounts
FOR EACH ROW
EXECUTE FUNCTION prevent_trust_delete();

CREATE TRIGGER trg_trust_ledgers_no_delete
BEFORE DELETE ON trust_ledgers
FOR EACH ROW
EXECUTE FUNCTION prevent_trust_delete();

CREATE TRIGGER trg_trust_transactions_no_delete
BEFORE DELETE ON trust_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_trust_delete();

CREATE TRIGGER trg_trust_audit_logs_no_delete
BEFORE DELETE ON trust_audit_logs
FOR EACH ROW
EXECUTE FUNCTION prevent_trust_delete();

-- ============================================================
-- FUNCTION: prevent_trust_transaction_modification
-- Only clearing and a single void are permitted after creation
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_trust_transaction_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.id IS DISTINCT FROM OLD.id
        OR NEW.trust_account_id IS DISTINCT FROM OLD.trust_account_id
        OR NEW.trust_ledger_id IS DISTINCT FROM OLD.trust_ledger_id
        OR NEW.transaction_number IS DISTINCT FROM OLD.transaction_number
        OR NEW.transaction_type IS DISTINCT FROM OLD.transaction_type
        OR NEW.amount IS DISTINCT FROM OLD.amount
        OR NEW.running_balance IS DISTINCT FROM OLD.running_balance
        OR NEW.description IS DISTINCT FROM OLD.description
        OR NEW.transaction_date IS DISTINCT FROM OLD.transaction_date
        OR NEW.voided_transaction_id IS DISTINCT FROM OLD.voided_transaction_id
        OR NEW.related_transaction_id IS DISTINCT FROM OLD.related_transaction_id
        OR NEW.created_by IS DISTINCT FROM OLD.created_by
        OR NEW.created_at IS DISTINCT FROM OLD.created_at THEN
        RAISE EXCEPTION 'Cannot modify trust transaction %. Void it with a reversal instead.', OLD.transaction_number;
    END IF;

    IF OLD.is_voided AND (
        NOT NEW.is_voided
        OR NEW.voided_at IS DISTINCT FROM OLD.voided_at
        OR NEW.void_reason IS DISTINCT FROM OLD.void_reason
        OR NEW.voiding_transaction_id IS DISTINCT FROM OLD.voiding_transaction_id
    ) THEN
        RAISE EXCEPTION 'Trust transaction % is already voided.', OLD.transaction_number;
    END IF;

    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_trust_transaction_mod
BEFORE UPDATE ON trust_transactions
FOR EACH ROW
EXECUTE FUNCTION prevent_trust_transaction_modification();

-- ============================================================
-- FUNCTION: prevent_trust_audit_modification
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_trust_audit_modification()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Cannot modify trust audit log entries.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_trust_audit_mod
BEFORE UPDATE ON trust_audit_logs
FOR EACH ROW
EXECUTE FUNCTION prevent_trust_audit_modification();

-- ============================================================
-- FUNCTION: prevent_transaction_number_rewind
-- The per-account counter only ever moves forward
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_transaction_number_rewind()
RETURNS TRIGGER AS $$
BEGIN
    IF NEW.next_transaction_number < OLD.next_transaction_number THEN
        RAISE EXCEPTION 'Transaction number counter cannot move backwards';
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_trust_accounts_counter
BEFORE UPDATE ON trust_accounts
FOR EACH ROW
EXECUTE FUNCTION prevent_transaction_number_rewind();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS trust_audit_logs CASCADE;
DROP TABLE IF EXISTS trust_transactions CASCADE;
DROP TABLE IF EXISTS trust_ledgers CASCADE;
DROP TABLE IF EXISTS trust_accounts CASCADE;
DROP TABLE IF EXISTS matters CASCADE;
DROP TABLE IF EXISTS clients CASCADE;
DROP FUNCTION IF EXISTS prevent_trust_delete() CASCADE;
DROP FUNCTION IF EXISTS prevent_trust_transaction_modification() CASCADE;
DROP FUNCTION IF EXISTS prevent_trust_audit_modification() CASCADE;
DROP FUNCTION IF EXISTS prevent_transaction_number_rewind() CASCADE;
DROP TYPE IF EXISTS trust_transaction_source;
DROP TYPE IF EXISTS trust_transaction_type;
";
