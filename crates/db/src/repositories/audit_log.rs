//! Append-only trust audit log.
//!
//! Rows are written only by [`append_audit`], inside the same unit of work as
//! the change they describe. A trigger rejects every UPDATE and DELETE.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use trustbook_core::trust::{AuditAction, AuditEntityType, AuditRecord, TrustError};
use trustbook_shared::types::{
    AuditLogId, PageRequest, PageResponse, TrustAccountId, TrustLedgerId,
};
use uuid::Uuid;

use super::{now, storage};
use crate::entities::trust_audit_logs;

/// Filter for audit log queries. Unset fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditLogFilter {
    /// Only this action.
    pub action: Option<AuditAction>,
    /// Only this entity kind.
    pub entity_type: Option<AuditEntityType>,
    /// Only rows about this entity.
    pub entity_id: Option<Uuid>,
    /// Only rows touching this ledger.
    pub ledger_id: Option<TrustLedgerId>,
    /// Written at or after.
    pub from: Option<DateTime<Utc>>,
    /// Written at or before.
    pub to: Option<DateTime<Utc>>,
}

/// Audit log repository (read side).
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists an account's audit rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the database fails.
    pub async fn get_audit_log(
        &self,
        account_id: TrustAccountId,
        filter: AuditLogFilter,
        page: PageRequest,
    ) -> Result<PageResponse<trust_audit_logs::Model>, TrustError> {
        let page = page.normalized();

        let mut query = trust_audit_logs::Entity::find()
            .filter(trust_audit_logs::Column::TrustAccountId.eq(account_id.into_inner()));

        if let Some(action) = filter.action {
            query = query.filter(trust_audit_logs::Column::Action.eq(action.as_str()));
        }
        if let Some(entity_type) = filter.entity_type {
            query = query.filter(trust_audit_logs::Column::EntityType.eq(entity_type.as_str()));
        }
        if let Some(entity_id) = filter.entity_id {
            query = query.filter(trust_audit_logs::Column::EntityId.eq(entity_id));
        }
        if let Some(ledger_id) = filter.ledger_id {
            query =
                query.filter(trust_audit_logs::Column::TrustLedgerId.eq(ledger_id.into_inner()));
        }
        if let Some(from) = filter.from {
            query = query.filter(trust_audit_logs::Column::CreatedAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(trust_audit_logs::Column::CreatedAt.lte(to));
        }

        let total = query.clone().count(&self.db).await.map_err(storage)?;

        let rows = query
            .order_by_desc(trust_audit_logs::Column::CreatedAt)
            .order_by_desc(trust_audit_logs::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(storage)?;

        Ok(PageResponse::new(rows, page.page, page.per_page, total))
    }
}

/// Appends one audit row inside the caller's unit of work.
pub(crate) async fn append_audit(
    txn: &DatabaseTransaction,
    record: AuditRecord,
) -> Result<trust_audit_logs::Model, TrustError> {
    trust_audit_logs::ActiveModel {
        id: Set(AuditLogId::new().into_inner()),
        trust_account_id: Set(record.trust_account_id.into_inner()),
        trust_ledger_id: Set(record.trust_ledger_id.map(TrustLedgerId::into_inner)),
        action: Set(record.action.as_str().to_string()),
        entity_type: Set(record.entity_type.as_str().to_string()),
        entity_id: Set(record.entity_id),
        previous_value: Set(record.previous_value),
        new_value: Set(record.new_value),
        actor_id: Set(record.actor.into_inner()),
        created_at: Set(now()),
    }
    .insert(txn)
    .await
    .map_err(storage)
}
