//! Audit log repository.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use stockplan_core::otb::{AuditEntry, AuditSink, OtbError};
use uuid::Uuid;

use super::otb::storage_error;
use crate::entities::audit_logs;

/// Append-only writer for `audit_logs`.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists audit entries for an entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_entity(
        &self,
        entity_type: &str,
        entity_id: Uuid,
    ) -> Result<Vec<audit_logs::Model>, DbErr> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::EntityType.eq(entity_type))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_desc(audit_logs::Column::Timestamp)
            .all(&self.db)
            .await
    }
}

#[async_trait]
impl AuditSink for AuditRepository {
    async fn record(&self, entry: AuditEntry) -> Result<(), OtbError> {
        let model = audit_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            entity_type: Set(entry.entity_type),
            entity_id: Set(entry.entity_id),
            action: Set(entry.action.into()),
            user_id: Set(entry.user_id),
            timestamp: Set(Utc::now().into()),
            old_data: Set(entry.old_data),
            new_data: Set(entry.new_data),
            description: Set(entry.description),
            ip_address: Set(None),
            user_agent: Set(None),
            season_id: Set(entry.season_id),
        };

        model.insert(&self.db).await.map_err(storage_error)?;
        Ok(())
    }
}
