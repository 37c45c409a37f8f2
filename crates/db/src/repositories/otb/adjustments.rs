use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use stockplan_core::otb::{
    AdjustmentLedger, AdjustmentReview, AdjustmentTotals, OtbAdjustment, OtbError,
};
use uuid::Uuid;

use super::{adjustment_from_model, storage_error, OtbRepository};
use crate::entities::otb_adjustments;
use crate::entities::sea_orm_active_enums::AdjustmentStatus;

#[async_trait]
impl AdjustmentLedger for OtbRepository {
    async fn insert_adjustment(&self, adjustment: &OtbAdjustment) -> Result<(), OtbError> {
        let created_at = adjustment.created_at.into();
        let model = otb_adjustments::ActiveModel {
            id: Set(adjustment.id),
            season_id: Set(adjustment.season_id),
            from_category_id: Set(adjustment.from_category_id),
            to_category_id: Set(adjustment.to_category_id),
            amount: Set(adjustment.amount),
            reason: Set(adjustment.reason.clone()),
            status: Set(adjustment.status.into()),
            approved_by: Set(adjustment.approved_by),
            approved_at: Set(adjustment.approved_at.map(Into::into)),
            rejection_reason: Set(adjustment.rejection_reason.clone()),
            created_by: Set(adjustment.created_by),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };

        model.insert(&self.db).await.map_err(storage_error)?;
        Ok(())
    }

    async fn find_adjustment(&self, adjustment_id: Uuid) -> Result<Option<OtbAdjustment>, OtbError> {
        let model = otb_adjustments::Entity::find_by_id(adjustment_id)
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(model.map(adjustment_from_model))
    }

    async fn list_adjustments(
        &self,
        season_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OtbAdjustment>, OtbError> {
        let models = otb_adjustments::Entity::find()
            .filter(otb_adjustments::Column::SeasonId.eq(season_id))
            .order_by_desc(otb_adjustments::Column::CreatedAt)
            .order_by_desc(otb_adjustments::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(models.into_iter().map(adjustment_from_model).collect())
    }

    async fn count_adjustments(&self, season_id: Uuid) -> Result<u64, OtbError> {
        otb_adjustments::Entity::find()
            .filter(otb_adjustments::Column::SeasonId.eq(season_id))
            .count(&self.db)
            .await
            .map_err(storage_error)
    }

    async fn apply_review(
        &self,
        adjustment_id: Uuid,
        review: &AdjustmentReview,
    ) -> Result<Option<OtbAdjustment>, OtbError> {
        let changes = otb_adjustments::ActiveModel {
            status: Set(review.new_status().into()),
            approved_by: Set(Some(review.reviewed_by())),
            approved_at: Set(Some(review.reviewed_at().into())),
            rejection_reason: Set(review.rejection_reason().map(ToString::to_string)),
            updated_at: Set(Utc::now().into()),
            ..Default::default()
        };

        // The status guard makes concurrent reviews race on a single row update.
        let result = otb_adjustments::Entity::update_many()
            .set(changes)
            .filter(otb_adjustments::Column::Id.eq(adjustment_id))
            .filter(otb_adjustments::Column::Status.eq(AdjustmentStatus::Pending))
            .exec(&self.db)
            .await
            .map_err(storage_error)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_adjustment(adjustment_id).await
    }

    async fn approved_totals(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<AdjustmentTotals, OtbError> {
        let mut query = otb_adjustments::Entity::find()
            .filter(otb_adjustments::Column::SeasonId.eq(season_id))
            .filter(otb_adjustments::Column::Status.eq(AdjustmentStatus::Approved));
        if let Some(category_id) = category_id {
            query = query.filter(
                Condition::any()
                    .add(otb_adjustments::Column::FromCategoryId.eq(category_id))
                    .add(otb_adjustments::Column::ToCategoryId.eq(category_id)),
            );
        }

        let rows: Vec<(Option<Uuid>, Option<Uuid>, Option<Decimal>)> = query
            .select_only()
            .column(otb_adjustments::Column::FromCategoryId)
            .column(otb_adjustments::Column::ToCategoryId)
            .column_as(
                Expr::col((otb_adjustments::Entity, otb_adjustments::Column::Amount)).sum(),
                "total",
            )
            .group_by(otb_adjustments::Column::FromCategoryId)
            .group_by(otb_adjustments::Column::ToCategoryId)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        let mut totals = AdjustmentTotals::default();
        for (from, to, amount) in rows {
            totals.add(from, to, amount.unwrap_or(Decimal::ZERO));
        }
        Ok(totals)
    }
}
