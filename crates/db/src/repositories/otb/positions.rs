use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use stockplan_core::otb::{
    CategoryTotals, MonthTotals, OtbError, OtbPosition, OtbTotals, PositionStore, PositionUpsert,
};
use uuid::Uuid;

use super::{position_from_model, storage_error, OtbRepository};
use crate::entities::otb_positions::{self, Column};

type SumRow = (Option<Decimal>, Option<Decimal>, Option<Decimal>);

fn with_sums(query: Select<otb_positions::Entity>) -> Select<otb_positions::Entity> {
    query
        .column_as(Expr::col((otb_positions::Entity, Column::PlannedOtb)).sum(), "planned")
        .column_as(Expr::col((otb_positions::Entity, Column::ConsumedOtb)).sum(), "consumed")
        .column_as(Expr::col((otb_positions::Entity, Column::AvailableOtb)).sum(), "available")
}

fn or_zero(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

#[async_trait]
impl PositionStore for OtbRepository {
    async fn upsert_position(&self, position: &PositionUpsert) -> Result<OtbPosition, OtbError> {
        let now = Utc::now().into();
        let model = otb_positions::ActiveModel {
            id: Set(Uuid::now_v7()),
            season_id: Set(position.season_id),
            category_id: Set(position.key.category_id),
            month: Set(position.key.month),
            planned_otb: Set(position.planned_otb),
            consumed_otb: Set(position.consumed_otb),
            available_otb: Set(position.available_otb),
            last_calculated: Set(Some(now)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // Relies on the NULLS NOT DISTINCT bucket constraint so the
        // uncategorized bucket also conflicts.
        let stored = otb_positions::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([Column::SeasonId, Column::CategoryId, Column::Month])
                    .update_columns([
                        Column::PlannedOtb,
                        Column::ConsumedOtb,
                        Column::AvailableOtb,
                        Column::LastCalculated,
                        Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(position_from_model(stored))
    }

    async fn positions_by_season(
        &self,
        season_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OtbPosition>, OtbError> {
        let models = otb_positions::Entity::find()
            .filter(Column::SeasonId.eq(season_id))
            .order_by_asc(Column::Month)
            .order_by_asc(Column::CategoryId)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(models.into_iter().map(position_from_model).collect())
    }

    async fn count_positions(&self, season_id: Uuid) -> Result<u64, OtbError> {
        otb_positions::Entity::find()
            .filter(Column::SeasonId.eq(season_id))
            .count(&self.db)
            .await
            .map_err(storage_error)
    }

    async fn positions_by_category(
        &self,
        season_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<OtbPosition>, OtbError> {
        let models = otb_positions::Entity::find()
            .filter(Column::SeasonId.eq(season_id))
            .filter(Column::CategoryId.eq(category_id))
            .order_by_asc(Column::Month)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(models.into_iter().map(position_from_model).collect())
    }

    async fn category_totals(&self, season_id: Uuid) -> Result<Vec<CategoryTotals>, OtbError> {
        let query = otb_positions::Entity::find()
            .filter(Column::SeasonId.eq(season_id))
            .select_only()
            .column(Column::CategoryId);
        let rows: Vec<(Option<Uuid>, Option<Decimal>, Option<Decimal>, Option<Decimal>)> =
            with_sums(query)
                .group_by(Column::CategoryId)
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(storage_error)?;

        let mut totals: Vec<CategoryTotals> = rows
            .into_iter()
            .map(|(category_id, planned, consumed, available)| CategoryTotals {
                category_id,
                total_planned: or_zero(planned),
                total_consumed: or_zero(consumed),
                total_available: or_zero(available),
            })
            .collect();
        totals.sort_by_key(|t| t.category_id);
        Ok(totals)
    }

    async fn month_totals(&self, season_id: Uuid) -> Result<Vec<MonthTotals>, OtbError> {
        let query = otb_positions::Entity::find()
            .filter(Column::SeasonId.eq(season_id))
            .select_only()
            .column(Column::Month);
        let rows: Vec<(NaiveDate, Option<Decimal>, Option<Decimal>, Option<Decimal>)> =
            with_sums(query)
                .group_by(Column::Month)
                .order_by_asc(Column::Month)
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(storage_error)?;

        Ok(rows
            .into_iter()
            .map(|(month, planned, consumed, available)| MonthTotals {
                month,
                planned_otb: or_zero(planned),
                consumed_otb: or_zero(consumed),
                available_otb: or_zero(available),
            })
            .collect())
    }

    async fn season_totals(&self, season_id: Uuid) -> Result<OtbTotals, OtbError> {
        let query = otb_positions::Entity::find()
            .filter(Column::SeasonId.eq(season_id))
            .select_only();
        let row: Option<SumRow> = with_sums(query)
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(storage_error)?;

        let (planned, consumed, available) = row.unwrap_or((None, None, None));
        Ok(OtbTotals {
            total_planned: or_zero(planned),
            total_consumed: or_zero(consumed),
            total_available: or_zero(available),
        })
    }
}
