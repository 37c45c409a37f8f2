use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use stockplan_core::otb::calculation::accumulate;
use stockplan_core::otb::{BucketTotals, OtbError, SpendSource};
use uuid::Uuid;

use super::{storage_error, OtbRepository};
use crate::entities::sea_orm_active_enums::PoStatus;
use crate::entities::{otb_plan, purchase_orders};

type BucketRow = (Option<Uuid>, NaiveDate, Option<Decimal>);

fn into_totals(rows: Vec<BucketRow>) -> BucketTotals {
    let mut totals = BucketTotals::new();
    for (category_id, date, amount) in rows {
        accumulate(&mut totals, category_id, date, amount.unwrap_or(Decimal::ZERO));
    }
    totals
}

#[async_trait]
impl SpendSource for OtbRepository {
    async fn planned_by_bucket(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<BucketTotals, OtbError> {
        let mut query = otb_plan::Entity::find().filter(otb_plan::Column::SeasonId.eq(season_id));
        if let Some(category_id) = category_id {
            query = query.filter(otb_plan::Column::CategoryId.eq(category_id));
        }

        // Plan rows are per location; summing here collapses locations.
        let rows: Vec<BucketRow> = query
            .select_only()
            .column(otb_plan::Column::CategoryId)
            .column(otb_plan::Column::Month)
            .column_as(
                Expr::col((otb_plan::Entity, otb_plan::Column::ApprovedSpendLimit)).sum(),
                "total",
            )
            .group_by(otb_plan::Column::CategoryId)
            .group_by(otb_plan::Column::Month)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(into_totals(rows))
    }

    async fn consumed_by_bucket(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<BucketTotals, OtbError> {
        let mut query = purchase_orders::Entity::find()
            .filter(purchase_orders::Column::SeasonId.eq(season_id))
            .filter(purchase_orders::Column::Status.is_in(PoStatus::consuming()))
            .filter(purchase_orders::Column::OrderDate.is_not_null());
        if let Some(category_id) = category_id {
            query = query.filter(purchase_orders::Column::CategoryId.eq(category_id));
        }

        let rows: Vec<BucketRow> = query
            .select_only()
            .column(purchase_orders::Column::CategoryId)
            .column(purchase_orders::Column::OrderDate)
            .column_as(
                Expr::col((purchase_orders::Entity, purchase_orders::Column::PoValue)).sum(),
                "total",
            )
            .group_by(purchase_orders::Column::CategoryId)
            .group_by(purchase_orders::Column::OrderDate)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(into_totals(rows))
    }
}
