use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QuerySelect};
use stockplan_core::otb::{OtbError, ReferenceData, SeasonInfo};
use uuid::Uuid;

use super::{season_info, storage_error, OtbRepository};
use crate::entities::{categories, seasons};

#[async_trait]
impl ReferenceData for OtbRepository {
    async fn find_season(&self, season_id: Uuid) -> Result<Option<SeasonInfo>, OtbError> {
        let season = seasons::Entity::find_by_id(season_id)
            .one(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(season.map(season_info))
    }

    async fn category_names(&self, category_ids: &[Uuid]) -> Result<HashMap<Uuid, String>, OtbError> {
        if category_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(Uuid, String)> = categories::Entity::find()
            .filter(categories::Column::Id.is_in(category_ids.to_vec()))
            .select_only()
            .column(categories::Column::Id)
            .column(categories::Column::Name)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(storage_error)?;

        Ok(rows.into_iter().collect())
    }
}
