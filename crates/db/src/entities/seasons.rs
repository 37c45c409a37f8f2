//! `SeaORM` Entity for seasons table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SeasonStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "seasons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub season_code: String,
    pub name: String,
    pub start_date: Date,
    pub end_date: Date,
    pub status: SeasonStatus,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::otb_positions::Entity")]
    OtbPositions,
    #[sea_orm(has_many = "super::otb_adjustments::Entity")]
    OtbAdjustments,
}

impl Related<super::otb_positions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OtbPositions.def()
    }
}

impl Related<super::otb_adjustments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OtbAdjustments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
