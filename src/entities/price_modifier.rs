use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModifierKind {
    TimeSlot,
    Popularity,
}

impl ModifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierKind::TimeSlot => "time_slot",
            ModifierKind::Popularity => "popularity",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "time_slot" => Some(ModifierKind::TimeSlot),
            "popularity" => Some(ModifierKind::Popularity),
            _ => None,
        }
    }
}

/// A surge-pricing rule. `condition` is a JSON document whose shape depends
/// on `kind`: `{"startTime": "18:00", "endTime": "22:00"}` for time_slot,
/// `{"minScore": 0.8}` for popularity. Rows with conditions that no longer
/// decode are treated as inactive at pricing time rather than rejected here.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "price_modifiers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub name: String,
    pub multiplier: Decimal,
    #[sea_orm(column_type = "Text")]
    pub condition: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
