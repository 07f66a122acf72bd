use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::records::FeedingSchedule;

/// `pet_id` is indexed without a foreign key; deleting a pet
/// leaves its schedules in place.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "feeding_schedules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub pet_id: Uuid,
    pub food_type: String,
    pub amount: String,
    pub time: String,
    pub frequency: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for FeedingSchedule {
    type Error = Error;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            pet_id: model.pet_id,
            food_type: model.food_type,
            amount: model.amount,
            time: model.time,
            frequency: model.frequency.parse()?,
            notes: model.notes,
            created_at: model.created_at,
        })
    }
}
