use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::records::VetClinic;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "vet_clinics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub address: String,
    pub contact: String,
    pub district: String,
    pub emergency: bool,
    #[sea_orm(column_type = "Float")]
    pub rating: f32,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for VetClinic {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            contact: model.contact,
            district: model.district,
            emergency: model.emergency,
            rating: model.rating,
        }
    }
}
