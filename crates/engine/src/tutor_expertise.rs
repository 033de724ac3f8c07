//! Expertise entries of a tutor (one row per skill).

use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expertise {
    pub name: String,
    pub category: Category,
    pub years_of_experience: i32,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tutor_expertise")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub position: i32,
    pub name: String,
    pub category: String,
    pub years_of_experience: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tutors::Entity",
        from = "Column::TutorId",
        to = "super::tutors::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Tutor,
}

impl Related<super::tutors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tutor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn for_tutor(tutor_id: Uuid, position: usize, expertise: &Expertise) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4()),
            tutor_id: ActiveValue::Set(tutor_id),
            position: ActiveValue::Set(i32::try_from(position).unwrap_or(i32::MAX)),
            name: ActiveValue::Set(expertise.name.clone()),
            category: ActiveValue::Set(expertise.category.as_str().to_string()),
            years_of_experience: ActiveValue::Set(expertise.years_of_experience),
        }
    }
}

impl TryFrom<Model> for Expertise {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            name: model.name,
            category: Category::try_from(model.category.as_str())?,
            years_of_experience: model.years_of_experience,
        })
    }
}
