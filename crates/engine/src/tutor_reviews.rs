//! Reviews left on a tutor profile.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub student_id: Uuid,
    /// 1 to 5 inclusive.
    pub rating: u8,
    pub comment: Option<String>,
    pub session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tutor_reviews")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub session_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
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
    pub(crate) fn for_tutor(tutor_id: Uuid, review: &Review) -> Self {
        Self {
            id: ActiveValue::Set(review.id),
            tutor_id: ActiveValue::Set(tutor_id),
            student_id: ActiveValue::Set(review.student_id),
            rating: ActiveValue::Set(i32::from(review.rating)),
            comment: ActiveValue::Set(review.comment.clone()),
            session_id: ActiveValue::Set(review.session_id),
            created_at: ActiveValue::Set(review.created_at),
        }
    }
}

impl TryFrom<Model> for Review {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let rating = u8::try_from(model.rating)
            .map_err(|_| EngineError::InvalidInput(format!("invalid rating: {}", model.rating)))?;
        Ok(Self {
            id: model.id,
            student_id: model.student_id,
            rating,
            comment: model.comment,
            session_id: model.session_id,
            created_at: model.created_at,
        })
    }
}
