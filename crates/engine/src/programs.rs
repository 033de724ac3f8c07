//! Group programs whose organizer is rewarded on every new participant.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError, Hours, ResultEngine};

pub const DEFAULT_REWARD: Hours = Hours::whole(10);
pub const MIN_REWARD: Hours = Hours::HALF;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    pub description: String,
    pub organizer_id: Uuid,
    /// In join order. A user appears at most once.
    pub participants: Vec<Uuid>,
    pub reward_hours: Hours,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

/// Role of a user in a program.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramRole {
    Organizer,
    Participant,
}

impl ProgramRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::Participant => "participant",
        }
    }
}

impl Program {
    pub fn new(
        title: &str,
        category: Option<Category>,
        description: Option<&str>,
        organizer_id: Uuid,
        reward_hours: Option<Hours>,
    ) -> ResultEngine<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::InvalidInput("title is required".to_string()));
        }
        let description = description.map(str::trim).unwrap_or_default().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::InvalidInput(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        let reward_hours = reward_hours.unwrap_or(DEFAULT_REWARD);
        if reward_hours < MIN_REWARD {
            return Err(EngineError::InvalidAmount(format!(
                "reward must be at least {MIN_REWARD}"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            category: category.unwrap_or_default(),
            description,
            organizer_id,
            participants: Vec::new(),
            reward_hours,
            is_open: true,
            created_at: Utc::now(),
        })
    }

    pub fn has_participant(&self, user_id: Uuid) -> bool {
        self.participants.contains(&user_id)
    }

    /// Add `user_id` to the participants.
    ///
    /// Returns `false` when the user already joined; nothing changes then.
    pub fn admit(&mut self, user_id: Uuid) -> ResultEngine<bool> {
        if !self.is_open {
            return Err(EngineError::InvalidState("program is closed".to_string()));
        }
        if self.has_participant(user_id) {
            return Ok(false);
        }
        self.participants.push(user_id);
        Ok(true)
    }

    pub fn role_of(&self, user_id: Uuid) -> Option<ProgramRole> {
        if self.organizer_id == user_id {
            Some(ProgramRole::Organizer)
        } else if self.has_participant(user_id) {
            Some(ProgramRole::Participant)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "programs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub description: String,
    pub organizer_id: Uuid,
    pub reward_minor: i64,
    pub is_open: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::program_participants::Entity")]
    Participants,
}

impl Related<super::program_participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Program> for ActiveModel {
    fn from(p: &Program) -> Self {
        Self {
            id: ActiveValue::Set(p.id),
            title: ActiveValue::Set(p.title.clone()),
            category: ActiveValue::Set(p.category.as_str().to_string()),
            description: ActiveValue::Set(p.description.clone()),
            organizer_id: ActiveValue::Set(p.organizer_id),
            reward_minor: ActiveValue::Set(p.reward_hours.minor()),
            is_open: ActiveValue::Set(p.is_open),
            created_at: ActiveValue::Set(p.created_at),
        }
    }
}

impl Program {
    pub(crate) fn from_parts(
        model: Model,
        participants: Vec<super::program_participants::Model>,
    ) -> ResultEngine<Self> {
        let mut participants = participants;
        participants.sort_by_key(|p| p.joined_at);
        Ok(Self {
            id: model.id,
            title: model.title,
            category: Category::try_from(model.category.as_str())?,
            description: model.description,
            organizer_id: model.organizer_id,
            participants: participants.into_iter().map(|p| p.user_id).collect(),
            reward_hours: Hours::new(model.reward_minor),
            is_open: model.is_open,
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admit_is_idempotent() {
        let organizer = Uuid::new_v4();
        let a = Uuid::new_v4();
        let mut program = Program::new("Choir", None, None, organizer, Some(Hours::whole(5)))
            .unwrap();

        assert!(program.admit(a).unwrap());
        assert!(!program.admit(a).unwrap());
        assert_eq!(program.participants, vec![a]);
        assert_eq!(program.role_of(a), Some(ProgramRole::Participant));
        assert_eq!(program.role_of(organizer), Some(ProgramRole::Organizer));
    }

    #[test]
    fn closed_program_rejects_joins() {
        let mut program = Program::new("Choir", None, None, Uuid::new_v4(), None).unwrap();
        program.is_open = false;
        assert_eq!(
            program.admit(Uuid::new_v4()),
            Err(EngineError::InvalidState("program is closed".to_string()))
        );
    }

    #[test]
    fn new_applies_defaults_and_validates() {
        let program =
            Program::new("  Yoga  ", None, Some(" mornings "), Uuid::new_v4(), None).unwrap();
        assert_eq!(program.title, "Yoga");
        assert_eq!(program.description, "mornings");
        assert_eq!(program.category, Category::Other);
        assert_eq!(program.reward_hours, DEFAULT_REWARD);
        assert!(program.is_open);

        assert!(Program::new(" ", None, None, Uuid::new_v4(), None).is_err());
        assert!(Program::new("x", None, None, Uuid::new_v4(), Some(Hours::new(10))).is_err());
    }
}
