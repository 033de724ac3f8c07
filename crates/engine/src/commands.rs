//! Command structs for engine operations.
//!
//! These types group parameters for write operations (booking, ledger
//! entries, profile changes), keeping call sites readable and avoiding long
//! argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    Availability, Category, Expertise, Hours, SessionNotes, SessionStatus, TransactionKind,
};

/// Book a session with a tutor.
#[derive(Clone, Debug)]
pub struct BookSessionCmd {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub skill: String,
    pub category: Category,
    pub duration: Hours,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: String,
    pub description: Option<String>,
}

impl BookSessionCmd {
    #[must_use]
    pub fn new(
        tutor_id: Uuid,
        student_id: Uuid,
        skill: impl Into<String>,
        duration: Hours,
        scheduled_date: NaiveDate,
        scheduled_time: impl Into<String>,
    ) -> Self {
        Self {
            tutor_id,
            student_id,
            skill: skill.into(),
            category: Category::Other,
            duration,
            scheduled_date,
            scheduled_time: scheduled_time.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Quick session request: one hour, scheduled now, category `other`.
#[derive(Clone, Debug)]
pub struct SessionRequestCmd {
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub skill: String,
    pub message: Option<String>,
}

/// Generic update of a session by one of its parties.
#[derive(Clone, Debug, Default)]
pub struct SessionUpdateCmd {
    pub status: Option<SessionStatus>,
    pub meeting_link: Option<String>,
    pub notes: Option<SessionNotes>,
}

impl SessionUpdateCmd {
    #[must_use]
    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn meeting_link(mut self, link: impl Into<String>) -> Self {
        self.meeting_link = Some(link.into());
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: SessionNotes) -> Self {
        self.notes = Some(notes);
        self
    }
}

/// Manual ledger entry on the caller's own wallet.
#[derive(Clone, Debug)]
pub struct ManualTxCmd {
    pub user_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Hours,
    pub skill: String,
    pub description: Option<String>,
}

impl ManualTxCmd {
    #[must_use]
    pub fn new(
        user_id: Uuid,
        kind: TransactionKind,
        amount: Hours,
        skill: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            kind,
            amount,
            skill: skill.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdjustDirection {
    Add,
    Subtract,
}

impl TryFrom<&str> for AdjustDirection {
    type Error = crate::EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "add" => Ok(Self::Add),
            "subtract" => Ok(Self::Subtract),
            other => Err(crate::EngineError::InvalidInput(format!(
                "invalid adjustment type: {other}"
            ))),
        }
    }
}

/// New tutor profile for an existing user.
#[derive(Clone, Debug)]
pub struct TutorProfileCmd {
    pub expertise: Vec<Expertise>,
    pub hourly_rate: Hours,
    pub bio: String,
    pub availability: Option<Availability>,
}

/// Partial update of a tutor profile; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct TutorUpdateCmd {
    pub expertise: Option<Vec<Expertise>>,
    pub hourly_rate: Option<Hours>,
    pub bio: Option<String>,
    pub availability: Option<Availability>,
}

/// Partial update of a user profile; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct ProfileUpdateCmd {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub photo_url: Option<String>,
    pub interests: Option<Vec<String>>,
}

/// Create a program organized by `organizer_id`.
#[derive(Clone, Debug)]
pub struct NewProgramCmd {
    pub organizer_id: Uuid,
    pub title: String,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub reward_hours: Option<Hours>,
}

impl NewProgramCmd {
    #[must_use]
    pub fn new(organizer_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            organizer_id,
            title: title.into(),
            category: None,
            description: None,
            reward_hours: None,
        }
    }

    #[must_use]
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn reward_hours(mut self, reward: Hours) -> Self {
        self.reward_hours = Some(reward);
        self
    }
}
