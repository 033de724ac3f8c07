//! Teaching sessions and their lifecycle.
//!
//! ```text
//! pending -> confirmed -> in_progress -> completed
//!    \___________\______________\______-> cancelled
//! ```
//!
//! `completed` and `cancelled` are terminal. Forward moves may skip a state;
//! nothing moves backwards.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError, Hours, ResultEngine, tutors::validate_rating};

pub const MIN_DURATION: Hours = Hours::HALF;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_NOTE_LEN: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Confirmed => 1,
            Self::InProgress => 2,
            Self::Completed => 3,
            Self::Cancelled => 4,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Cancelled => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl TryFrom<&str> for SessionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            // Accept the hyphenated spelling used by older clients.
            "in_progress" | "in-progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(EngineError::InvalidInput(format!(
                "invalid session status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNotes {
    pub tutor_notes: Option<String>,
    pub student_notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReview {
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: Uuid,
    pub reason: Option<String>,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub skill: String,
    pub category: Category,
    pub duration: Hours,
    pub scheduled_date: NaiveDate,
    /// "HH:MM"
    pub scheduled_time: String,
    pub status: SessionStatus,
    pub meeting_link: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub notes: SessionNotes,
    pub transaction_id: Option<Uuid>,
    pub review: Option<SessionReview>,
    pub cancellation: Option<Cancellation>,
    pub created_at: DateTime<Utc>,
}

/// Which side of a session a user is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionRole {
    Tutor,
    Student,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tutor_id: Uuid,
        student_id: Uuid,
        skill: String,
        category: Category,
        duration: Hours,
        scheduled_date: NaiveDate,
        scheduled_time: String,
        description: Option<String>,
    ) -> ResultEngine<Self> {
        if tutor_id == student_id {
            return Err(EngineError::InvalidInput(
                "cannot book a session with yourself".to_string(),
            ));
        }
        let skill = skill.trim().to_string();
        if skill.is_empty() {
            return Err(EngineError::InvalidInput("skill is required".to_string()));
        }
        if duration < MIN_DURATION {
            return Err(EngineError::InvalidAmount(format!(
                "duration must be at least {MIN_DURATION}"
            )));
        }
        validate_time(&scheduled_time)?;
        check_len(description.as_deref(), MAX_DESCRIPTION_LEN, "description")?;

        Ok(Self {
            id: Uuid::new_v4(),
            tutor_id,
            student_id,
            skill,
            category,
            duration,
            scheduled_date,
            scheduled_time,
            status: SessionStatus::Pending,
            meeting_link: None,
            location: "Online".to_string(),
            description,
            notes: SessionNotes::default(),
            transaction_id: None,
            review: None,
            cancellation: None,
            created_at: Utc::now(),
        })
    }

    /// Role of `user_id` on this session, if it is a party to it.
    pub fn role_of(&self, user_id: Uuid) -> Option<SessionRole> {
        if self.tutor_id == user_id {
            Some(SessionRole::Tutor)
        } else if self.student_id == user_id {
            Some(SessionRole::Student)
        } else {
            None
        }
    }

    pub fn require_party(&self, user_id: Uuid, action: &str) -> ResultEngine<SessionRole> {
        self.role_of(user_id)
            .ok_or_else(|| EngineError::Forbidden(format!("not allowed to {action} this session")))
    }

    /// Move along the lifecycle through a generic update.
    ///
    /// Only non-terminal forward moves are accepted here; completion and
    /// cancellation have dedicated operations. Re-sending the current status
    /// is a no-op.
    pub fn advance_to(&mut self, next: SessionStatus) -> ResultEngine<()> {
        if next == self.status {
            return Ok(());
        }
        if next.is_terminal() {
            return Err(EngineError::InvalidState(format!(
                "use the dedicated operation to mark a session {}",
                next.as_str()
            )));
        }
        if !self.status.can_transition_to(next) {
            return Err(EngineError::InvalidState(format!(
                "cannot move session from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        Ok(())
    }

    pub fn merge_notes(&mut self, notes: SessionNotes) -> ResultEngine<()> {
        check_len(notes.tutor_notes.as_deref(), MAX_NOTE_LEN, "tutor notes")?;
        check_len(notes.student_notes.as_deref(), MAX_NOTE_LEN, "student notes")?;
        if notes.tutor_notes.is_some() {
            self.notes.tutor_notes = notes.tutor_notes;
        }
        if notes.student_notes.is_some() {
            self.notes.student_notes = notes.student_notes;
        }
        Ok(())
    }

    /// Mark the session completed. The ledger side is handled by the caller.
    pub fn complete(&mut self) -> ResultEngine<()> {
        match self.status {
            SessionStatus::Completed => Err(EngineError::InvalidState(
                "session already completed".to_string(),
            )),
            SessionStatus::Cancelled => Err(EngineError::InvalidState(
                "cannot complete a cancelled session".to_string(),
            )),
            _ => {
                self.status = SessionStatus::Completed;
                Ok(())
            }
        }
    }

    pub fn cancel(&mut self, by: Uuid, reason: Option<String>) -> ResultEngine<()> {
        if self.status.is_terminal() {
            return Err(EngineError::InvalidState(
                "cannot cancel this session".to_string(),
            ));
        }
        check_len(reason.as_deref(), MAX_NOTE_LEN, "reason")?;
        self.status = SessionStatus::Cancelled;
        self.cancellation = Some(Cancellation {
            cancelled_by: by,
            reason,
            cancelled_at: Utc::now(),
        });
        Ok(())
    }

    pub fn set_review(&mut self, rating: u8, comment: Option<String>) -> ResultEngine<()> {
        if self.status != SessionStatus::Completed {
            return Err(EngineError::InvalidState(
                "can only review completed sessions".to_string(),
            ));
        }
        if self.review.is_some() {
            return Err(EngineError::InvalidState(
                "session already reviewed".to_string(),
            ));
        }
        validate_rating(rating)?;
        check_len(comment.as_deref(), MAX_NOTE_LEN, "comment")?;
        self.review = Some(SessionReview {
            rating,
            comment,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

fn check_len(value: Option<&str>, max: usize, label: &str) -> ResultEngine<()> {
    if value.is_some_and(|v| v.chars().count() > max) {
        return Err(EngineError::InvalidInput(format!(
            "{label} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// Validate an "HH:MM" wall-clock time.
pub(crate) fn validate_time(value: &str) -> ResultEngine<()> {
    let invalid = || EngineError::InvalidInput(format!("invalid time: {value}"));
    let (h, m) = value.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let h: u8 = h.parse().map_err(|_| invalid())?;
    let m: u8 = m.parse().map_err(|_| invalid())?;
    if h > 23 || m > 59 {
        return Err(invalid());
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tutor_id: Uuid,
    pub student_id: Uuid,
    pub skill: String,
    pub category: String,
    pub duration_minor: i64,
    pub scheduled_date: Date,
    pub scheduled_time: String,
    pub status: String,
    pub meeting_link: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub tutor_notes: Option<String>,
    pub student_notes: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub review_rating: Option<i32>,
    pub review_comment: Option<String>,
    pub reviewed_at: Option<DateTimeUtc>,
    pub cancelled_by: Option<Uuid>,
    pub cancel_reason: Option<String>,
    pub cancelled_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Session> for ActiveModel {
    fn from(s: &Session) -> Self {
        Self {
            id: ActiveValue::Set(s.id),
            tutor_id: ActiveValue::Set(s.tutor_id),
            student_id: ActiveValue::Set(s.student_id),
            skill: ActiveValue::Set(s.skill.clone()),
            category: ActiveValue::Set(s.category.as_str().to_string()),
            duration_minor: ActiveValue::Set(s.duration.minor()),
            scheduled_date: ActiveValue::Set(s.scheduled_date),
            scheduled_time: ActiveValue::Set(s.scheduled_time.clone()),
            status: ActiveValue::Set(s.status.as_str().to_string()),
            meeting_link: ActiveValue::Set(s.meeting_link.clone()),
            location: ActiveValue::Set(s.location.clone()),
            description: ActiveValue::Set(s.description.clone()),
            tutor_notes: ActiveValue::Set(s.notes.tutor_notes.clone()),
            student_notes: ActiveValue::Set(s.notes.student_notes.clone()),
            transaction_id: ActiveValue::Set(s.transaction_id),
            review_rating: ActiveValue::Set(s.review.as_ref().map(|r| i32::from(r.rating))),
            review_comment: ActiveValue::Set(s.review.as_ref().and_then(|r| r.comment.clone())),
            reviewed_at: ActiveValue::Set(s.review.as_ref().map(|r| r.created_at)),
            cancelled_by: ActiveValue::Set(s.cancellation.as_ref().map(|c| c.cancelled_by)),
            cancel_reason: ActiveValue::Set(
                s.cancellation.as_ref().and_then(|c| c.reason.clone()),
            ),
            cancelled_at: ActiveValue::Set(s.cancellation.as_ref().map(|c| c.cancelled_at)),
            created_at: ActiveValue::Set(s.created_at),
        }
    }
}

impl TryFrom<Model> for Session {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let review = match (model.review_rating, model.reviewed_at) {
            (Some(rating), Some(created_at)) => Some(SessionReview {
                rating: u8::try_from(rating)
                    .map_err(|_| EngineError::InvalidInput(format!("invalid rating: {rating}")))?,
                comment: model.review_comment,
                created_at,
            }),
            _ => None,
        };
        let cancellation = match (model.cancelled_by, model.cancelled_at) {
            (Some(cancelled_by), Some(cancelled_at)) => Some(Cancellation {
                cancelled_by,
                reason: model.cancel_reason,
                cancelled_at,
            }),
            _ => None,
        };

        Ok(Self {
            id: model.id,
            tutor_id: model.tutor_id,
            student_id: model.student_id,
            skill: model.skill,
            category: Category::try_from(model.category.as_str())?,
            duration: Hours::new(model.duration_minor),
            scheduled_date: model.scheduled_date,
            scheduled_time: model.scheduled_time,
            status: SessionStatus::try_from(model.status.as_str())?,
            meeting_link: model.meeting_link,
            location: model.location,
            description: model.description,
            notes: SessionNotes {
                tutor_notes: model.tutor_notes,
                student_notes: model.student_notes,
            },
            transaction_id: model.transaction_id,
            review,
            cancellation,
            created_at: model.created_at,
        })
    }
}
