//! The module contains the `Tutor` profile and its rating logic.
//!
//! A tutor profile is linked to exactly one [`User`](crate::User). Expertise
//! entries and reviews are stored in their own tables
//! ([`tutor_expertise`](crate::tutor_expertise) and
//! [`tutor_reviews`](crate::tutor_reviews)) and assembled here.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, Hours, Rating, ResultEngine, sessions::validate_time,
    tutor_expertise::Expertise, tutor_reviews::Review,
};

pub const MIN_HOURLY_RATE: Hours = Hours::HALF;
pub const MAX_BIO_LEN: usize = 1000;
pub const MAX_REVIEW_COMMENT_LEN: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

impl TryFrom<&str> for Weekday {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == lower)
            .ok_or_else(|| EngineError::InvalidInput(format!("invalid weekday: {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDay {
    pub day: Weekday,
    pub slots: Vec<TimeSlot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub is_available: bool,
    pub schedule: Vec<ScheduleDay>,
}

impl Default for Availability {
    fn default() -> Self {
        Self {
            is_available: true,
            schedule: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expertise: Vec<Expertise>,
    pub hourly_rate: Hours,
    pub bio: String,
    pub availability: Availability,
    pub rating: Rating,
    pub reviews: Vec<Review>,
    pub total_sessions: i64,
    pub total_hours_taught: Hours,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Tutor {
    pub fn new(
        user_id: Uuid,
        expertise: Vec<Expertise>,
        hourly_rate: Hours,
        bio: String,
        availability: Availability,
    ) -> ResultEngine<Self> {
        validate_profile(&expertise, hourly_rate, &bio, &availability)?;
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            expertise,
            hourly_rate,
            bio,
            availability,
            rating: Rating::default(),
            reviews: Vec::new(),
            total_sessions: 0,
            total_hours_taught: Hours::ZERO,
            is_verified: false,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    /// Append a review and recompute the rating as the unweighted mean of all
    /// review ratings.
    pub fn add_review(
        &mut self,
        student_id: Uuid,
        rating: u8,
        comment: Option<String>,
        session_id: Option<Uuid>,
    ) -> ResultEngine<&Review> {
        validate_rating(rating)?;
        if comment
            .as_ref()
            .is_some_and(|c| c.chars().count() > MAX_REVIEW_COMMENT_LEN)
        {
            return Err(EngineError::InvalidInput(format!(
                "comment must be at most {MAX_REVIEW_COMMENT_LEN} characters"
            )));
        }

        self.reviews.push(Review {
            id: Uuid::new_v4(),
            student_id,
            rating,
            comment,
            session_id,
            created_at: Utc::now(),
        });
        self.rating = mean_rating(&self.reviews);

        Ok(&self.reviews[self.reviews.len() - 1])
    }

    /// Account for a completed session taught by this tutor.
    pub fn record_session(&mut self, duration: Hours) -> ResultEngine<()> {
        self.total_hours_taught = self.total_hours_taught.try_add(duration)?;
        self.total_sessions += 1;
        Ok(())
    }

    /// Name of the first expertise entry, if any.
    pub fn primary_skill(&self) -> Option<&str> {
        self.expertise.first().map(|e| e.name.as_str())
    }
}

pub(crate) fn mean_rating(reviews: &[Review]) -> Rating {
    if reviews.is_empty() {
        return Rating::default();
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
    Rating {
        average: f64::from(total) / reviews.len() as f64,
        count: reviews.len() as i64,
    }
}

pub(crate) fn validate_rating(rating: u8) -> ResultEngine<()> {
    if !(1..=5).contains(&rating) {
        return Err(EngineError::InvalidInput(
            "rating must be between 1 and 5".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_profile(
    expertise: &[Expertise],
    hourly_rate: Hours,
    bio: &str,
    availability: &Availability,
) -> ResultEngine<()> {
    if hourly_rate < MIN_HOURLY_RATE {
        return Err(EngineError::InvalidAmount(format!(
            "hourly rate must be at least {MIN_HOURLY_RATE}"
        )));
    }
    if bio.trim().is_empty() {
        return Err(EngineError::InvalidInput("bio is required".to_string()));
    }
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(EngineError::InvalidInput(format!(
            "bio must be at most {MAX_BIO_LEN} characters"
        )));
    }
    for entry in expertise {
        if entry.name.trim().is_empty() {
            return Err(EngineError::InvalidInput(
                "expertise name must not be empty".to_string(),
            ));
        }
        if entry.years_of_experience < 0 {
            return Err(EngineError::InvalidInput(
                "years of experience must be >= 0".to_string(),
            ));
        }
    }
    validate_schedule(&availability.schedule)
}

/// Every slot must be a well-formed "HH:MM" range that ends after it starts.
fn validate_schedule(schedule: &[ScheduleDay]) -> ResultEngine<()> {
    for slot in schedule.iter().flat_map(|day| day.slots.iter()) {
        validate_time(&slot.start_time)?;
        validate_time(&slot.end_time)?;
        // Zero-padded times order lexically.
        if slot.start_time >= slot.end_time {
            return Err(EngineError::InvalidInput(format!(
                "time slot {}-{} must end after it starts",
                slot.start_time, slot.end_time
            )));
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tutors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub hourly_rate_minor: i64,
    pub bio: String,
    pub is_available: bool,
    /// JSON array of `ScheduleDay`.
    pub schedule: String,
    pub rating_average: f64,
    pub rating_count: i64,
    pub total_sessions: i64,
    pub total_hours_taught_minor: i64,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tutor_expertise::Entity")]
    Expertise,
    #[sea_orm(has_many = "super::tutor_reviews::Entity")]
    Reviews,
}

impl Related<super::tutor_expertise::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expertise.def()
    }
}

impl Related<super::tutor_reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Tutor> for ActiveModel {
    fn from(tutor: &Tutor) -> Self {
        Self {
            id: ActiveValue::Set(tutor.id),
            user_id: ActiveValue::Set(tutor.user_id),
            hourly_rate_minor: ActiveValue::Set(tutor.hourly_rate.minor()),
            bio: ActiveValue::Set(tutor.bio.clone()),
            is_available: ActiveValue::Set(tutor.availability.is_available),
            schedule: ActiveValue::Set(
                serde_json::to_string(&tutor.availability.schedule)
                    .unwrap_or_else(|_| "[]".to_string()),
            ),
            rating_average: ActiveValue::Set(tutor.rating.average),
            rating_count: ActiveValue::Set(tutor.rating.count),
            total_sessions: ActiveValue::Set(tutor.total_sessions),
            total_hours_taught_minor: ActiveValue::Set(tutor.total_hours_taught.minor()),
            is_verified: ActiveValue::Set(tutor.is_verified),
            is_active: ActiveValue::Set(tutor.is_active),
            created_at: ActiveValue::Set(tutor.created_at),
        }
    }
}

impl Tutor {
    /// Assemble a tutor from its row plus its expertise and review rows.
    pub(crate) fn from_parts(
        model: Model,
        expertise: Vec<super::tutor_expertise::Model>,
        reviews: Vec<super::tutor_reviews::Model>,
    ) -> ResultEngine<Self> {
        let schedule = if model.schedule.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&model.schedule).map_err(|err| {
                EngineError::InvalidInput(format!("invalid schedule column: {err}"))
            })?
        };

        let mut expertise = expertise;
        expertise.sort_by_key(|e| e.position);
        let mut reviews = reviews;
        reviews.sort_by_key(|r| r.created_at);

        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            expertise: expertise
                .into_iter()
                .map(Expertise::try_from)
                .collect::<ResultEngine<_>>()?,
            hourly_rate: Hours::new(model.hourly_rate_minor),
            bio: model.bio,
            availability: Availability {
                is_available: model.is_available,
                schedule,
            },
            rating: Rating {
                average: model.rating_average,
                count: model.rating_count,
            },
            reviews: reviews
                .into_iter()
                .map(Review::try_from)
                .collect::<ResultEngine<_>>()?,
            total_sessions: model.total_sessions,
            total_hours_taught: Hours::new(model.total_hours_taught_minor),
            is_verified: model.is_verified,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}
