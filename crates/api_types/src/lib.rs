//! JSON types exchanged over the HTTP API.
//!
//! Hours travel as decimal numbers (`1.5` is an hour and a half); enums travel
//! as their snake_case names.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Success envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            pagination: None,
        }
    }

    pub fn paged(data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination: Some(pagination),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
}

/// Error envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

pub mod auth {
    use super::*;

    /// Optional profile hints used when the account is created.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct VerifyRequest {
        pub display_name: Option<String>,
        pub photo_url: Option<String>,
    }
}

pub mod wallet {
    use super::*;
    use crate::transaction::TransactionView;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct WalletView {
        pub balance: f64,
        pub total_earned: f64,
        pub total_spent: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletAdjust {
        pub amount: f64,
        /// `add` or `subtract`.
        #[serde(rename = "type")]
        pub direction: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletAdjusted {
        pub wallet: WalletView,
        pub transaction: TransactionView,
    }
}

pub mod user {
    use super::*;
    use crate::wallet::WalletView;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct RatingView {
        pub average: f64,
        pub count: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub email: String,
        pub display_name: String,
        pub bio: String,
        pub photo_url: Option<String>,
        pub interests: Vec<String>,
        pub time_wallet: WalletView,
        pub is_tutor: bool,
        pub tutor_id: Option<Uuid>,
        pub rating: RatingView,
        pub created_at: DateTime<Utc>,
        pub last_login: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserListQuery {
        pub search: Option<String>,
        pub is_tutor: Option<bool>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProfileUpdate {
        pub display_name: Option<String>,
        pub bio: Option<String>,
        pub photo_url: Option<String>,
        pub interests: Option<Vec<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserStatsView {
        pub time_wallet: WalletView,
        pub rating: RatingView,
        pub interests_count: usize,
        pub is_tutor: bool,
        pub member_since: DateTime<Utc>,
    }
}

pub mod tutor {
    use super::*;
    use crate::user::RatingView;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ExpertiseView {
        pub name: String,
        pub category: String,
        #[serde(default)]
        pub years_of_experience: i32,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TimeSlotView {
        pub start_time: String,
        pub end_time: String,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct ScheduleDayView {
        pub day: String,
        #[serde(default)]
        pub slots: Vec<TimeSlotView>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AvailabilityView {
        pub is_available: bool,
        #[serde(default)]
        pub schedule: Vec<ScheduleDayView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReviewView {
        pub id: Uuid,
        pub student_id: Uuid,
        pub rating: u8,
        pub comment: Option<String>,
        pub session_id: Option<Uuid>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TutorView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub expertise: Vec<ExpertiseView>,
        pub hourly_rate: f64,
        pub bio: String,
        pub availability: AvailabilityView,
        pub rating: RatingView,
        pub total_sessions: i64,
        pub total_hours_taught: f64,
        pub is_verified: bool,
        pub is_active: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TutorNew {
        #[serde(default)]
        pub expertise: Vec<ExpertiseView>,
        pub hourly_rate: f64,
        pub bio: String,
        pub availability: Option<AvailabilityView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TutorUpdate {
        pub expertise: Option<Vec<ExpertiseView>>,
        pub hourly_rate: Option<f64>,
        pub bio: Option<String>,
        pub availability: Option<AvailabilityView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TutorListQuery {
        pub category: Option<String>,
        pub search: Option<String>,
        pub available: Option<bool>,
        pub min_rating: Option<f64>,
        /// `rating` (default), `rate`, `sessions` or `newest`.
        pub sort: Option<String>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReviewNew {
        pub rating: u8,
        pub comment: Option<String>,
        pub session_id: Option<Uuid>,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct BalancePairView {
        pub from: f64,
        pub to: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MetadataView {
        pub category: Option<String>,
        pub session_date: Option<NaiveDate>,
        pub notes: Option<String>,
    }

    /// A ledger entry as seen by the caller: `kind` is reported from the
    /// caller's side, so the receiving end of a session payment sees `earned`.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub kind: String,
        pub from_user_id: Uuid,
        pub to_user_id: Uuid,
        pub amount: f64,
        pub session_id: Option<Uuid>,
        pub skill: String,
        pub description: Option<String>,
        pub status: String,
        pub balance_before: BalancePairView,
        pub balance_after: BalancePairView,
        pub metadata: MetadataView,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ManualTxNew {
        /// `earned` or `spent`.
        #[serde(rename = "type")]
        pub kind: String,
        pub amount: f64,
        pub skill: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        #[serde(rename = "type")]
        pub kind: Option<String>,
        pub status: Option<String>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TotalCountView {
        pub total: f64,
        pub count: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LedgerStatsView {
        pub earned: TotalCountView,
        pub spent: TotalCountView,
        pub balance: f64,
        pub net_flow: f64,
    }
}

pub mod session {
    use super::*;
    use crate::transaction::TransactionView;

    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct NotesView {
        pub tutor_notes: Option<String>,
        pub student_notes: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionReviewView {
        pub rating: u8,
        pub comment: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CancellationView {
        pub cancelled_by: Uuid,
        pub reason: Option<String>,
        pub cancelled_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionView {
        pub id: Uuid,
        pub tutor_id: Uuid,
        pub student_id: Uuid,
        pub skill: String,
        pub category: String,
        pub duration: f64,
        pub scheduled_date: NaiveDate,
        pub scheduled_time: String,
        pub status: String,
        pub meeting_link: Option<String>,
        pub location: String,
        pub description: Option<String>,
        pub notes: NotesView,
        pub transaction_id: Option<Uuid>,
        pub review: Option<SessionReviewView>,
        pub cancellation: Option<CancellationView>,
        pub created_at: DateTime<Utc>,
    }

    /// Booking request; `tutor_id` is the tutor's user id.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionNew {
        pub tutor_id: Uuid,
        pub skill: String,
        pub category: Option<String>,
        pub duration: f64,
        pub scheduled_date: NaiveDate,
        pub scheduled_time: String,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionRequest {
        pub tutor_id: Uuid,
        pub skill: String,
        pub message: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SessionUpdate {
        pub status: Option<String>,
        pub meeting_link: Option<String>,
        pub notes: Option<NotesView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SessionCancel {
        pub reason: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionReviewNew {
        pub rating: u8,
        pub comment: Option<String>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SessionListQuery {
        pub status: Option<String>,
        pub upcoming: Option<bool>,
        pub page: Option<u64>,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SessionCompleted {
        pub session: SessionView,
        pub transaction: TransactionView,
    }
}

pub mod matchmaker {
    use super::*;
    use crate::tutor::TutorView;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecommendRequest {
        pub query: Option<String>,
        pub category: Option<String>,
        #[serde(default)]
        pub skills: Vec<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecommendationView {
        pub tutor: TutorView,
        pub match_score: u8,
        pub reason: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SuggestionView {
        pub interest: String,
        pub tutors: Vec<TutorView>,
    }
}

pub mod program {
    use super::*;
    use crate::transaction::TransactionView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramView {
        pub id: Uuid,
        pub title: String,
        pub category: String,
        pub description: String,
        pub organizer_id: Uuid,
        pub participants: Vec<Uuid>,
        pub reward_hours: f64,
        pub is_open: bool,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramNew {
        pub title: String,
        pub category: Option<String>,
        pub description: Option<String>,
        pub reward_hours: Option<f64>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ProgramListQuery {
        pub category: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct JoinedProgramView {
        #[serde(flatten)]
        pub program: ProgramView,
        pub role: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProgramJoined {
        pub program: ProgramView,
        pub transaction: Option<TransactionView>,
    }
}
