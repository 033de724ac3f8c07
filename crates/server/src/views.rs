//! Conversions between engine values and their JSON shapes.

use api_types::{
    Pagination,
    matchmaker::{RecommendationView, SuggestionView},
    program::ProgramView,
    session::{CancellationView, NotesView, SessionReviewView, SessionView},
    transaction::{BalancePairView, LedgerStatsView, MetadataView, TotalCountView, TransactionView},
    tutor::{
        AvailabilityView, ExpertiseView, ReviewView, ScheduleDayView, TimeSlotView, TutorView,
    },
    user::{RatingView, UserStatsView, UserView},
    wallet::WalletView,
};
use engine::{
    Availability, BalancePair, Category, EngineError, Expertise, LedgerStats, Paginated,
    Program, Rating, Recommendation, Review, ScheduleDay, Session, SessionNotes, Suggestion,
    TimeSlot, TimeWallet, TotalCount, Transaction, Tutor, User, UserStats, Weekday,
};
use uuid::Uuid;

pub fn pagination<T>(page: &Paginated<T>) -> Pagination {
    Pagination {
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_items: page.total_items,
    }
}

pub fn category(value: Option<&str>) -> Result<Option<Category>, EngineError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(Category::try_from)
        .transpose()
}

pub fn wallet(wallet: &TimeWallet) -> WalletView {
    WalletView {
        balance: wallet.balance.as_f64(),
        total_earned: wallet.total_earned.as_f64(),
        total_spent: wallet.total_spent.as_f64(),
    }
}

fn rating(rating: &Rating) -> RatingView {
    RatingView {
        average: rating.average,
        count: rating.count,
    }
}

pub fn user(user: &User) -> UserView {
    UserView {
        id: user.id,
        email: user.email.clone(),
        display_name: user.display_name.clone(),
        bio: user.bio.clone(),
        photo_url: user.photo_url.clone(),
        interests: user.interests.clone(),
        time_wallet: wallet(&user.wallet),
        is_tutor: user.is_tutor,
        tutor_id: user.tutor_id,
        rating: rating(&user.rating),
        created_at: user.created_at,
        last_login: user.last_login,
    }
}

pub fn user_stats(stats: &UserStats) -> UserStatsView {
    UserStatsView {
        time_wallet: wallet(&stats.wallet),
        rating: rating(&stats.rating),
        interests_count: stats.interests_count,
        is_tutor: stats.is_tutor,
        member_since: stats.member_since,
    }
}

pub fn expertise_from(view: ExpertiseView) -> Result<Expertise, EngineError> {
    Ok(Expertise {
        name: view.name.trim().to_string(),
        category: Category::try_from(view.category.trim())?,
        years_of_experience: view.years_of_experience,
    })
}

pub fn expertise_list(views: Vec<ExpertiseView>) -> Result<Vec<Expertise>, EngineError> {
    views.into_iter().map(expertise_from).collect()
}

pub fn availability_from(view: AvailabilityView) -> Result<Availability, EngineError> {
    let schedule = view
        .schedule
        .into_iter()
        .map(|day| {
            Ok(ScheduleDay {
                day: Weekday::try_from(day.day.as_str())?,
                slots: day
                    .slots
                    .into_iter()
                    .map(|slot| TimeSlot {
                        start_time: slot.start_time,
                        end_time: slot.end_time,
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>, EngineError>>()?;
    Ok(Availability {
        is_available: view.is_available,
        schedule,
    })
}

fn availability(availability: &Availability) -> AvailabilityView {
    AvailabilityView {
        is_available: availability.is_available,
        schedule: availability
            .schedule
            .iter()
            .map(|day| ScheduleDayView {
                day: day.day.as_str().to_string(),
                slots: day
                    .slots
                    .iter()
                    .map(|slot| TimeSlotView {
                        start_time: slot.start_time.clone(),
                        end_time: slot.end_time.clone(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

pub fn tutor(tutor: &Tutor) -> TutorView {
    TutorView {
        id: tutor.id,
        user_id: tutor.user_id,
        expertise: tutor
            .expertise
            .iter()
            .map(|e| ExpertiseView {
                name: e.name.clone(),
                category: e.category.as_str().to_string(),
                years_of_experience: e.years_of_experience,
            })
            .collect(),
        hourly_rate: tutor.hourly_rate.as_f64(),
        bio: tutor.bio.clone(),
        availability: availability(&tutor.availability),
        rating: rating(&tutor.rating),
        total_sessions: tutor.total_sessions,
        total_hours_taught: tutor.total_hours_taught.as_f64(),
        is_verified: tutor.is_verified,
        is_active: tutor.is_active,
        created_at: tutor.created_at,
    }
}

pub fn review(review: &Review) -> ReviewView {
    ReviewView {
        id: review.id,
        student_id: review.student_id,
        rating: review.rating,
        comment: review.comment.clone(),
        session_id: review.session_id,
        created_at: review.created_at,
    }
}

fn balance_pair(pair: &BalancePair) -> BalancePairView {
    BalancePairView {
        from: pair.from.as_f64(),
        to: pair.to.as_f64(),
    }
}

/// Render `tx` for `viewer`, reporting the kind from the viewer's side.
pub fn transaction(tx: &Transaction, viewer: Uuid) -> TransactionView {
    TransactionView {
        id: tx.id,
        kind: tx.kind_for(viewer).as_str().to_string(),
        from_user_id: tx.from_user_id,
        to_user_id: tx.to_user_id,
        amount: tx.amount.as_f64(),
        session_id: tx.session_id,
        skill: tx.skill.clone(),
        description: tx.description.clone(),
        status: tx.status.as_str().to_string(),
        balance_before: balance_pair(&tx.balance_before),
        balance_after: balance_pair(&tx.balance_after),
        metadata: MetadataView {
            category: tx.metadata.category.map(|c| c.as_str().to_string()),
            session_date: tx.metadata.session_date,
            notes: tx.metadata.notes.clone(),
        },
        created_at: tx.created_at,
    }
}

fn total_count(value: &TotalCount) -> TotalCountView {
    TotalCountView {
        total: value.total.as_f64(),
        count: value.count,
    }
}

pub fn ledger_stats(stats: &LedgerStats) -> LedgerStatsView {
    LedgerStatsView {
        earned: total_count(&stats.earned),
        spent: total_count(&stats.spent),
        balance: stats.balance.as_f64(),
        net_flow: stats.net_flow.as_f64(),
    }
}

pub fn notes_from(view: NotesView) -> SessionNotes {
    SessionNotes {
        tutor_notes: view.tutor_notes,
        student_notes: view.student_notes,
    }
}

pub fn session(session: &Session) -> SessionView {
    SessionView {
        id: session.id,
        tutor_id: session.tutor_id,
        student_id: session.student_id,
        skill: session.skill.clone(),
        category: session.category.as_str().to_string(),
        duration: session.duration.as_f64(),
        scheduled_date: session.scheduled_date,
        scheduled_time: session.scheduled_time.clone(),
        status: session.status.as_str().to_string(),
        meeting_link: session.meeting_link.clone(),
        location: session.location.clone(),
        description: session.description.clone(),
        notes: NotesView {
            tutor_notes: session.notes.tutor_notes.clone(),
            student_notes: session.notes.student_notes.clone(),
        },
        transaction_id: session.transaction_id,
        review: session.review.as_ref().map(|r| SessionReviewView {
            rating: r.rating,
            comment: r.comment.clone(),
            created_at: r.created_at,
        }),
        cancellation: session.cancellation.as_ref().map(|c| CancellationView {
            cancelled_by: c.cancelled_by,
            reason: c.reason.clone(),
            cancelled_at: c.cancelled_at,
        }),
        created_at: session.created_at,
    }
}

pub fn recommendation(rec: &Recommendation) -> RecommendationView {
    RecommendationView {
        tutor: tutor(&rec.tutor),
        match_score: rec.match_score,
        reason: rec.reason.clone(),
    }
}

pub fn suggestion(suggestion: &Suggestion) -> SuggestionView {
    SuggestionView {
        interest: suggestion.interest.clone(),
        tutors: suggestion.tutors.iter().map(tutor).collect(),
    }
}

pub fn program(program: &Program) -> ProgramView {
    ProgramView {
        id: program.id,
        title: program.title.clone(),
        category: program.category.as_str().to_string(),
        description: program.description.clone(),
        organizer_id: program.organizer_id,
        participants: program.participants.clone(),
        reward_hours: program.reward_hours.as_f64(),
        is_open: program.is_open,
        created_at: program.created_at,
    }
}
