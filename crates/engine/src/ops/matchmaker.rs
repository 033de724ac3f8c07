use sea_orm::{QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*};
use serde::Serialize;
use uuid::Uuid;

use crate::{MatchQuery, Recommendation, ResultEngine, Tutor, User, matchmaker, tutors};

use super::{
    Engine,
    tutors::{apply_category, apply_search},
    with_tx,
};

/// Interests considered for suggestions, in profile order.
pub const SUGGESTED_INTERESTS: usize = 3;
pub const TUTORS_PER_INTEREST: u64 = 2;

/// Tutors suggested for one of the user's interests.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Suggestion {
    pub interest: String,
    pub tutors: Vec<Tutor>,
}

fn bookable() -> sea_orm::Select<tutors::Entity> {
    tutors::Entity::find()
        .filter(tutors::Column::IsActive.eq(true))
        .filter(tutors::Column::IsAvailable.eq(true))
}

impl Engine {
    /// Rank tutors for a free-text or structured request.
    pub async fn recommend(&self, query: &MatchQuery) -> ResultEngine<Vec<Recommendation>> {
        with_tx!(self, |db_tx| {
            let mut select = bookable();
            if let Some(category) = query.category {
                select = apply_category(select, category);
            }
            let models = select.all(&db_tx).await?;
            let candidates = self.assemble_tutors(&db_tx, models).await?;
            Ok(matchmaker::recommend(candidates, query))
        })
    }

    /// Up to two tutors for each of the first interests of `user_id`.
    ///
    /// Interests without a matching tutor are left out.
    pub async fn suggestions(&self, user_id: Uuid) -> ResultEngine<Vec<Suggestion>> {
        with_tx!(self, |db_tx| {
            let user = User::try_from(self.require_user(&db_tx, user_id).await?)?;

            let mut suggestions = Vec::new();
            for interest in user.interests.iter().take(SUGGESTED_INTERESTS) {
                let models = apply_search(bookable(), interest)
                    .order_by_desc(tutors::Column::RatingAverage)
                    .order_by_asc(tutors::Column::Id)
                    .limit(TUTORS_PER_INTEREST)
                    .all(&db_tx)
                    .await?;
                if models.is_empty() {
                    continue;
                }
                suggestions.push(Suggestion {
                    interest: interest.clone(),
                    tutors: self.assemble_tutors(&db_tx, models).await?,
                });
            }
            Ok(suggestions)
        })
    }
}
