use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, QueryTrait, Select, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    Category, EngineError, Expertise, Page, Paginated, Review, ResultEngine, Tutor,
    TutorProfileCmd, TutorUpdateCmd, tutor_expertise, tutor_reviews, tutors, users,
};

use super::{Engine, normalize_optional_text, with_tx};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TutorSort {
    /// Rating desc, then sessions desc.
    #[default]
    Rating,
    /// Cheapest first.
    HourlyRate,
    /// Most sessions taught first.
    Sessions,
    Newest,
}

impl TryFrom<&str> for TutorSort {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "rating" => Ok(Self::Rating),
            "rate" | "hourly_rate" => Ok(Self::HourlyRate),
            "sessions" => Ok(Self::Sessions),
            "newest" => Ok(Self::Newest),
            other => Err(EngineError::InvalidInput(format!(
                "invalid sort order: {other}"
            ))),
        }
    }
}

/// Filters for listing tutors. Only active tutors are ever listed.
#[derive(Clone, Debug, Default)]
pub struct TutorListFilter {
    pub category: Option<Category>,
    /// Case-insensitive match on expertise names or bio.
    pub search: Option<String>,
    pub available_only: bool,
    pub min_rating: Option<f64>,
    pub sort: TutorSort,
}

/// Ids of tutors with at least one expertise entry matching `condition`.
fn tutors_with_expertise(condition: Condition) -> sea_orm::sea_query::SelectStatement {
    tutor_expertise::Entity::find()
        .select_only()
        .column(tutor_expertise::Column::TutorId)
        .filter(condition)
        .into_query()
}

pub(super) fn apply_category(
    select: Select<tutors::Entity>,
    category: Category,
) -> Select<tutors::Entity> {
    select.filter(tutors::Column::Id.in_subquery(tutors_with_expertise(
        Condition::all().add(tutor_expertise::Column::Category.eq(category.as_str())),
    )))
}

pub(super) fn apply_search(select: Select<tutors::Entity>, search: &str) -> Select<tutors::Entity> {
    select.filter(
        Condition::any()
            .add(tutors::Column::Bio.contains(search))
            .add(tutors::Column::Id.in_subquery(tutors_with_expertise(
                Condition::all().add(tutor_expertise::Column::Name.contains(search)),
            ))),
    )
}

impl Engine {
    /// Turn a user into a tutor.
    ///
    /// Fails with `ExistingKey` when the user already has a tutor profile.
    pub async fn create_tutor_profile(
        &self,
        user_id: Uuid,
        cmd: TutorProfileCmd,
    ) -> ResultEngine<Tutor> {
        with_tx!(self, |db_tx| {
            let user_model = self.require_user(&db_tx, user_id).await?;
            let existing = tutors::Entity::find()
                .filter(tutors::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?;
            if user_model.is_tutor || existing.is_some() {
                return Err(EngineError::ExistingKey("tutor profile".to_string()));
            }

            let tutor = Tutor::new(
                user_id,
                cmd.expertise,
                cmd.hourly_rate,
                cmd.bio.trim().to_string(),
                cmd.availability.unwrap_or_default(),
            )?;
            tutors::ActiveModel::from(&tutor).insert(&db_tx).await?;
            self.insert_expertise(&db_tx, tutor.id, &tutor.expertise)
                .await?;

            let mut active: users::ActiveModel = user_model.into();
            active.is_tutor = ActiveValue::Set(true);
            active.tutor_id = ActiveValue::Set(Some(tutor.id));
            active.update(&db_tx).await?;

            tracing::info!(user = %user_id, tutor = %tutor.id, "tutor profile created");
            Ok(tutor)
        })
    }

    /// Update the caller's own tutor profile.
    pub async fn update_tutor(
        &self,
        user_id: Uuid,
        tutor_id: Uuid,
        cmd: TutorUpdateCmd,
    ) -> ResultEngine<Tutor> {
        with_tx!(self, |db_tx| {
            let mut tutor = self.require_tutor(&db_tx, tutor_id).await?;
            if tutor.user_id != user_id {
                return Err(EngineError::Forbidden(
                    "not allowed to update this tutor profile".to_string(),
                ));
            }

            let replace_expertise = cmd.expertise.is_some();
            if let Some(expertise) = cmd.expertise {
                tutor.expertise = expertise;
            }
            if let Some(rate) = cmd.hourly_rate {
                tutor.hourly_rate = rate;
            }
            if let Some(bio) = cmd.bio {
                tutor.bio = bio.trim().to_string();
            }
            if let Some(availability) = cmd.availability {
                tutor.availability = availability;
            }
            tutors::validate_profile(
                &tutor.expertise,
                tutor.hourly_rate,
                &tutor.bio,
                &tutor.availability,
            )?;

            tutors::ActiveModel::from(&tutor).update(&db_tx).await?;
            if replace_expertise {
                tutor_expertise::Entity::delete_many()
                    .filter(tutor_expertise::Column::TutorId.eq(tutor.id))
                    .exec(&db_tx)
                    .await?;
                self.insert_expertise(&db_tx, tutor.id, &tutor.expertise)
                    .await?;
            }

            Ok(tutor)
        })
    }

    /// Return a tutor with its expertise and reviews.
    pub async fn tutor(&self, tutor_id: Uuid) -> ResultEngine<Tutor> {
        with_tx!(self, |db_tx| self.require_tutor(&db_tx, tutor_id).await)
    }

    pub async fn list_tutors(
        &self,
        filter: &TutorListFilter,
        page: Page,
    ) -> ResultEngine<Paginated<Tutor>> {
        with_tx!(self, |db_tx| {
            let mut query = tutors::Entity::find().filter(tutors::Column::IsActive.eq(true));
            if filter.available_only {
                query = query.filter(tutors::Column::IsAvailable.eq(true));
            }
            if let Some(min_rating) = filter.min_rating {
                query = query.filter(tutors::Column::RatingAverage.gte(min_rating));
            }
            if let Some(category) = filter.category {
                query = apply_category(query, category);
            }
            if let Some(search) = normalize_optional_text(filter.search.as_deref()) {
                query = apply_search(query, &search);
            }
            query = match filter.sort {
                TutorSort::Rating => query
                    .order_by_desc(tutors::Column::RatingAverage)
                    .order_by_desc(tutors::Column::TotalSessions),
                TutorSort::HourlyRate => query.order_by_asc(tutors::Column::HourlyRateMinor),
                TutorSort::Sessions => query.order_by_desc(tutors::Column::TotalSessions),
                TutorSort::Newest => query.order_by_desc(tutors::Column::CreatedAt),
            };

            let paginator = query
                .order_by_asc(tutors::Column::Id)
                .paginate(&db_tx, page.limit);
            let total = paginator.num_items().await?;
            let models = paginator.fetch_page(page.index()).await?;
            let items = self.assemble_tutors(&db_tx, models).await?;

            Ok(Paginated::new(items, page, total))
        })
    }

    /// Review a tutor and recompute its rating.
    ///
    /// The owning user's rating mirrors the tutor's.
    ///
    /// Repeated reviews by the same student are accepted; reviewing your own
    /// profile is not.
    pub async fn add_review(
        &self,
        user_id: Uuid,
        tutor_id: Uuid,
        rating: u8,
        comment: Option<String>,
        session_id: Option<Uuid>,
    ) -> ResultEngine<Tutor> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut tutor = self.require_tutor(&db_tx, tutor_id).await?;
            if tutor.user_id == user_id {
                return Err(EngineError::Forbidden(
                    "cannot review your own tutor profile".to_string(),
                ));
            }

            let comment = normalize_optional_text(comment.as_deref());
            let review = tutor.add_review(user_id, rating, comment, session_id)?.clone();
            tutor_reviews::ActiveModel::for_tutor(tutor.id, &review)
                .insert(&db_tx)
                .await?;
            tutors::ActiveModel::from(&tutor).update(&db_tx).await?;

            let owner = self.require_user(&db_tx, tutor.user_id).await?;
            let mut active: users::ActiveModel = owner.into();
            active.rating_average = ActiveValue::Set(tutor.rating.average);
            active.rating_count = ActiveValue::Set(tutor.rating.count);
            active.update(&db_tx).await?;

            Ok(tutor)
        })
    }

    /// Reviews of a tutor, oldest first.
    pub async fn tutor_reviews(&self, tutor_id: Uuid) -> ResultEngine<Vec<Review>> {
        Ok(self.tutor(tutor_id).await?.reviews)
    }

    pub(super) async fn require_tutor(
        &self,
        db_tx: &DatabaseTransaction,
        tutor_id: Uuid,
    ) -> ResultEngine<Tutor> {
        let model = tutors::Entity::find_by_id(tutor_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("tutor not exists".to_string()))?;
        let mut tutors = self.assemble_tutors(db_tx, vec![model]).await?;
        tutors
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("tutor not exists".to_string()))
    }

    /// Load expertise and reviews for `models`, preserving their order.
    pub(super) async fn assemble_tutors(
        &self,
        db_tx: &DatabaseTransaction,
        models: Vec<tutors::Model>,
    ) -> ResultEngine<Vec<Tutor>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();

        let mut expertise: HashMap<Uuid, Vec<tutor_expertise::Model>> = HashMap::new();
        for row in tutor_expertise::Entity::find()
            .filter(tutor_expertise::Column::TutorId.is_in(ids.clone()))
            .all(db_tx)
            .await?
        {
            expertise.entry(row.tutor_id).or_default().push(row);
        }
        let mut reviews: HashMap<Uuid, Vec<tutor_reviews::Model>> = HashMap::new();
        for row in tutor_reviews::Entity::find()
            .filter(tutor_reviews::Column::TutorId.is_in(ids))
            .all(db_tx)
            .await?
        {
            reviews.entry(row.tutor_id).or_default().push(row);
        }

        models
            .into_iter()
            .map(|model| {
                let e = expertise.remove(&model.id).unwrap_or_default();
                let r = reviews.remove(&model.id).unwrap_or_default();
                Tutor::from_parts(model, e, r)
            })
            .collect()
    }

    async fn insert_expertise(
        &self,
        db_tx: &DatabaseTransaction,
        tutor_id: Uuid,
        expertise: &[Expertise],
    ) -> ResultEngine<()> {
        for (position, entry) in expertise.iter().enumerate() {
            tutor_expertise::ActiveModel::for_tutor(tutor_id, position, entry)
                .insert(db_tx)
                .await?;
        }
        Ok(())
    }
}
