use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*, sea_query::OnConflict,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    EngineError, Page, Paginated, ProfileUpdateCmd, Rating, ResultEngine, TimeWallet, User,
    users::{self, encode_interests},
};

use super::{Engine, normalize_optional_text, with_tx};

pub const MAX_DISPLAY_NAME_LEN: usize = 100;
pub const MAX_USER_BIO_LEN: usize = 500;

/// Filters for listing users. Only active users are ever listed.
#[derive(Clone, Debug, Default)]
pub struct UserListFilter {
    /// Case-insensitive match on display name or email.
    pub search: Option<String>,
    pub is_tutor: Option<bool>,
}

/// Public summary of a user.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UserStats {
    pub wallet: TimeWallet,
    pub rating: Rating,
    pub interests_count: usize,
    pub is_tutor: bool,
    pub member_since: DateTime<Utc>,
}

impl Engine {
    /// Find the user bound to `subject`, creating it on first sight.
    ///
    /// New users get the configured initial grant as opening balance.
    /// Deactivated accounts are rejected.
    pub async fn resolve_user(&self, subject: &str, email: &str) -> ResultEngine<User> {
        let subject = subject.trim();
        with_tx!(self, |db_tx| {
            let model = self.find_or_create_user(&db_tx, subject, email).await?;
            if !model.is_active {
                return Err(EngineError::Forbidden("account is deactivated".to_string()));
            }
            User::try_from(model)
        })
    }

    /// Resolve the user and bump `last_login`.
    ///
    /// Display name and photo are only used when the user is created.
    pub async fn sign_in(
        &self,
        subject: &str,
        email: &str,
        display_name: Option<&str>,
        photo_url: Option<&str>,
    ) -> ResultEngine<User> {
        let display_name = normalize_optional_text(display_name);
        let photo_url = normalize_optional_text(photo_url);
        let subject = subject.trim();
        with_tx!(self, |db_tx| {
            let existing = users::Entity::find()
                .filter(users::Column::Subject.eq(subject))
                .one(&db_tx)
                .await?;

            let model = match existing {
                Some(model) => {
                    if !model.is_active {
                        return Err(EngineError::Forbidden(
                            "account is deactivated".to_string(),
                        ));
                    }
                    let mut active: users::ActiveModel = model.into();
                    active.last_login = ActiveValue::Set(Utc::now());
                    active.update(&db_tx).await?
                }
                None => {
                    let mut user = self.new_user(&db_tx, subject, email).await?;
                    if let Some(name) = display_name {
                        user.display_name = name;
                    }
                    user.photo_url = photo_url;
                    self.insert_user(&db_tx, &user).await?
                }
            };
            User::try_from(model)
        })
    }

    /// Return a user by id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            User::try_from(model)
        })
    }

    /// List active users ordered by display name.
    pub async fn list_users(
        &self,
        filter: &UserListFilter,
        page: Page,
    ) -> ResultEngine<Paginated<User>> {
        with_tx!(self, |db_tx| {
            let mut query = users::Entity::find().filter(users::Column::IsActive.eq(true));
            if let Some(search) = normalize_optional_text(filter.search.as_deref()) {
                query = query.filter(
                    Condition::any()
                        .add(users::Column::DisplayName.contains(&search))
                        .add(users::Column::Email.contains(&search)),
                );
            }
            if let Some(is_tutor) = filter.is_tutor {
                query = query.filter(users::Column::IsTutor.eq(is_tutor));
            }

            let paginator = query
                .order_by_asc(users::Column::DisplayName)
                .order_by_asc(users::Column::Id)
                .paginate(&db_tx, page.limit);
            let total = paginator.num_items().await?;
            let items = paginator
                .fetch_page(page.index())
                .await?
                .into_iter()
                .map(User::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            Ok(Paginated::new(items, page, total))
        })
    }

    /// Update the profile of `target_id`. Users may only edit themselves.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        target_id: Uuid,
        cmd: ProfileUpdateCmd,
    ) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, target_id).await?;
            if model.id != user_id {
                return Err(EngineError::Forbidden(
                    "not allowed to update this profile".to_string(),
                ));
            }

            let mut active: users::ActiveModel = model.into();
            if let Some(name) = normalize_optional_text(cmd.display_name.as_deref()) {
                if name.chars().count() > MAX_DISPLAY_NAME_LEN {
                    return Err(EngineError::InvalidInput(format!(
                        "display name must be at most {MAX_DISPLAY_NAME_LEN} characters"
                    )));
                }
                active.display_name = ActiveValue::Set(name);
            }
            if let Some(bio) = cmd.bio {
                if bio.chars().count() > MAX_USER_BIO_LEN {
                    return Err(EngineError::InvalidInput(format!(
                        "bio must be at most {MAX_USER_BIO_LEN} characters"
                    )));
                }
                active.bio = ActiveValue::Set(bio);
            }
            if let Some(photo_url) = cmd.photo_url {
                active.photo_url =
                    ActiveValue::Set(normalize_optional_text(Some(photo_url.as_str())));
            }
            if let Some(interests) = cmd.interests {
                let interests: Vec<String> = interests
                    .iter()
                    .filter_map(|i| normalize_optional_text(Some(i.as_str())))
                    .collect();
                active.interests = ActiveValue::Set(encode_interests(&interests));
            }

            let model = active.update(&db_tx).await?;
            User::try_from(model)
        })
    }

    /// Soft-delete the caller's own account.
    pub async fn deactivate_user(&self, user_id: Uuid, target_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, target_id).await?;
            if model.id != user_id {
                return Err(EngineError::Forbidden(
                    "not allowed to deactivate this account".to_string(),
                ));
            }
            let mut active: users::ActiveModel = model.into();
            active.is_active = ActiveValue::Set(false);
            active.update(&db_tx).await?;
            tracing::info!(user = %target_id, "user deactivated");
            Ok(())
        })
    }

    pub async fn user_stats(&self, target_id: Uuid) -> ResultEngine<UserStats> {
        let user = self.user(target_id).await?;
        Ok(UserStats {
            wallet: user.wallet,
            rating: user.rating,
            interests_count: user.interests.len(),
            is_tutor: user.is_tutor,
            member_since: user.created_at,
        })
    }

    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    async fn find_or_create_user(
        &self,
        db_tx: &DatabaseTransaction,
        subject: &str,
        email: &str,
    ) -> ResultEngine<users::Model> {
        if let Some(model) = users::Entity::find()
            .filter(users::Column::Subject.eq(subject))
            .one(db_tx)
            .await?
        {
            tracing::debug!(user = %model.id, "user resolved");
            return Ok(model);
        }

        let user = self.new_user(db_tx, subject, email).await?;
        self.insert_user(db_tx, &user).await
    }

    /// Insert `user` unless its subject is already taken, then return the
    /// stored row.
    ///
    /// A concurrent first request for the same subject may win the insert;
    /// both callers read back the row that landed.
    async fn insert_user(
        &self,
        db_tx: &DatabaseTransaction,
        user: &User,
    ) -> ResultEngine<users::Model> {
        let inserted = users::Entity::insert(users::ActiveModel::from(user))
            .on_conflict(
                OnConflict::column(users::Column::Subject)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db_tx)
            .await?;
        let model = users::Entity::find()
            .filter(users::Column::Subject.eq(user.subject.as_str()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
        if inserted > 0 {
            tracing::info!(user = %model.id, "user created");
        }
        Ok(model)
    }

    /// Build a not-yet-persisted user, checking subject and email are usable.
    async fn new_user(
        &self,
        db_tx: &DatabaseTransaction,
        subject: &str,
        email: &str,
    ) -> ResultEngine<User> {
        if subject.is_empty() {
            return Err(EngineError::InvalidInput("subject is required".to_string()));
        }
        let user = User::new(subject.to_string(), email.to_string(), self.initial_grant);
        if user.email.is_empty() {
            return Err(EngineError::InvalidInput("email is required".to_string()));
        }
        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(user.email.as_str()))
            .one(db_tx)
            .await?
            .is_some();
        if taken {
            return Err(EngineError::ExistingKey(user.email));
        }
        Ok(user)
    }
}
