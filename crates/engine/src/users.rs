//! The module contains the `User` directory entry and its time wallet.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Hours, ResultEngine};

/// Direction of a wallet movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalletDirection {
    Earn,
    Spend,
}

/// A user's balance of tradable hours.
///
/// `balance` is mutated directly; `total_earned` and `total_spent` are
/// tracked in parallel and only ever grow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWallet {
    pub balance: Hours,
    pub total_earned: Hours,
    pub total_spent: Hours,
}

impl TimeWallet {
    pub fn new(balance: Hours) -> Self {
        Self {
            balance,
            total_earned: Hours::ZERO,
            total_spent: Hours::ZERO,
        }
    }

    /// Apply a movement of `amount` hours.
    ///
    /// Callers check the balance before a `Spend`. A movement that would
    /// overflow fails with `InvalidAmount` and leaves the wallet unchanged.
    pub fn apply(&mut self, amount: Hours, direction: WalletDirection) -> ResultEngine<()> {
        let next = match direction {
            WalletDirection::Earn => Self {
                balance: self.balance.try_add(amount)?,
                total_earned: self.total_earned.try_add(amount)?,
                ..*self
            },
            WalletDirection::Spend => Self {
                balance: self.balance.try_sub(amount)?,
                total_spent: self.total_spent.try_add(amount)?,
                ..*self
            },
        };
        *self = next;
        Ok(())
    }

    /// Returns `true` if the wallet can cover a spend of `amount`.
    pub fn covers(&self, amount: Hours) -> bool {
        self.balance >= amount
    }
}

/// Aggregate rating: arithmetic mean and number of ratings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    /// Subject identifier issued by the identity provider.
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub bio: String,
    pub photo_url: Option<String>,
    pub interests: Vec<String>,
    pub wallet: TimeWallet,
    pub is_tutor: bool,
    pub tutor_id: Option<Uuid>,
    pub rating: Rating,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

impl User {
    /// Build a fresh directory entry for an identity seen for the first time.
    ///
    /// The display name defaults to the local part of the email.
    pub fn new(subject: String, email: String, initial_balance: Hours) -> Self {
        let email = email.trim().to_lowercase();
        let display_name = email
            .split('@')
            .next()
            .filter(|s| !s.is_empty())
            .unwrap_or("User")
            .to_string();
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            subject,
            email,
            display_name,
            bio: String::new(),
            photo_url: None,
            interests: Vec::new(),
            wallet: TimeWallet::new(initial_balance),
            is_tutor: false,
            tutor_id: None,
            rating: Rating::default(),
            is_active: true,
            created_at: now,
            last_login: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub subject: String,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub bio: String,
    pub photo_url: Option<String>,
    /// JSON array of strings.
    pub interests: String,
    pub balance_minor: i64,
    pub total_earned_minor: i64,
    pub total_spent_minor: i64,
    pub is_tutor: bool,
    pub tutor_id: Option<Uuid>,
    pub rating_average: f64,
    pub rating_count: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub last_login: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&User> for ActiveModel {
    fn from(user: &User) -> Self {
        Self {
            id: ActiveValue::Set(user.id),
            subject: ActiveValue::Set(user.subject.clone()),
            email: ActiveValue::Set(user.email.clone()),
            display_name: ActiveValue::Set(user.display_name.clone()),
            bio: ActiveValue::Set(user.bio.clone()),
            photo_url: ActiveValue::Set(user.photo_url.clone()),
            interests: ActiveValue::Set(encode_interests(&user.interests)),
            balance_minor: ActiveValue::Set(user.wallet.balance.minor()),
            total_earned_minor: ActiveValue::Set(user.wallet.total_earned.minor()),
            total_spent_minor: ActiveValue::Set(user.wallet.total_spent.minor()),
            is_tutor: ActiveValue::Set(user.is_tutor),
            tutor_id: ActiveValue::Set(user.tutor_id),
            rating_average: ActiveValue::Set(user.rating.average),
            rating_count: ActiveValue::Set(user.rating.count),
            is_active: ActiveValue::Set(user.is_active),
            created_at: ActiveValue::Set(user.created_at),
            last_login: ActiveValue::Set(user.last_login),
        }
    }
}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            subject: model.subject,
            email: model.email,
            display_name: model.display_name,
            bio: model.bio,
            photo_url: model.photo_url,
            interests: decode_interests(&model.interests)?,
            wallet: TimeWallet {
                balance: Hours::new(model.balance_minor),
                total_earned: Hours::new(model.total_earned_minor),
                total_spent: Hours::new(model.total_spent_minor),
            },
            is_tutor: model.is_tutor,
            tutor_id: model.tutor_id,
            rating: Rating {
                average: model.rating_average,
                count: model.rating_count,
            },
            is_active: model.is_active,
            created_at: model.created_at,
            last_login: model.last_login,
        })
    }
}

pub(crate) fn encode_interests(interests: &[String]) -> String {
    serde_json::to_string(interests).unwrap_or_else(|_| "[]".to_string())
}

fn decode_interests(raw: &str) -> ResultEngine<Vec<String>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
        .map_err(|err| EngineError::InvalidInput(format!("invalid interests column: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn earn_and_spend_move_balance_and_totals() {
        let mut wallet = TimeWallet::new(Hours::whole(10));

        wallet.apply(Hours::whole(2), WalletDirection::Spend).unwrap();
        assert_eq!(wallet.balance, Hours::whole(8));
        assert_eq!(wallet.total_spent, Hours::whole(2));
        assert_eq!(wallet.total_earned, Hours::ZERO);

        wallet.apply(Hours::new(150), WalletDirection::Earn).unwrap();
        assert_eq!(wallet.balance, Hours::new(950));
        assert_eq!(wallet.total_earned, Hours::new(150));
        assert_eq!(wallet.total_spent, Hours::whole(2));
    }

    #[test]
    fn overflowing_earn_leaves_wallet_unchanged() {
        let mut wallet = TimeWallet::new(Hours::new(i64::MAX - 100));
        let before = wallet;

        let err = wallet
            .apply(Hours::whole(2), WalletDirection::Earn)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
        assert_eq!(wallet, before);
    }

    #[test]
    fn covers_is_inclusive() {
        let wallet = TimeWallet::new(Hours::whole(2));
        assert!(wallet.covers(Hours::whole(2)));
        assert!(!wallet.covers(Hours::new(201)));
    }

    #[test]
    fn new_user_defaults_display_name_to_email_local_part() {
        let user = User::new(
            "sub-1".to_string(),
            "  Ada@Example.org ".to_string(),
            Hours::whole(10),
        );
        assert_eq!(user.email, "ada@example.org");
        assert_eq!(user.display_name, "ada");
        assert_eq!(user.wallet.balance, Hours::whole(10));
        assert!(user.is_active);

        let anonymous = User::new("sub-2".to_string(), String::new(), Hours::ZERO);
        assert_eq!(anonymous.display_name, "User");
    }

    #[test]
    fn model_round_trips_interests() {
        let mut user = User::new("s".to_string(), "s@x.io".to_string(), Hours::ZERO);
        user.interests = vec!["rust".to_string(), "piano".to_string()];
        let active = ActiveModel::from(&user);
        let ActiveValue::Set(raw) = active.interests else {
            panic!("interests not set");
        };
        assert_eq!(decode_interests(&raw).unwrap(), user.interests);
    }
}
