//! Ledger primitives.
//!
//! A `Transaction` records one balance-affecting event together with the
//! balances of both parties before and after it. Transactions are never
//! updated after insert; corrections are new transactions.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Category, EngineError, Hours, ResultEngine, Session};

pub const MAX_DESCRIPTION_LEN: usize = 500;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Earned,
    Spent,
    Adjustment,
    Refund,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earned => "earned",
            Self::Spent => "spent",
            Self::Adjustment => "adjustment",
            Self::Refund => "refund",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "earned" => Ok(Self::Earned),
            "spent" => Ok(Self::Spent),
            "adjustment" => Ok(Self::Adjustment),
            "refund" => Ok(Self::Refund),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Failed,
    Refunded,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// Balances of both parties at one point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalancePair {
    pub from: Hours,
    pub to: Hours,
}

impl BalancePair {
    /// Same balance on both sides, for self-referential entries.
    pub fn same(balance: Hours) -> Self {
        Self {
            from: balance,
            to: balance,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub category: Option<Category>,
    pub session_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: Hours,
    pub session_id: Option<Uuid>,
    pub skill: String,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub balance_before: BalancePair,
    pub balance_after: BalancePair,
    pub metadata: TransactionMetadata,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: TransactionKind,
        from_user_id: Uuid,
        to_user_id: Uuid,
        amount: Hours,
        skill: String,
        description: Option<String>,
        balance_before: BalancePair,
        balance_after: BalancePair,
    ) -> ResultEngine<Self> {
        if amount.is_negative() {
            return Err(EngineError::InvalidAmount(
                "amount must be >= 0".to_string(),
            ));
        }
        if skill.trim().is_empty() {
            return Err(EngineError::InvalidInput("skill is required".to_string()));
        }
        if description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            return Err(EngineError::InvalidInput(format!(
                "description must be at most {MAX_DESCRIPTION_LEN} characters"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            from_user_id,
            to_user_id,
            amount,
            session_id: None,
            skill,
            description,
            status: TransactionStatus::Completed,
            balance_before,
            balance_after,
            metadata: TransactionMetadata::default(),
            created_at: Utc::now(),
        })
    }

    /// Build the ledger entry for a completed session: the student pays the
    /// tutor `duration` hours.
    ///
    /// `before` holds the live balances of student (`from`) and tutor (`to`)
    /// read prior to the wallet mutation; the after snapshot is derived.
    pub fn from_session(session: &Session, before: BalancePair) -> ResultEngine<Self> {
        let after = BalancePair {
            from: before.from.try_sub(session.duration)?,
            to: before.to.try_add(session.duration)?,
        };
        let mut tx = Self::new(
            TransactionKind::Spent,
            session.student_id,
            session.tutor_id,
            session.duration,
            session.skill.clone(),
            Some(format!("Session: {}", session.skill)),
            before,
            after,
        )?;
        tx.session_id = Some(session.id);
        tx.metadata = TransactionMetadata {
            category: Some(session.category),
            session_date: Some(session.scheduled_date),
            notes: None,
        };
        Ok(tx)
    }

    /// Returns `true` if `user_id` is on either side of the entry.
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }

    /// The kind as seen by `user_id`.
    ///
    /// A session payment is stored once as `spent`; the receiving side sees
    /// it as `earned`.
    pub fn kind_for(&self, user_id: Uuid) -> TransactionKind {
        match self.kind {
            TransactionKind::Spent
                if self.to_user_id == user_id && self.from_user_id != user_id =>
            {
                TransactionKind::Earned
            }
            kind => kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount_minor: i64,
    pub session_id: Option<Uuid>,
    pub skill: String,
    pub description: Option<String>,
    pub status: String,
    pub before_from_minor: i64,
    pub before_to_minor: i64,
    pub after_from_minor: i64,
    pub after_to_minor: i64,
    pub category: Option<String>,
    pub session_date: Option<Date>,
    pub notes: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            from_user_id: ActiveValue::Set(tx.from_user_id),
            to_user_id: ActiveValue::Set(tx.to_user_id),
            amount_minor: ActiveValue::Set(tx.amount.minor()),
            session_id: ActiveValue::Set(tx.session_id),
            skill: ActiveValue::Set(tx.skill.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            before_from_minor: ActiveValue::Set(tx.balance_before.from.minor()),
            before_to_minor: ActiveValue::Set(tx.balance_before.to.minor()),
            after_from_minor: ActiveValue::Set(tx.balance_after.from.minor()),
            after_to_minor: ActiveValue::Set(tx.balance_after.to.minor()),
            category: ActiveValue::Set(tx.metadata.category.map(|c| c.as_str().to_string())),
            session_date: ActiveValue::Set(tx.metadata.session_date),
            notes: ActiveValue::Set(tx.metadata.notes.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            from_user_id: model.from_user_id,
            to_user_id: model.to_user_id,
            amount: Hours::new(model.amount_minor),
            session_id: model.session_id,
            skill: model.skill,
            description: model.description,
            status: TransactionStatus::try_from(model.status.as_str())?,
            balance_before: BalancePair {
                from: Hours::new(model.before_from_minor),
                to: Hours::new(model.before_to_minor),
            },
            balance_after: BalancePair {
                from: Hours::new(model.after_from_minor),
                to: Hours::new(model.after_to_minor),
            },
            metadata: TransactionMetadata {
                category: model
                    .category
                    .as_deref()
                    .map(Category::try_from)
                    .transpose()?,
                session_date: model.session_date,
                notes: model.notes,
            },
            created_at: model.created_at,
        })
    }
}
