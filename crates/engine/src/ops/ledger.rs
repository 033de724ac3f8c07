use sea_orm::{
    Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    BalancePair, Category, EngineError, Hours, ManualTxCmd, Page, Paginated, ResultEngine,
    Transaction, TransactionKind, TransactionStatus, WalletDirection, transactions,
};

use super::{Engine, normalize_optional_text, wallet::wallet_of, with_tx};

/// Filters for listing the caller's ledger entries.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransactionListFilter {
    /// Kind as seen by the caller (see [`Transaction::kind_for`]).
    pub kind: Option<TransactionKind>,
    pub status: Option<TransactionStatus>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TotalCount {
    pub total: Hours,
    pub count: u64,
}

/// Completed earnings and spendings of one user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub earned: TotalCount,
    pub spent: TotalCount,
    pub balance: Hours,
    pub net_flow: Hours,
}

/// Entries where `user_id` is on either side.
fn involving(user_id: Uuid) -> Condition {
    Condition::any()
        .add(transactions::Column::FromUserId.eq(user_id))
        .add(transactions::Column::ToUserId.eq(user_id))
}

/// Entries of `kind` from the point of view of `user_id`.
///
/// A session payment is stored once as `spent`: it counts as spent for the
/// payer and as earned for the receiver.
fn seen_as(user_id: Uuid, kind: TransactionKind) -> Condition {
    let stored = |k: TransactionKind| transactions::Column::Kind.eq(k.as_str());
    match kind {
        TransactionKind::Earned => Condition::any()
            .add(
                Condition::all()
                    .add(stored(TransactionKind::Earned))
                    .add(transactions::Column::ToUserId.eq(user_id)),
            )
            .add(
                Condition::all()
                    .add(stored(TransactionKind::Spent))
                    .add(transactions::Column::ToUserId.eq(user_id))
                    .add(transactions::Column::FromUserId.ne(user_id)),
            ),
        TransactionKind::Spent => Condition::all()
            .add(stored(TransactionKind::Spent))
            .add(transactions::Column::FromUserId.eq(user_id)),
        other => Condition::all().add(stored(other)).add(involving(user_id)),
    }
}

impl Engine {
    /// Record a manual earning or spending on the caller's own wallet.
    pub async fn manual_transaction(&self, cmd: ManualTxCmd) -> ResultEngine<Transaction> {
        let (direction, default_description) = match cmd.kind {
            TransactionKind::Earned => (WalletDirection::Earn, "Manual earning"),
            TransactionKind::Spent => (WalletDirection::Spend, "Manual spending"),
            other => {
                return Err(EngineError::InvalidInput(format!(
                    "manual transactions must be earned or spent, got {}",
                    other.as_str()
                )));
            }
        };
        if !cmd.amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        let description = normalize_optional_text(cmd.description.as_deref())
            .unwrap_or_else(|| default_description.to_string());
        let mut tx = Transaction::new(
            cmd.kind,
            cmd.user_id,
            cmd.user_id,
            cmd.amount,
            cmd.skill.trim().to_string(),
            Some(description),
            BalancePair::default(),
            BalancePair::default(),
        )?;
        tx.metadata.category = Some(Category::Other);

        with_tx!(self, |db_tx| {
            let (before, after) = self
                .post_to_wallet(&db_tx, cmd.user_id, cmd.amount, direction)
                .await?;
            tx.balance_before = BalancePair::same(before);
            tx.balance_after = BalancePair::same(after);
            self.record_transaction(&db_tx, &tx).await?;
            tracing::info!(
                user = %cmd.user_id,
                kind = tx.kind.as_str(),
                amount = %tx.amount,
                "manual transaction recorded"
            );
            Ok(tx)
        })
    }

    /// Return a ledger entry the caller is a party to.
    pub async fn transaction(&self, user_id: Uuid, tx_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(tx_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            let tx = Transaction::try_from(model)?;
            if !tx.involves(user_id) {
                return Err(EngineError::Forbidden(
                    "not allowed to view this transaction".to_string(),
                ));
            }
            Ok(tx)
        })
    }

    /// The caller's ledger, newest first.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionListFilter,
        page: Page,
    ) -> ResultEngine<Paginated<Transaction>> {
        with_tx!(self, |db_tx| {
            let condition = match filter.kind {
                Some(kind) => seen_as(user_id, kind),
                None => involving(user_id),
            };
            let mut query = transactions::Entity::find().filter(condition);
            if let Some(status) = filter.status {
                query = query.filter(transactions::Column::Status.eq(status.as_str()));
            }

            let paginator = query
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_asc(transactions::Column::Id)
                .paginate(&db_tx, page.limit);
            let total = paginator.num_items().await?;
            let items = paginator
                .fetch_page(page.index())
                .await?
                .into_iter()
                .map(Transaction::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            Ok(Paginated::new(items, page, total))
        })
    }

    /// Sum completed earnings and spendings of `user_id`.
    pub async fn transaction_stats(&self, user_id: Uuid) -> ResultEngine<LedgerStats> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let earned = self
                .total_count(&db_tx, seen_as(user_id, TransactionKind::Earned))
                .await?;
            let spent = self
                .total_count(&db_tx, seen_as(user_id, TransactionKind::Spent))
                .await?;

            Ok(LedgerStats {
                earned,
                spent,
                balance: wallet_of(&user).balance,
                net_flow: earned.total - spent.total,
            })
        })
    }

    async fn total_count(
        &self,
        db_tx: &DatabaseTransaction,
        condition: Condition,
    ) -> ResultEngine<TotalCount> {
        let row: Option<(Option<i64>, i64)> = transactions::Entity::find()
            .select_only()
            .column_as(Expr::col(transactions::Column::AmountMinor).sum(), "total")
            .column_as(Expr::col(transactions::Column::Id).count(), "count")
            .filter(condition)
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed.as_str()))
            .into_tuple()
            .one(db_tx)
            .await?;
        let (total, count) = row.unwrap_or((None, 0));

        Ok(TotalCount {
            total: Hours::new(total.unwrap_or(0)),
            count: u64::try_from(count).unwrap_or(0),
        })
    }
}
