use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    AdjustDirection, BalancePair, EngineError, Hours, ResultEngine, TimeWallet, Transaction,
    TransactionKind, WalletDirection, transactions, users,
};

use super::{Engine, with_tx};

pub(super) fn wallet_of(model: &users::Model) -> TimeWallet {
    TimeWallet {
        balance: Hours::new(model.balance_minor),
        total_earned: Hours::new(model.total_earned_minor),
        total_spent: Hours::new(model.total_spent_minor),
    }
}

pub(super) fn insufficient(balance: Hours, amount: Hours) -> EngineError {
    EngineError::InsufficientBalance(format!("balance {balance} cannot cover {amount}"))
}

impl Engine {
    /// Return the time wallet of `user_id`.
    pub async fn wallet(&self, user_id: Uuid) -> ResultEngine<TimeWallet> {
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            Ok(wallet_of(&model))
        })
    }

    /// Add to or subtract from the caller's own balance.
    ///
    /// Recorded as an `adjustment` self-entry. Totals are left untouched.
    pub async fn adjust_wallet(
        &self,
        user_id: Uuid,
        amount: Hours,
        direction: AdjustDirection,
    ) -> ResultEngine<(TimeWallet, Transaction)> {
        if !amount.is_positive() {
            return Err(EngineError::InvalidAmount(
                "amount must be > 0".to_string(),
            ));
        }
        with_tx!(self, |db_tx| {
            let model = self.require_user(&db_tx, user_id).await?;
            let before = Hours::new(model.balance_minor);
            let (after, label) = match direction {
                AdjustDirection::Add => (before.try_add(amount)?, "add"),
                AdjustDirection::Subtract => {
                    if before < amount {
                        return Err(insufficient(before, amount));
                    }
                    (before.try_sub(amount)?, "subtract")
                }
            };

            let mut active: users::ActiveModel = model.into();
            active.balance_minor = ActiveValue::Set(after.minor());
            let model = active.update(&db_tx).await?;

            let tx = Transaction::new(
                TransactionKind::Adjustment,
                user_id,
                user_id,
                amount,
                "Wallet adjustment".to_string(),
                Some(format!("Manual adjustment ({label})")),
                BalancePair::same(before),
                BalancePair::same(after),
            )?;
            self.record_transaction(&db_tx, &tx).await?;
            tracing::info!(user = %user_id, %amount, direction = label, "wallet adjusted");

            Ok((wallet_of(&model), tx))
        })
    }

    /// Apply a movement to a wallet inside `db_tx`.
    ///
    /// Returns the balance before and after the movement. A `Spend` larger
    /// than the balance fails with `InsufficientBalance`.
    pub(super) async fn post_to_wallet(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        amount: Hours,
        direction: WalletDirection,
    ) -> ResultEngine<(Hours, Hours)> {
        let model = self.require_user(db_tx, user_id).await?;
        let mut wallet = wallet_of(&model);
        let before = wallet.balance;
        if direction == WalletDirection::Spend && !wallet.covers(amount) {
            return Err(insufficient(before, amount));
        }
        wallet.apply(amount, direction)?;

        let mut active: users::ActiveModel = model.into();
        active.balance_minor = ActiveValue::Set(wallet.balance.minor());
        active.total_earned_minor = ActiveValue::Set(wallet.total_earned.minor());
        active.total_spent_minor = ActiveValue::Set(wallet.total_spent.minor());
        active.update(db_tx).await?;

        Ok((before, wallet.balance))
    }

    pub(super) async fn record_transaction(
        &self,
        db_tx: &DatabaseTransaction,
        tx: &Transaction,
    ) -> ResultEngine<()> {
        transactions::ActiveModel::from(tx).insert(db_tx).await?;
        Ok(())
    }
}
