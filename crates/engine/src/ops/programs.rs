use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect,
    QueryTrait, TransactionTrait, prelude::*,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    BalancePair, Category, EngineError, NewProgramCmd, Program, ProgramRole, ResultEngine,
    Transaction, TransactionKind, WalletDirection, program_participants, programs,
};

use super::{Engine, with_tx};

/// Outcome of a join: the program and, on a first join, the organizer's
/// reward entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgramJoin {
    pub program: Program,
    pub transaction: Option<Transaction>,
}

impl Engine {
    pub async fn create_program(&self, cmd: NewProgramCmd) -> ResultEngine<Program> {
        let program = Program::new(
            &cmd.title,
            cmd.category,
            cmd.description.as_deref(),
            cmd.organizer_id,
            cmd.reward_hours,
        )?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.organizer_id).await?;
            programs::ActiveModel::from(&program).insert(&db_tx).await?;
            tracing::info!(
                program = %program.id,
                organizer = %program.organizer_id,
                "program created"
            );
            Ok(program)
        })
    }

    pub async fn program(&self, program_id: Uuid) -> ResultEngine<Program> {
        with_tx!(self, |db_tx| self.require_program(&db_tx, program_id).await)
    }

    /// Open programs, newest first.
    pub async fn list_programs(&self, category: Option<Category>) -> ResultEngine<Vec<Program>> {
        with_tx!(self, |db_tx| {
            let mut query = programs::Entity::find().filter(programs::Column::IsOpen.eq(true));
            if let Some(category) = category {
                query = query.filter(programs::Column::Category.eq(category.as_str()));
            }
            let models = query
                .order_by_desc(programs::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            self.assemble_programs(&db_tx, models).await
        })
    }

    /// Programs the caller organizes or takes part in, newest first.
    pub async fn list_joined_programs(
        &self,
        user_id: Uuid,
    ) -> ResultEngine<Vec<(Program, ProgramRole)>> {
        with_tx!(self, |db_tx| {
            let joined = program_participants::Entity::find()
                .select_only()
                .column(program_participants::Column::ProgramId)
                .filter(program_participants::Column::UserId.eq(user_id))
                .into_query();
            let models = programs::Entity::find()
                .filter(
                    Condition::any()
                        .add(programs::Column::OrganizerId.eq(user_id))
                        .add(programs::Column::Id.in_subquery(joined)),
                )
                .order_by_desc(programs::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let programs = self.assemble_programs(&db_tx, models).await?;
            Ok(programs
                .into_iter()
                .filter_map(|p| p.role_of(user_id).map(|role| (p, role)))
                .collect())
        })
    }

    /// Join a program.
    ///
    /// The first join credits the reward to the organizer and records an
    /// `earned` self-entry. Joining again changes nothing.
    pub async fn join_program(
        &self,
        user_id: Uuid,
        program_id: Uuid,
    ) -> ResultEngine<ProgramJoin> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let mut program = self.require_program(&db_tx, program_id).await?;
            if program.organizer_id == user_id {
                return Err(EngineError::InvalidState(
                    "organizer cannot join their own program".to_string(),
                ));
            }
            if !program.admit(user_id)? {
                return Ok(ProgramJoin {
                    program,
                    transaction: None,
                });
            }

            program_participants::ActiveModel {
                program_id: ActiveValue::Set(program.id),
                user_id: ActiveValue::Set(user_id),
                joined_at: ActiveValue::Set(Utc::now()),
            }
            .insert(&db_tx)
            .await?;

            let mut tx = Transaction::new(
                TransactionKind::Earned,
                program.organizer_id,
                program.organizer_id,
                program.reward_hours,
                program.title.clone(),
                Some("Program join reward".to_string()),
                BalancePair::default(),
                BalancePair::default(),
            )?;
            tx.metadata.category = Some(program.category);

            let (before, after) = self
                .post_to_wallet(
                    &db_tx,
                    program.organizer_id,
                    program.reward_hours,
                    WalletDirection::Earn,
                )
                .await?;
            tx.balance_before = BalancePair::same(before);
            tx.balance_after = BalancePair::same(after);
            self.record_transaction(&db_tx, &tx).await?;

            tracing::info!(
                program = %program.id,
                participant = %user_id,
                reward = %program.reward_hours,
                "program joined"
            );
            Ok(ProgramJoin {
                program,
                transaction: Some(tx),
            })
        })
    }

    async fn require_program(
        &self,
        db_tx: &DatabaseTransaction,
        program_id: Uuid,
    ) -> ResultEngine<Program> {
        let model = programs::Entity::find_by_id(program_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("program not exists".to_string()))?;
        let mut programs = self.assemble_programs(db_tx, vec![model]).await?;
        programs
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound("program not exists".to_string()))
    }

    async fn assemble_programs(
        &self,
        db_tx: &DatabaseTransaction,
        models: Vec<programs::Model>,
    ) -> ResultEngine<Vec<Program>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut participants: HashMap<Uuid, Vec<program_participants::Model>> = HashMap::new();
        for row in program_participants::Entity::find()
            .filter(program_participants::Column::ProgramId.is_in(ids))
            .all(db_tx)
            .await?
        {
            participants.entry(row.program_id).or_default().push(row);
        }

        models
            .into_iter()
            .map(|model| {
                let rows = participants.remove(&model.id).unwrap_or_default();
                Program::from_parts(model, rows)
            })
            .collect()
    }
}
