use chrono::Utc;
use sea_orm::{
    Condition, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BalancePair, BookSessionCmd, Category, EngineError, Hours, Page, Paginated, ResultEngine,
    Session, SessionRequestCmd, SessionRole, SessionStatus, SessionUpdateCmd, Transaction,
    WalletDirection, sessions, tutors,
};

use super::{Engine, normalize_optional_text, wallet::insufficient, with_tx};

/// Filters for listing the caller's sessions.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionListFilter {
    pub status: Option<SessionStatus>,
    /// Only pending or confirmed sessions scheduled today or later, soonest
    /// first.
    pub upcoming: bool,
}

impl Engine {
    /// Book a session with a tutor.
    ///
    /// The student must be able to cover the duration at booking time. No
    /// hours move until the session is completed.
    pub async fn book_session(&self, cmd: BookSessionCmd) -> ResultEngine<Session> {
        with_tx!(self, |db_tx| {
            let student = self.require_user(&db_tx, cmd.student_id).await?;
            self.require_tutor_user(&db_tx, cmd.tutor_id).await?;

            let session = Session::new(
                cmd.tutor_id,
                cmd.student_id,
                cmd.skill,
                cmd.category,
                cmd.duration,
                cmd.scheduled_date,
                cmd.scheduled_time,
                normalize_optional_text(cmd.description.as_deref()),
            )?;
            let balance = Hours::new(student.balance_minor);
            if balance < session.duration {
                return Err(insufficient(balance, session.duration));
            }

            sessions::ActiveModel::from(&session).insert(&db_tx).await?;
            tracing::info!(
                session = %session.id,
                tutor = %session.tutor_id,
                student = %session.student_id,
                "session booked"
            );
            Ok(session)
        })
    }

    /// Quick one-hour request scheduled for now.
    pub async fn request_session(&self, cmd: SessionRequestCmd) -> ResultEngine<Session> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, cmd.student_id).await?;
            self.require_tutor_user(&db_tx, cmd.tutor_id).await?;

            let description = normalize_optional_text(cmd.message.as_deref())
                .unwrap_or_else(|| "Session request".to_string());
            let session = Session::new(
                cmd.tutor_id,
                cmd.student_id,
                cmd.skill,
                Category::Other,
                Hours::whole(1),
                Utc::now().date_naive(),
                "00:00".to_string(),
                Some(description),
            )?;

            sessions::ActiveModel::from(&session).insert(&db_tx).await?;
            tracing::info!(session = %session.id, "session requested");
            Ok(session)
        })
    }

    /// Return a session the caller is a party to.
    pub async fn session(&self, user_id: Uuid, session_id: Uuid) -> ResultEngine<Session> {
        with_tx!(self, |db_tx| {
            let session = self.require_session(&db_tx, session_id).await?;
            session.require_party(user_id, "view")?;
            Ok(session)
        })
    }

    /// Sessions where the caller is tutor or student.
    ///
    /// Newest scheduled first, or soonest first with `upcoming`.
    pub async fn list_sessions(
        &self,
        user_id: Uuid,
        filter: SessionListFilter,
        page: Page,
    ) -> ResultEngine<Paginated<Session>> {
        with_tx!(self, |db_tx| {
            let mut query = sessions::Entity::find().filter(
                Condition::any()
                    .add(sessions::Column::TutorId.eq(user_id))
                    .add(sessions::Column::StudentId.eq(user_id)),
            );
            if let Some(status) = filter.status {
                query = query.filter(sessions::Column::Status.eq(status.as_str()));
            }
            if filter.upcoming {
                query = query
                    .filter(sessions::Column::ScheduledDate.gte(Utc::now().date_naive()))
                    .filter(sessions::Column::Status.is_in([
                        SessionStatus::Pending.as_str(),
                        SessionStatus::Confirmed.as_str(),
                    ]))
                    .order_by_asc(sessions::Column::ScheduledDate)
                    .order_by_asc(sessions::Column::ScheduledTime);
            } else {
                query = query
                    .order_by_desc(sessions::Column::ScheduledDate)
                    .order_by_desc(sessions::Column::ScheduledTime);
            }

            let paginator = query
                .order_by_asc(sessions::Column::Id)
                .paginate(&db_tx, page.limit);
            let total = paginator.num_items().await?;
            let items = paginator
                .fetch_page(page.index())
                .await?
                .into_iter()
                .map(Session::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            Ok(Paginated::new(items, page, total))
        })
    }

    /// Change status, meeting link or notes of a session.
    ///
    /// Status may only move forward among pending, confirmed and in_progress.
    pub async fn update_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        cmd: SessionUpdateCmd,
    ) -> ResultEngine<Session> {
        with_tx!(self, |db_tx| {
            let mut session = self.require_session(&db_tx, session_id).await?;
            session.require_party(user_id, "update")?;

            if let Some(status) = cmd.status {
                session.advance_to(status)?;
            }
            if let Some(link) = cmd.meeting_link {
                session.meeting_link = normalize_optional_text(Some(link.as_str()));
            }
            if let Some(notes) = cmd.notes {
                session.merge_notes(notes)?;
            }

            sessions::ActiveModel::from(&session).update(&db_tx).await?;
            Ok(session)
        })
    }

    /// Complete a session and settle it on the ledger.
    ///
    /// Only the tutor may complete. The student pays `duration` hours to the
    /// tutor; the wallets, the ledger entry, the session and the tutor's
    /// counters are written in one database transaction.
    pub async fn complete_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> ResultEngine<(Session, Transaction)> {
        with_tx!(self, |db_tx| {
            let mut session = self.require_session(&db_tx, session_id).await?;
            if session.role_of(user_id) != Some(SessionRole::Tutor) {
                return Err(EngineError::Forbidden(
                    "only the tutor can complete the session".to_string(),
                ));
            }
            session.complete()?;

            let student = self.require_user(&db_tx, session.student_id).await?;
            let tutor = self.require_user(&db_tx, session.tutor_id).await?;
            let before = BalancePair {
                from: Hours::new(student.balance_minor),
                to: Hours::new(tutor.balance_minor),
            };
            let tx = Transaction::from_session(&session, before)?;

            self.post_to_wallet(
                &db_tx,
                session.student_id,
                session.duration,
                WalletDirection::Spend,
            )
            .await?;
            self.post_to_wallet(
                &db_tx,
                session.tutor_id,
                session.duration,
                WalletDirection::Earn,
            )
            .await?;
            self.record_transaction(&db_tx, &tx).await?;

            session.transaction_id = Some(tx.id);
            sessions::ActiveModel::from(&session).update(&db_tx).await?;

            if let Some(model) = tutors::Entity::find()
                .filter(tutors::Column::UserId.eq(session.tutor_id))
                .one(&db_tx)
                .await?
                && let Some(mut profile) = self.assemble_tutors(&db_tx, vec![model]).await?.pop()
            {
                profile.record_session(session.duration)?;
                tutors::ActiveModel::from(&profile).update(&db_tx).await?;
            }

            tracing::info!(
                session = %session.id,
                transaction = %tx.id,
                amount = %tx.amount,
                "session completed"
            );
            Ok((session, tx))
        })
    }

    /// Cancel a session. Either party may cancel; no hours move.
    pub async fn cancel_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        reason: Option<String>,
    ) -> ResultEngine<Session> {
        with_tx!(self, |db_tx| {
            let mut session = self.require_session(&db_tx, session_id).await?;
            session.require_party(user_id, "cancel")?;
            session.cancel(user_id, normalize_optional_text(reason.as_deref()))?;
            sessions::ActiveModel::from(&session).update(&db_tx).await?;
            tracing::info!(session = %session.id, by = %user_id, "session cancelled");
            Ok(session)
        })
    }

    /// Leave the student's review on a completed session.
    pub async fn review_session(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        rating: u8,
        comment: Option<String>,
    ) -> ResultEngine<Session> {
        with_tx!(self, |db_tx| {
            let mut session = self.require_session(&db_tx, session_id).await?;
            if session.role_of(user_id) != Some(SessionRole::Student) {
                return Err(EngineError::Forbidden(
                    "only the student can review the session".to_string(),
                ));
            }
            session.set_review(rating, normalize_optional_text(comment.as_deref()))?;
            sessions::ActiveModel::from(&session).update(&db_tx).await?;
            Ok(session)
        })
    }

    async fn require_session(
        &self,
        db_tx: &DatabaseTransaction,
        session_id: Uuid,
    ) -> ResultEngine<Session> {
        let model = sessions::Entity::find_by_id(session_id)
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("session not exists".to_string()))?;
        Session::try_from(model)
    }

    /// The bookable user behind `tutor_id`: must exist and be a tutor.
    async fn require_tutor_user(
        &self,
        db_tx: &DatabaseTransaction,
        tutor_id: Uuid,
    ) -> ResultEngine<()> {
        let model = self.require_user(db_tx, tutor_id).await?;
        if !model.is_tutor || !model.is_active {
            return Err(EngineError::KeyNotFound("tutor not exists".to_string()));
        }
        Ok(())
    }
}
