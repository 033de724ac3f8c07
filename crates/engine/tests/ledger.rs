use chrono::{Days, Utc};
use sea_orm::Database;

use engine::{
    AdjustDirection, BookSessionCmd, Category, Engine, EngineError, Expertise, Hours,
    ManualTxCmd, NewProgramCmd, Page, ProgramRole, SessionListFilter, SessionStatus,
    SessionUpdateCmd, TransactionKind, TransactionListFilter, TutorProfileCmd, User,
};
use migration::MigratorTrait;

async fn engine() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

async fn user(engine: &Engine, name: &str) -> User {
    engine
        .resolve_user(&format!("sub-{name}"), &format!("{name}@example.org"))
        .await
        .unwrap()
}

async fn tutor(engine: &Engine, name: &str) -> User {
    let user = user(engine, name).await;
    engine
        .create_tutor_profile(
            user.id,
            TutorProfileCmd {
                expertise: vec![Expertise {
                    name: "Rust".to_string(),
                    category: Category::Programming,
                    years_of_experience: 3,
                }],
                hourly_rate: Hours::whole(1),
                bio: "Systems programming".to_string(),
                availability: None,
            },
        )
        .await
        .unwrap();
    engine.user(user.id).await.unwrap()
}

fn booking(tutor: &User, student: &User, hours: i64) -> BookSessionCmd {
    let date = Utc::now().date_naive().checked_add_days(Days::new(3)).unwrap();
    BookSessionCmd::new(tutor.id, student.id, "Rust", Hours::whole(hours), date, "18:00")
        .category(Category::Programming)
}

async fn balance(engine: &Engine, user: &User) -> Hours {
    engine.wallet(user.id).await.unwrap().balance
}

#[tokio::test]
async fn new_users_receive_the_initial_grant() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    assert_eq!(alice.wallet.balance, Hours::whole(10));
    assert_eq!(alice.wallet.total_earned, Hours::ZERO);
    assert_eq!(alice.wallet.total_spent, Hours::ZERO);

    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let stingy = Engine::builder()
        .database(db)
        .initial_grant(Hours::whole(2))
        .build()
        .await
        .unwrap();
    let bob = user(&stingy, "bob").await;
    assert_eq!(bob.wallet.balance, Hours::whole(2));
}

#[tokio::test]
async fn completing_a_session_moves_hours_once() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;

    let session = engine
        .book_session(booking(&teacher, &student, 2))
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.location, "Online");
    // booking alone moves nothing
    assert_eq!(balance(&engine, &student).await, Hours::whole(10));

    let (done, tx) = engine
        .complete_session(teacher.id, session.id)
        .await
        .unwrap();
    assert_eq!(done.status, SessionStatus::Completed);
    assert_eq!(done.transaction_id, Some(tx.id));
    assert_eq!(tx.amount, Hours::whole(2));
    assert_eq!(tx.session_id, Some(session.id));
    assert_eq!(tx.kind_for(student.id), TransactionKind::Spent);
    assert_eq!(tx.kind_for(teacher.id), TransactionKind::Earned);
    assert_eq!(tx.balance_before.from, Hours::whole(10));
    assert_eq!(tx.balance_before.to, Hours::whole(10));
    assert_eq!(tx.balance_after.from, Hours::whole(8));
    assert_eq!(tx.balance_after.to, Hours::whole(12));

    let student_wallet = engine.wallet(student.id).await.unwrap();
    assert_eq!(student_wallet.balance, Hours::whole(8));
    assert_eq!(student_wallet.total_spent, Hours::whole(2));
    let teacher_wallet = engine.wallet(teacher.id).await.unwrap();
    assert_eq!(teacher_wallet.balance, Hours::whole(12));
    assert_eq!(teacher_wallet.total_earned, Hours::whole(2));

    let profile = engine
        .tutor(teacher.tutor_id.unwrap())
        .await
        .unwrap();
    assert_eq!(profile.total_sessions, 1);
    assert_eq!(profile.total_hours_taught, Hours::whole(2));

    let again = engine.complete_session(teacher.id, session.id).await;
    assert_eq!(
        again.unwrap_err(),
        EngineError::InvalidState("session already completed".to_string())
    );
    let ledger = engine
        .list_transactions(student.id, TransactionListFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(ledger.total_items, 1);
    assert_eq!(balance(&engine, &student).await, Hours::whole(8));
}

#[tokio::test]
async fn only_the_tutor_completes() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;
    let session = engine
        .book_session(booking(&teacher, &student, 1))
        .await
        .unwrap();

    let err = engine
        .complete_session(student.id, session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    assert_eq!(balance(&engine, &student).await, Hours::whole(10));
}

#[tokio::test]
async fn booking_checks_tutor_and_balance() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;

    let err = engine
        .book_session(booking(&teacher, &student, 11))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    let not_a_tutor = engine
        .book_session(booking(&student, &teacher, 1))
        .await
        .unwrap_err();
    assert!(matches!(not_a_tutor, EngineError::KeyNotFound(_)));

    let myself = engine
        .book_session(booking(&teacher, &teacher, 1))
        .await
        .unwrap_err();
    assert!(matches!(myself, EngineError::InvalidInput(_)));

    let date = Utc::now().date_naive();
    let too_short =
        BookSessionCmd::new(teacher.id, student.id, "Rust", Hours::new(25), date, "10:00");
    assert!(matches!(
        engine.book_session(too_short).await.unwrap_err(),
        EngineError::InvalidAmount(_)
    ));
}

#[tokio::test]
async fn completion_rechecks_the_student_balance() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;
    let session = engine
        .book_session(booking(&teacher, &student, 8))
        .await
        .unwrap();

    engine
        .manual_transaction(ManualTxCmd::new(
            student.id,
            TransactionKind::Spent,
            Hours::whole(5),
            "Groceries run",
        ))
        .await
        .unwrap();

    let err = engine
        .complete_session(teacher.id, session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    let session = engine.session(student.id, session.id).await.unwrap();
    assert_eq!(session.status, SessionStatus::Pending);
    assert_eq!(session.transaction_id, None);
    assert_eq!(balance(&engine, &student).await, Hours::whole(5));
    assert_eq!(balance(&engine, &teacher).await, Hours::whole(10));
}

#[tokio::test]
async fn cancel_is_terminal() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;

    let session = engine
        .book_session(booking(&teacher, &student, 1))
        .await
        .unwrap();
    let cancelled = engine
        .cancel_session(student.id, session.id, Some("sick".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, SessionStatus::Cancelled);
    let cancellation = cancelled.cancellation.unwrap();
    assert_eq!(cancellation.cancelled_by, student.id);
    assert_eq!(cancellation.reason.as_deref(), Some("sick"));

    assert!(matches!(
        engine
            .cancel_session(teacher.id, session.id, None)
            .await
            .unwrap_err(),
        EngineError::InvalidState(_)
    ));
    assert_eq!(
        engine
            .complete_session(teacher.id, session.id)
            .await
            .unwrap_err(),
        EngineError::InvalidState("cannot complete a cancelled session".to_string())
    );

    let done = engine
        .book_session(booking(&teacher, &student, 1))
        .await
        .unwrap();
    engine.complete_session(teacher.id, done.id).await.unwrap();
    assert!(matches!(
        engine
            .cancel_session(student.id, done.id, None)
            .await
            .unwrap_err(),
        EngineError::InvalidState(_)
    ));
}

#[tokio::test]
async fn update_enforces_the_lifecycle() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;
    let stranger = user(&engine, "stranger").await;
    let session = engine
        .book_session(booking(&teacher, &student, 1))
        .await
        .unwrap();

    let confirmed = engine
        .update_session(
            teacher.id,
            session.id,
            SessionUpdateCmd::default()
                .status(SessionStatus::Confirmed)
                .meeting_link("https://meet.example.org/abc"),
        )
        .await
        .unwrap();
    assert_eq!(confirmed.status, SessionStatus::Confirmed);
    assert_eq!(
        confirmed.meeting_link.as_deref(),
        Some("https://meet.example.org/abc")
    );

    let backwards = engine
        .update_session(
            student.id,
            session.id,
            SessionUpdateCmd::default().status(SessionStatus::Pending),
        )
        .await
        .unwrap_err();
    assert!(matches!(backwards, EngineError::InvalidState(_)));

    let shortcut = engine
        .update_session(
            teacher.id,
            session.id,
            SessionUpdateCmd::default().status(SessionStatus::Completed),
        )
        .await
        .unwrap_err();
    assert!(matches!(shortcut, EngineError::InvalidState(_)));

    let foreign = engine
        .update_session(
            stranger.id,
            session.id,
            SessionUpdateCmd::default().status(SessionStatus::InProgress),
        )
        .await
        .unwrap_err();
    assert!(matches!(foreign, EngineError::Forbidden(_)));

    let stored = engine.session(teacher.id, session.id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Confirmed);
    assert!(matches!(
        engine.session(stranger.id, session.id).await.unwrap_err(),
        EngineError::Forbidden(_)
    ));
}

#[tokio::test]
async fn session_review_is_accepted_once() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;
    let session = engine
        .book_session(booking(&teacher, &student, 1))
        .await
        .unwrap();

    let early = engine
        .review_session(student.id, session.id, 5, None)
        .await
        .unwrap_err();
    assert_eq!(
        early,
        EngineError::InvalidState("can only review completed sessions".to_string())
    );

    engine.complete_session(teacher.id, session.id).await.unwrap();
    assert!(matches!(
        engine
            .review_session(teacher.id, session.id, 5, None)
            .await
            .unwrap_err(),
        EngineError::Forbidden(_)
    ));

    let reviewed = engine
        .review_session(student.id, session.id, 4, Some("clear".to_string()))
        .await
        .unwrap();
    let review = reviewed.review.unwrap();
    assert_eq!(review.rating, 4);
    assert_eq!(review.comment.as_deref(), Some("clear"));

    assert_eq!(
        engine
            .review_session(student.id, session.id, 5, None)
            .await
            .unwrap_err(),
        EngineError::InvalidState("session already reviewed".to_string())
    );
}

#[tokio::test]
async fn manual_entries_follow_the_wallet() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;

    let earned = engine
        .manual_transaction(ManualTxCmd::new(
            alice.id,
            TransactionKind::Earned,
            Hours::new(150),
            " Gardening ",
        ))
        .await
        .unwrap();
    assert_eq!(earned.skill, "Gardening");
    assert_eq!(earned.description.as_deref(), Some("Manual earning"));
    assert_eq!(earned.metadata.category, Some(Category::Other));
    assert_eq!(earned.balance_before.from, Hours::whole(10));
    assert_eq!(earned.balance_after.from, Hours::new(1150));
    assert_eq!(earned.from_user_id, alice.id);
    assert_eq!(earned.to_user_id, alice.id);

    let overdraw = engine
        .manual_transaction(ManualTxCmd::new(
            alice.id,
            TransactionKind::Spent,
            Hours::whole(12),
            "Moving",
        ))
        .await
        .unwrap_err();
    assert!(matches!(overdraw, EngineError::InsufficientBalance(_)));
    assert_eq!(balance(&engine, &alice).await, Hours::new(1150));

    let refund = engine
        .manual_transaction(ManualTxCmd::new(
            alice.id,
            TransactionKind::Refund,
            Hours::whole(1),
            "Moving",
        ))
        .await
        .unwrap_err();
    assert!(matches!(refund, EngineError::InvalidInput(_)));

    let zero = engine
        .manual_transaction(ManualTxCmd::new(
            alice.id,
            TransactionKind::Earned,
            Hours::ZERO,
            "Nothing",
        ))
        .await
        .unwrap_err();
    assert!(matches!(zero, EngineError::InvalidAmount(_)));

    let wallet = engine.wallet(alice.id).await.unwrap();
    assert_eq!(wallet.total_earned, Hours::new(150));
    assert_eq!(wallet.total_spent, Hours::ZERO);
}

#[tokio::test]
async fn huge_earnings_stop_before_the_balance_overflows() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;
    let huge = Hours::from_f64(4.0e16).unwrap();

    for _ in 0..2 {
        engine
            .manual_transaction(ManualTxCmd::new(
                alice.id,
                TransactionKind::Earned,
                huge,
                "Lighthouse keeping",
            ))
            .await
            .unwrap();
    }
    let before = engine.wallet(alice.id).await.unwrap();

    let err = engine
        .manual_transaction(ManualTxCmd::new(
            alice.id,
            TransactionKind::Earned,
            huge,
            "Lighthouse keeping",
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .adjust_wallet(alice.id, huge, AdjustDirection::Add)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    assert_eq!(engine.wallet(alice.id).await.unwrap(), before);
    assert!(before.balance.is_positive());
    let ledger = engine
        .list_transactions(alice.id, TransactionListFilter::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(ledger.total_items, 2);
}

#[tokio::test]
async fn adjustments_leave_totals_alone() {
    let engine = engine().await;
    let alice = user(&engine, "alice").await;

    let (wallet, tx) = engine
        .adjust_wallet(alice.id, Hours::whole(5), AdjustDirection::Add)
        .await
        .unwrap();
    assert_eq!(wallet.balance, Hours::whole(15));
    assert_eq!(wallet.total_earned, Hours::ZERO);
    assert_eq!(tx.kind, TransactionKind::Adjustment);
    assert_eq!(tx.balance_after.to, Hours::whole(15));

    let err = engine
        .adjust_wallet(alice.id, Hours::whole(20), AdjustDirection::Subtract)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientBalance(_)));

    let (wallet, _) = engine
        .adjust_wallet(alice.id, Hours::whole(15), AdjustDirection::Subtract)
        .await
        .unwrap();
    assert_eq!(wallet.balance, Hours::ZERO);
    assert_eq!(wallet.total_spent, Hours::ZERO);
}

#[tokio::test]
async fn joining_a_program_rewards_the_organizer_once() {
    let engine = engine().await;
    let organizer = user(&engine, "organizer").await;
    let alice = user(&engine, "alice").await;

    let program = engine
        .create_program(
            NewProgramCmd::new(organizer.id, "  Community choir ")
                .category(Category::Music)
                .reward_hours(Hours::whole(5)),
        )
        .await
        .unwrap();
    assert_eq!(program.title, "Community choir");
    assert!(program.is_open);

    let first = engine.join_program(alice.id, program.id).await.unwrap();
    assert_eq!(first.program.participants, vec![alice.id]);
    let tx = first.transaction.unwrap();
    assert_eq!(tx.kind, TransactionKind::Earned);
    assert_eq!(tx.amount, Hours::whole(5));
    assert_eq!(tx.from_user_id, organizer.id);
    assert_eq!(tx.to_user_id, organizer.id);
    assert_eq!(tx.skill, "Community choir");
    assert_eq!(tx.description.as_deref(), Some("Program join reward"));
    assert_eq!(tx.metadata.category, Some(Category::Music));
    assert_eq!(balance(&engine, &organizer).await, Hours::whole(15));

    let second = engine.join_program(alice.id, program.id).await.unwrap();
    assert!(second.transaction.is_none());
    assert_eq!(second.program.participants, vec![alice.id]);
    assert_eq!(balance(&engine, &organizer).await, Hours::whole(15));
    assert_eq!(
        engine.program(program.id).await.unwrap().participants.len(),
        1
    );

    assert!(matches!(
        engine
            .join_program(organizer.id, program.id)
            .await
            .unwrap_err(),
        EngineError::InvalidState(_)
    ));
    assert_eq!(balance(&engine, &organizer).await, Hours::whole(15));
    assert!(!engine.program(program.id).await.unwrap().has_participant(organizer.id));

    let joined = engine.list_joined_programs(alice.id).await.unwrap();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].1, ProgramRole::Participant);
    let organized = engine.list_joined_programs(organizer.id).await.unwrap();
    assert_eq!(organized[0].1, ProgramRole::Organizer);

    let music = engine.list_programs(Some(Category::Music)).await.unwrap();
    assert_eq!(music.len(), 1);
    assert!(
        engine
            .list_programs(Some(Category::Design))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn ledger_views_follow_the_viewer() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;
    let stranger = user(&engine, "stranger").await;

    let session = engine
        .book_session(booking(&teacher, &student, 2))
        .await
        .unwrap();
    let (_, tx) = engine
        .complete_session(teacher.id, session.id)
        .await
        .unwrap();
    engine
        .manual_transaction(ManualTxCmd::new(
            student.id,
            TransactionKind::Earned,
            Hours::whole(1),
            "Baking",
        ))
        .await
        .unwrap();

    let student_stats = engine.transaction_stats(student.id).await.unwrap();
    assert_eq!(student_stats.spent.total, Hours::whole(2));
    assert_eq!(student_stats.spent.count, 1);
    assert_eq!(student_stats.earned.total, Hours::whole(1));
    assert_eq!(student_stats.earned.count, 1);
    assert_eq!(student_stats.balance, Hours::whole(9));
    assert_eq!(student_stats.net_flow, Hours::whole(-1));

    let teacher_stats = engine.transaction_stats(teacher.id).await.unwrap();
    assert_eq!(teacher_stats.earned.total, Hours::whole(2));
    assert_eq!(teacher_stats.earned.count, 1);
    assert_eq!(teacher_stats.spent.count, 0);
    assert_eq!(teacher_stats.net_flow, Hours::whole(2));

    let earned = engine
        .list_transactions(
            teacher.id,
            TransactionListFilter {
                kind: Some(TransactionKind::Earned),
                status: None,
            },
            Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(earned.total_items, 1);
    assert_eq!(earned.items[0].id, tx.id);

    let spent = engine
        .list_transactions(
            student.id,
            TransactionListFilter {
                kind: Some(TransactionKind::Spent),
                status: None,
            },
            Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(spent.total_items, 1);

    assert_eq!(
        engine.transaction(teacher.id, tx.id).await.unwrap().id,
        tx.id
    );
    assert!(matches!(
        engine.transaction(stranger.id, tx.id).await.unwrap_err(),
        EngineError::Forbidden(_)
    ));
}

#[tokio::test]
async fn upcoming_lists_open_sessions_soonest_first() {
    let engine = engine().await;
    let teacher = tutor(&engine, "teacher").await;
    let student = user(&engine, "student").await;

    let today = Utc::now().date_naive();
    let later = today.checked_add_days(Days::new(7)).unwrap();
    let sooner = today.checked_add_days(Days::new(1)).unwrap();
    let past = today.checked_sub_days(Days::new(7)).unwrap();
    for date in [later, sooner, past] {
        engine
            .book_session(BookSessionCmd::new(
                teacher.id,
                student.id,
                "Rust",
                Hours::whole(1),
                date,
                "09:30",
            ))
            .await
            .unwrap();
    }
    let done = engine
        .book_session(booking(&teacher, &student, 1))
        .await
        .unwrap();
    engine.complete_session(teacher.id, done.id).await.unwrap();

    let upcoming = engine
        .list_sessions(
            student.id,
            SessionListFilter {
                status: None,
                upcoming: true,
            },
            Page::default(),
        )
        .await
        .unwrap();
    let dates: Vec<_> = upcoming.items.iter().map(|s| s.scheduled_date).collect();
    assert_eq!(dates, vec![sooner, later]);

    let all = engine
        .list_sessions(
            teacher.id,
            SessionListFilter::default(),
            Page::new(Some(1), Some(3)),
        )
        .await
        .unwrap();
    assert_eq!(all.total_items, 4);
    assert_eq!(all.total_pages, 2);
    assert_eq!(all.items.len(), 3);

    let completed = engine
        .list_sessions(
            teacher.id,
            SessionListFilter {
                status: Some(SessionStatus::Completed),
                upcoming: false,
            },
            Page::default(),
        )
        .await
        .unwrap();
    assert_eq!(completed.total_items, 1);
}
