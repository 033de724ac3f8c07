//! Initial schema migration - creates all tables from scratch.
//!
//! - `users`: directory entries and their time wallet
//! - `tutors`: tutor profiles, 1:1 with users
//! - `tutor_expertise`: ordered expertise entries of a tutor
//! - `tutor_reviews`: reviews left on tutors
//! - `sessions`: teaching sessions and their lifecycle
//! - `transactions`: the immutable hours ledger
//! - `programs`: group programs
//! - `program_participants`: (program, user) join table

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Subject,
    Email,
    DisplayName,
    Bio,
    PhotoUrl,
    Interests,
    BalanceMinor,
    TotalEarnedMinor,
    TotalSpentMinor,
    IsTutor,
    TutorId,
    RatingAverage,
    RatingCount,
    IsActive,
    CreatedAt,
    LastLogin,
}

#[derive(Iden)]
enum Tutors {
    Table,
    Id,
    UserId,
    HourlyRateMinor,
    Bio,
    IsAvailable,
    Schedule,
    RatingAverage,
    RatingCount,
    TotalSessions,
    TotalHoursTaughtMinor,
    IsVerified,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum TutorExpertise {
    Table,
    Id,
    TutorId,
    Position,
    Name,
    Category,
    YearsOfExperience,
}

#[derive(Iden)]
enum TutorReviews {
    Table,
    Id,
    TutorId,
    StudentId,
    Rating,
    Comment,
    SessionId,
    CreatedAt,
}

#[derive(Iden)]
enum Sessions {
    Table,
    Id,
    TutorId,
    StudentId,
    Skill,
    Category,
    DurationMinor,
    ScheduledDate,
    ScheduledTime,
    Status,
    MeetingLink,
    Location,
    Description,
    TutorNotes,
    StudentNotes,
    TransactionId,
    ReviewRating,
    ReviewComment,
    ReviewedAt,
    CancelledBy,
    CancelReason,
    CancelledAt,
    CreatedAt,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    Kind,
    FromUserId,
    ToUserId,
    AmountMinor,
    SessionId,
    Skill,
    Description,
    Status,
    BeforeFromMinor,
    BeforeToMinor,
    AfterFromMinor,
    AfterToMinor,
    Category,
    SessionDate,
    Notes,
    CreatedAt,
}

#[derive(Iden)]
enum Programs {
    Table,
    Id,
    Title,
    Category,
    Description,
    OrganizerId,
    RewardMinor,
    IsOpen,
    CreatedAt,
}

#[derive(Iden)]
enum ProgramParticipants {
    Table,
    ProgramId,
    UserId,
    JoinedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Subject).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::DisplayName).string().not_null())
                    .col(ColumnDef::new(Users::Bio).text().not_null().default(""))
                    .col(ColumnDef::new(Users::PhotoUrl).string())
                    .col(
                        ColumnDef::new(Users::Interests)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Users::BalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Users::TotalEarnedMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::TotalSpentMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::IsTutor)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::TutorId).uuid())
                    .col(
                        ColumnDef::new(Users::RatingAverage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Users::RatingCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::LastLogin).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-subject-unique")
                    .table(Users::Table)
                    .col(Users::Subject)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-users-email-unique")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Tutors
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Tutors::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Tutors::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Tutors::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Tutors::HourlyRateMinor)
                            .big_integer()
                            .not_null()
                            .default(100),
                    )
                    .col(ColumnDef::new(Tutors::Bio).text().not_null())
                    .col(
                        ColumnDef::new(Tutors::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Tutors::Schedule)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Tutors::RatingAverage)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Tutors::RatingCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tutors::TotalSessions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tutors::TotalHoursTaughtMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tutors::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Tutors::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Tutors::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tutors-user_id")
                            .from(Tutors::Table, Tutors::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tutors-user_id-unique")
                    .table(Tutors::Table)
                    .col(Tutors::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Tutor expertise
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TutorExpertise::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutorExpertise::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TutorExpertise::TutorId).uuid().not_null())
                    .col(
                        ColumnDef::new(TutorExpertise::Position)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TutorExpertise::Name).string().not_null())
                    .col(
                        ColumnDef::new(TutorExpertise::Category)
                            .string()
                            .not_null()
                            .default("other"),
                    )
                    .col(
                        ColumnDef::new(TutorExpertise::YearsOfExperience)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tutor_expertise-tutor_id")
                            .from(TutorExpertise::Table, TutorExpertise::TutorId)
                            .to(Tutors::Table, Tutors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tutor_expertise-tutor_id")
                    .table(TutorExpertise::Table)
                    .col(TutorExpertise::TutorId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Tutor reviews
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(TutorReviews::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TutorReviews::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TutorReviews::TutorId).uuid().not_null())
                    .col(ColumnDef::new(TutorReviews::StudentId).uuid().not_null())
                    .col(ColumnDef::new(TutorReviews::Rating).integer().not_null())
                    .col(ColumnDef::new(TutorReviews::Comment).text())
                    .col(ColumnDef::new(TutorReviews::SessionId).uuid())
                    .col(
                        ColumnDef::new(TutorReviews::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-tutor_reviews-tutor_id")
                            .from(TutorReviews::Table, TutorReviews::TutorId)
                            .to(Tutors::Table, Tutors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-tutor_reviews-tutor_id")
                    .table(TutorReviews::Table)
                    .col(TutorReviews::TutorId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Sessions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Sessions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Sessions::TutorId).uuid().not_null())
                    .col(ColumnDef::new(Sessions::StudentId).uuid().not_null())
                    .col(ColumnDef::new(Sessions::Skill).string().not_null())
                    .col(
                        ColumnDef::new(Sessions::Category)
                            .string()
                            .not_null()
                            .default("other"),
                    )
                    .col(
                        ColumnDef::new(Sessions::DurationMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Sessions::ScheduledDate).date().not_null())
                    .col(ColumnDef::new(Sessions::ScheduledTime).string().not_null())
                    .col(
                        ColumnDef::new(Sessions::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Sessions::MeetingLink).string())
                    .col(
                        ColumnDef::new(Sessions::Location)
                            .string()
                            .not_null()
                            .default("Online"),
                    )
                    .col(ColumnDef::new(Sessions::Description).text())
                    .col(ColumnDef::new(Sessions::TutorNotes).text())
                    .col(ColumnDef::new(Sessions::StudentNotes).text())
                    .col(ColumnDef::new(Sessions::TransactionId).uuid())
                    .col(ColumnDef::new(Sessions::ReviewRating).integer())
                    .col(ColumnDef::new(Sessions::ReviewComment).text())
                    .col(ColumnDef::new(Sessions::ReviewedAt).timestamp())
                    .col(ColumnDef::new(Sessions::CancelledBy).uuid())
                    .col(ColumnDef::new(Sessions::CancelReason).text())
                    .col(ColumnDef::new(Sessions::CancelledAt).timestamp())
                    .col(ColumnDef::new(Sessions::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-tutor_id")
                            .from(Sessions::Table, Sessions::TutorId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sessions-student_id")
                            .from(Sessions::Table, Sessions::StudentId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sessions-tutor_id-status")
                    .table(Sessions::Table)
                    .col(Sessions::TutorId)
                    .col(Sessions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sessions-student_id-status")
                    .table(Sessions::Table)
                    .col(Sessions::StudentId)
                    .col(Sessions::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sessions-scheduled_date")
                    .table(Sessions::Table)
                    .col(Sessions::ScheduledDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(ColumnDef::new(Transactions::FromUserId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::ToUserId).uuid().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::SessionId).uuid())
                    .col(ColumnDef::new(Transactions::Skill).string().not_null())
                    .col(ColumnDef::new(Transactions::Description).text())
                    .col(
                        ColumnDef::new(Transactions::Status)
                            .string()
                            .not_null()
                            .default("completed"),
                    )
                    .col(
                        ColumnDef::new(Transactions::BeforeFromMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::BeforeToMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AfterFromMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::AfterToMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Category).string())
                    .col(ColumnDef::new(Transactions::SessionDate).date())
                    .col(ColumnDef::new(Transactions::Notes).text())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-from_user_id")
                            .from(Transactions::Table, Transactions::FromUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-to_user_id")
                            .from(Transactions::Table, Transactions::ToUserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-from_user_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::FromUserId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-to_user_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::ToUserId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-session_id")
                    .table(Transactions::Table)
                    .col(Transactions::SessionId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Programs
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Programs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Programs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Programs::Title).string().not_null())
                    .col(
                        ColumnDef::new(Programs::Category)
                            .string()
                            .not_null()
                            .default("other"),
                    )
                    .col(
                        ColumnDef::new(Programs::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Programs::OrganizerId).uuid().not_null())
                    .col(
                        ColumnDef::new(Programs::RewardMinor)
                            .big_integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(
                        ColumnDef::new(Programs::IsOpen)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Programs::CreatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-programs-organizer_id")
                            .from(Programs::Table, Programs::OrganizerId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 8. Program participants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ProgramParticipants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgramParticipants::ProgramId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramParticipants::UserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgramParticipants::JoinedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ProgramParticipants::ProgramId)
                            .col(ProgramParticipants::UserId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_participants-program_id")
                            .from(ProgramParticipants::Table, ProgramParticipants::ProgramId)
                            .to(Programs::Table, Programs::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-program_participants-user_id")
                            .from(ProgramParticipants::Table, ProgramParticipants::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ProgramParticipants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Programs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Sessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TutorReviews::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(TutorExpertise::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tutors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
