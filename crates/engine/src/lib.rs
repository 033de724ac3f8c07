//! Time-bank engine.
//!
//! The engine owns the user directory, tutor profiles, sessions, programs and
//! the hours ledger. Every operation takes the acting user explicitly; there
//! is no ambient "current user".
//!
//! Balance changes always go through the wallet and are written together with
//! their ledger entry inside one database transaction.

pub use category::Category;
pub use commands::{
    AdjustDirection, BookSessionCmd, ManualTxCmd, NewProgramCmd, ProfileUpdateCmd,
    SessionRequestCmd, SessionUpdateCmd, TutorProfileCmd, TutorUpdateCmd,
};
pub use error::EngineError;
pub use hours::Hours;
pub use matchmaker::{MatchQuery, Recommendation};
pub use ops::{
    Engine, EngineBuilder, LedgerStats, ProgramJoin, SessionListFilter, Suggestion,
    TotalCount, TransactionListFilter, TutorListFilter, TutorSort, UserListFilter, UserStats,
};
pub use page::{Page, Paginated};
pub use programs::{Program, ProgramRole};
pub use sessions::{
    Cancellation, Session, SessionNotes, SessionReview, SessionRole, SessionStatus,
};
pub use transactions::{
    BalancePair, Transaction, TransactionKind, TransactionMetadata, TransactionStatus,
};
pub use tutor_expertise::Expertise;
pub use tutor_reviews::Review;
pub use tutors::{Availability, ScheduleDay, TimeSlot, Tutor, Weekday};
pub use users::{Rating, TimeWallet, User, WalletDirection};

mod category;
mod commands;
mod error;
mod hours;
pub mod matchmaker;
mod ops;
mod page;
mod program_participants;
mod programs;
mod sessions;
mod transactions;
mod tutor_expertise;
mod tutor_reviews;
mod tutors;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
