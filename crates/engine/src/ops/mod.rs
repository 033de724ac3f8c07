use sea_orm::DatabaseConnection;

use crate::{Hours, ResultEngine};

mod ledger;
mod matchmaker;
mod programs;
mod sessions;
mod tutors;
mod users;
mod wallet;

pub use ledger::{LedgerStats, TotalCount, TransactionListFilter};
pub use matchmaker::Suggestion;
pub use programs::ProgramJoin;
pub use sessions::SessionListFilter;
pub use tutors::{TutorListFilter, TutorSort};
pub use users::{UserListFilter, UserStats};

/// Hours credited to every new user.
pub const DEFAULT_INITIAL_GRANT: Hours = Hours::whole(10);

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    initial_grant: Hours,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Balance given to users on first sign-in.
    pub fn initial_grant(&self) -> Hours {
        self.initial_grant
    }
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    initial_grant: Hours,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            initial_grant: DEFAULT_INITIAL_GRANT,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the sign-up grant.
    pub fn initial_grant(mut self, hours: Hours) -> EngineBuilder {
        self.initial_grant = hours;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.initial_grant.is_negative() {
            return Err(crate::EngineError::InvalidAmount(
                "initial grant must be >= 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            initial_grant: self.initial_grant,
        })
    }
}
