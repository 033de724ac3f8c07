//! Application settings.
//!
//! Read from a `settings.toml` (or the file given on the command line) and
//! overridden by `HOURBANK__SECTION__KEY` environment variables.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    pub jwt_secret: String,
    /// Hours credited to every new account.
    pub initial_grant_hours: f64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("server.port", 3000)?
            .set_default("server.database", "memory")?
            .set_default("server.initial_grant_hours", 10.0)?
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("HOURBANK").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
