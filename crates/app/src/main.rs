use clap::Parser;
use engine::Hours;
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[derive(Debug, Parser)]
#[command(version, about = "Time-bank marketplace server")]
struct Cli {
    /// Settings file, with or without the `.toml` extension.
    #[arg(long, env = "HOURBANK_SETTINGS", default_value = "settings")]
    settings: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.settings)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "hourbank={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let http = settings.server;
    let db = parse_database(&http.database).await?;
    let engine = engine::Engine::builder()
        .database(db)
        .initial_grant(Hours::from_f64(http.initial_grant_hours)?)
        .build()
        .await?;
    let state = server::ServerState::new(engine, server::JwtVerifier::new(&http.jwt_secret));

    let bind = http.bind.unwrap_or_else(|| "127.0.0.1".to_string());
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", bind, http.port)).await?;
    server::run_with_listener(state, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    tracing::info!("database ready");
    Ok(database)
}
