//! Startup wiring: configuration, store, room inventory, and the parser
//! strategy, assembled into a ready-to-serve [`Application`].

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use concierge_agent::{
    IntentParser, LlmIntentParser, OpenAiCompatClient, Orchestrator, RuleBasedParser,
};
use concierge_core::{AppConfig, ConfigError, LoadOptions, Menu};
use concierge_db::repositories::{
    RepositoryError, SqlConversationRepository, SqlOrderRepository, SqlRequestRepository,
    SqlRoomRepository,
};
use concierge_db::{connect_with_settings, migrations, seed_rooms, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: Arc<Orchestrator>,
    pub parser_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("room seeding failed: {0}")]
    Seed(#[source] RepositoryError),
    #[error("llm client setup failed: {0}")]
    Llm(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(url = %config.database.url, "database pool ready");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!("migrations up to date");

    let summary = seed_rooms(&db_pool).await.map_err(BootstrapError::Seed)?;
    info!(inserted = summary.rooms_inserted, total = summary.rooms_total, "room inventory seeded");

    // The parser strategy is fixed at startup; a failing model at runtime
    // degrades per request instead of switching modes.
    let parser: Arc<dyn IntentParser> = if config.llm.enabled {
        let client = OpenAiCompatClient::from_config(&config.llm).map_err(BootstrapError::Llm)?;
        Arc::new(LlmIntentParser::new(
            Box::new(client),
            Menu::standard(),
            Duration::from_secs(config.llm.timeout_secs),
        ))
    } else {
        Arc::new(RuleBasedParser::default())
    };
    let parser_mode = parser.mode();
    info!(parser = parser_mode, "intent parser selected");

    let orchestrator = Arc::new(Orchestrator::new(
        parser,
        Arc::new(SqlConversationRepository::new(db_pool.clone())),
        Arc::new(SqlRoomRepository::new(db_pool.clone())),
        Arc::new(SqlOrderRepository::new(db_pool.clone())),
        Arc::new(SqlRequestRepository::new(db_pool.clone())),
    ));

    Ok(Application { config, db_pool, orchestrator, parser_mode })
}
