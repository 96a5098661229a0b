//! loanlens - a loan-portfolio analytics backend.

use std::sync::Arc;

use loanlens::cli::Cli;
use loanlens::config::Config;
use loanlens::db::{DatabaseClient, PostgresClient};
use loanlens::error::Result;
use loanlens::llm::{factory, SqlAgent};
use loanlens::logging;
use loanlens::server::{self, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load .env before anything reads the environment
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Precedence: CLI arguments > config file > environment variables
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_defaults();
    cli.apply_overrides(&mut config)?;

    info!("Connecting to {}", config.database.display_string());
    let db: Arc<dyn DatabaseClient> = Arc::new(PostgresClient::connect(&config.database).await?);

    let schema = db.introspect_schema().await?;
    info!(
        "Schema loaded: {} tables, {} foreign keys",
        schema.tables.len(),
        schema.foreign_keys.len()
    );

    let client = factory::create_client(
        config.agent.provider,
        config.agent.api_key.clone(),
        config.agent.model.clone(),
    )?;
    let agent = SqlAgent::new(client)
        .with_max_iterations(config.agent.max_iterations)
        .with_timeout(config.agent.timeout_secs)
        .with_max_rows(config.query.max_rows);
    info!("Agent ready (provider: {})", config.agent.provider);

    let state = Arc::new(AppState::new(&config, db, agent));
    server::serve(state, &config.server.bind_address()).await
}
