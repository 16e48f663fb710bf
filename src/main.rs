use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use hospital_nlq::api;
use hospital_nlq::config::Config;
use hospital_nlq::services::{
    DatabaseAdapter, GoogleTts, LlmService, LlmSqlTranslator, LlmSummarizer, QueryPipeline,
    SqliteAdapter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Open the hospital database
    let database = Arc::new(SqliteAdapter::open(&config.database).map_err(|e| {
        error!("Failed to open database: {}", e);
        e
    })?);

    let metadata = database.get_metadata().await?;
    info!(
        "Hospital database {} has tables: {}",
        database.path(),
        metadata.table_names().join(", ")
    );
    if !metadata.views.is_empty() {
        info!("Views: {}", metadata.view_names().join(", "));
    }

    // Initialize LLM client
    let llm = Arc::new(LlmService::new(&config.llm)?);
    if !llm.has_api_key() {
        warn!("No API key configured; questions will fail until OPENAI_API_KEY or GROQ_API_KEY is set");
    }
    info!("Using model {}", llm.model());

    let pipeline = Arc::new(QueryPipeline::new(
        Arc::new(LlmSqlTranslator::new(llm.clone(), config.llm.top_k)),
        database,
        Arc::new(LlmSummarizer::new(llm)),
        Arc::new(GoogleTts::new(&config.speech)?),
    ));

    let app: Router = api::routes::create_router_with_state(pipeline);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
