use anyhow::Context;
use clap::Parser;
use docqa_server::{
    config::Config,
    error::ServerError,
    http::{self, create_router},
    llm::OpenAiModel,
    server::DocQaServer,
};
use std::{env, sync::Arc};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    // async-openai reads the key itself; fail early instead of on the first question.
    env::var("OPENAI_API_KEY")
        .map_err(|_| ServerError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

    let addr = config.listen_addr()?;
    tracing::info!(
        llm_model = %config.llm_model,
        topic_model = %config.topic_model(),
        max_upload_bytes = config.max_upload_bytes,
        "Starting document QA server"
    );

    let model = OpenAiModel::new(config.llm_model.clone(), config.topic_model());
    let server = DocQaServer::new(Arc::new(model));
    let router = create_router(server, config.max_upload_bytes);

    http::serve(addr, router)
        .await
        .context("HTTP server error")?;

    tracing::info!("Document QA server stopped.");
    Ok(())
}
