use crate::{
    error::{Result, ServerError},
    llm::DEFAULT_LLM_MODEL,
};
use clap::Parser;
use std::net::SocketAddr;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Answer questions about uploaded documents with an OpenAI model
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "DOCQA_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: String,

    /// Chat model used to answer questions
    #[arg(long, env = "LLM_MODEL", default_value = DEFAULT_LLM_MODEL)]
    pub llm_model: String,

    /// Chat model used to label uploads with a topic (defaults to the answering model)
    #[arg(long, env = "TOPIC_MODEL")]
    pub topic_model: Option<String>,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "DOCQA_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ServerError::Config(format!("Invalid listen address '{}': {}", self.listen, e))
        })
    }

    pub fn topic_model(&self) -> &str {
        self.topic_model.as_deref().unwrap_or(&self.llm_model)
    }
}
