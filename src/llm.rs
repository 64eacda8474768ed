use crate::resolver::ResolvedContext;
use async_openai::{
    Client as OpenAIClient,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::sync::OnceLock;
use thiserror::Error;
use tiktoken_rs::{CoreBPE, cl100k_base};

/// Only the head of a document is sent for topic inference.
pub const TOPIC_SAMPLE_CHARS: usize = 1000;

pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini-2024-07-18";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenAI Error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("No response from LLM")]
    EmptyResponse,
}

/// The two calls the server makes to a language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// A short, lowercased label describing what `content` is about.
    async fn infer_topic(&self, content: &str) -> Result<String, LlmError>;

    /// Answers `question` given the resolved context.
    async fn complete(&self, context: &ResolvedContext, question: &str)
    -> Result<String, LlmError>;
}

/// The first [`TOPIC_SAMPLE_CHARS`] characters of `content`.
pub fn topic_sample(content: &str) -> &str {
    match content.char_indices().nth(TOPIC_SAMPLE_CHARS) {
        Some((byte_index, _)) => &content[..byte_index],
        None => content,
    }
}

/// Models like to answer with quotes or a closing period around the label.
pub fn normalize_topic(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim()
        .to_lowercase()
}

pub fn topic_prompt(content: &str) -> String {
    format!(
        "Identify the main topic of the following document in a few words. \
         Reply with the topic only.\n\n{}",
        topic_sample(content)
    )
}

/// System and user prompts for a completion. General questions carry no
/// system prompt and are asked as-is.
pub fn completion_prompts(context: &ResolvedContext, question: &str) -> (Option<String>, String) {
    match context {
        ResolvedContext::General(_) => (None, question.to_string()),
        ResolvedContext::TopicComparison(text) | ResolvedContext::PairComparison(text) => (
            Some(
                "You are a helpful assistant comparing two documents. \
                 Answer the user's question using the contents of both files below. \
                 If the files do not contain the answer, say so."
                    .to_string(),
            ),
            format!("Context:\n---\n{}\n---\n\nQuestion: {}", text, question),
        ),
        ResolvedContext::Document(text) => (
            Some(
                "You are a helpful assistant. \
                 Answer the user's question based on the provided document. \
                 If the document does not contain the answer, say so. \
                 Do not make up information."
                    .to_string(),
            ),
            format!("Context:\n---\n{}\n---\n\nQuestion: {}", text, question),
        ),
    }
}

static TOKENIZER: OnceLock<Option<CoreBPE>> = OnceLock::new();

/// Token count under `cl100k_base`, or `None` if the tokenizer is unavailable.
pub fn count_tokens(text: &str) -> Option<usize> {
    TOKENIZER
        .get_or_init(|| match cl100k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!("Tokenizer unavailable, prompt sizes will not be logged: {}", e);
                None
            }
        })
        .as_ref()
        .map(|bpe| bpe.encode_with_special_tokens(text).len())
}

/// [`LanguageModel`] backed by the OpenAI chat completions API.
#[derive(Clone)]
pub struct OpenAiModel {
    client: OpenAIClient<OpenAIConfig>,
    llm_model: String,
    topic_model: String,
}

impl OpenAiModel {
    /// Reads `OPENAI_API_KEY` from the environment through the client's default config.
    pub fn new(llm_model: impl Into<String>, topic_model: impl Into<String>) -> Self {
        Self::with_client(OpenAIClient::new(), llm_model, topic_model)
    }

    pub fn with_client(
        client: OpenAIClient<OpenAIConfig>,
        llm_model: impl Into<String>,
        topic_model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            llm_model: llm_model.into(),
            topic_model: topic_model.into(),
        }
    }

    async fn chat(
        &self,
        model: &str,
        system_prompt: Option<String>,
        user_prompt: String,
    ) -> Result<String, LlmError> {
        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(2);
        if let Some(system_prompt) = system_prompt {
            messages.push(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()?
                    .into(),
            );
        }
        messages.push(
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()?
                .into(),
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(LlmError::EmptyResponse)
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn infer_topic(&self, content: &str) -> Result<String, LlmError> {
        let raw = self.chat(&self.topic_model, None, topic_prompt(content)).await?;
        let topic = normalize_topic(&raw);
        tracing::debug!(topic = %topic, "Inferred document topic");
        Ok(topic)
    }

    async fn complete(
        &self,
        context: &ResolvedContext,
        question: &str,
    ) -> Result<String, LlmError> {
        let (system_prompt, user_prompt) = completion_prompts(context, question);
        if let Some(tokens) = count_tokens(&user_prompt) {
            tracing::info!(model = %self.llm_model, tokens, "Sending completion request");
        }
        self.chat(&self.llm_model, system_prompt, user_prompt).await
    }
}
