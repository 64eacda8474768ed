use crate::{
    doc_loader::{self, Document, Upload},
    error::Result,
    llm::LanguageModel,
    resolver::{DocumentId, FileContextResolver},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

// --- Request / Response Types ---

#[derive(Debug, Clone)]
pub struct AskRequest {
    pub question: String,
    pub upload: Option<Upload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub topic: String,
    pub chars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentListing {
    pub documents: Vec<DocumentSummary>,
    pub active: Option<DocumentId>,
    pub compare_mode: bool,
}

// --- Main Server Struct ---

/// Owns the resolver for the whole process. Cloning shares the same state.
///
/// Every resolver operation happens under one lock, so an upload and the
/// resolution that follows it cannot interleave with another request's.
/// Model calls are made with the lock released.
#[derive(Clone)]
pub struct DocQaServer {
    resolver: Arc<Mutex<FileContextResolver>>,
    model: Arc<dyn LanguageModel>,
}

impl DocQaServer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            resolver: Arc::new(Mutex::new(FileContextResolver::new())),
            model,
        }
    }

    /// Extracts the upload's text and labels it with an inferred topic.
    /// PDF parsing is CPU-bound, so extraction runs on the blocking pool.
    pub async fn prepare_document(&self, upload: &Upload) -> Result<Document> {
        let upload_clone = upload.clone();
        let content =
            tokio::task::spawn_blocking(move || doc_loader::extract_text(&upload_clone)).await??;
        let topic = self.model.infer_topic(&content).await?;
        Ok(Document::new(topic, content))
    }

    pub async fn ask(&self, request: AskRequest) -> Result<Answer> {
        let AskRequest { question, upload } = request;

        let document = match &upload {
            Some(upload) => Some(self.prepare_document(upload).await?),
            None => None,
        };

        let context = {
            let mut resolver = self.resolver.lock().await;
            let new_document_ingested = match document {
                Some(document) => {
                    resolver.ingest(document);
                    true
                }
                None => false,
            };
            resolver.resolve_context(&question, new_document_ingested)?
        };

        tracing::debug!(general = context.is_general(), "Resolved question context");
        let answer = self.model.complete(&context, &question).await?;
        Ok(Answer { answer })
    }

    pub async fn documents(&self) -> DocumentListing {
        let resolver = self.resolver.lock().await;
        let documents = resolver
            .iter()
            .map(|(id, doc)| DocumentSummary {
                id,
                topic: doc.topic.clone(),
                chars: doc.content.chars().count(),
            })
            .collect();

        DocumentListing {
            documents,
            active: resolver.active(),
            compare_mode: resolver.compare_mode(),
        }
    }
}
