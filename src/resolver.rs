//! File Context Resolver.
//!
//! Owns every document uploaded during the life of the process and decides,
//! per question, which document text is handed to the language model as
//! context. Documents are never removed, so a [`DocumentId`] stays valid for
//! as long as the resolver exists.

use serde::Serialize;
use thiserror::Error;

use crate::{
    doc_loader::Document,
    intent::{self, FileRef, Intent},
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(
        "Could not find uploaded files for both topics '{first}' and '{second}'. Upload both files before comparing them."
    )]
    ComparisonUnavailable { first: String, second: String },
}

/// Position of a document in the store, in upload order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocumentId(usize);

impl DocumentId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// The text to present to the model, tagged with how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedContext {
    /// Two documents located by topic, labelled "File 1" / "File 2".
    TopicComparison(String),
    /// The first two uploads, labelled "First File" / "Second File".
    PairComparison(String),
    /// A single document's content, verbatim.
    Document(String),
    /// No documents at all: the question itself, answered from general knowledge.
    General(String),
}

impl ResolvedContext {
    pub fn text(&self) -> &str {
        match self {
            ResolvedContext::TopicComparison(text)
            | ResolvedContext::PairComparison(text)
            | ResolvedContext::Document(text)
            | ResolvedContext::General(text) => text,
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, ResolvedContext::General(_))
    }
}

#[derive(Debug, Default)]
pub struct FileContextResolver {
    documents: Vec<Document>,
    active: Option<DocumentId>,
    compare_mode: bool,
}

impl FileContextResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the document and makes it the active one.
    pub fn ingest(&mut self, document: Document) -> DocumentId {
        let id = DocumentId(self.documents.len());
        tracing::info!(id = id.0, topic = %document.topic, "Ingested document");
        self.documents.push(document);
        self.active = Some(id);
        id
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Documents with their ids, in upload order.
    pub fn iter(&self) -> impl Iterator<Item = (DocumentId, &Document)> {
        self.documents
            .iter()
            .enumerate()
            .map(|(index, doc)| (DocumentId(index), doc))
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    pub fn active(&self) -> Option<DocumentId> {
        self.active
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn compare_mode(&self) -> bool {
        self.compare_mode
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// First stored document whose topic contains `fragment`, ignoring case.
    /// A blank fragment matches nothing.
    pub fn find_by_topic(&self, fragment: &str) -> Option<&Document> {
        let fragment = fragment.trim().to_lowercase();
        if fragment.is_empty() {
            return None;
        }
        self.documents
            .iter()
            .find(|doc| doc.topic.to_lowercase().contains(&fragment))
    }

    /// Chooses the context for `question`, updating the active document and
    /// comparison mode when the question asks for a switch.
    ///
    /// Only a topic comparison that cannot be satisfied fails; every other
    /// path produces some context, possibly just the question itself.
    pub fn resolve_context(
        &mut self,
        question: &str,
        new_document_ingested: bool,
    ) -> Result<ResolvedContext, ResolveError> {
        match intent::parse_intent(question) {
            Intent::Compare {
                first_topic,
                second_topic,
            } => return self.compare_by_topic(first_topic, second_topic),
            Intent::SwitchTo(file) => self.switch_to(file),
            Intent::SetCompareMode => {
                tracing::debug!("Comparison mode enabled");
                self.compare_mode = true;
            }
            Intent::None => {}
        }

        if self.compare_mode && self.documents.len() >= 2 {
            return Ok(ResolvedContext::PairComparison(format!(
                "First File:\n{}\n\nSecond File:\n{}",
                self.documents[0].content, self.documents[1].content
            )));
        }

        if let Some(doc) = self.active_document() {
            return Ok(ResolvedContext::Document(doc.content.clone()));
        }

        match self.documents.last() {
            Some(latest) => Ok(ResolvedContext::Document(latest.content.clone())),
            None => {
                if new_document_ingested {
                    tracing::warn!("A document was reported as ingested but the store is empty");
                }
                Ok(ResolvedContext::General(question.to_string()))
            }
        }
    }

    fn compare_by_topic(
        &self,
        first_topic: String,
        second_topic: String,
    ) -> Result<ResolvedContext, ResolveError> {
        match (
            self.find_by_topic(&first_topic),
            self.find_by_topic(&second_topic),
        ) {
            (Some(first), Some(second)) => Ok(ResolvedContext::TopicComparison(format!(
                "File 1 (Topic: {}):\n{}\n\nFile 2 (Topic: {}):\n{}",
                first.topic, first.content, second.topic, second.content
            ))),
            _ => {
                tracing::info!(
                    first = %first_topic,
                    second = %second_topic,
                    "Comparison requested for topics without matching files"
                );
                Err(ResolveError::ComparisonUnavailable {
                    first: first_topic,
                    second: second_topic,
                })
            }
        }
    }

    // A missing file leaves no active document; resolution then falls back
    // to the latest upload.
    fn switch_to(&mut self, file: FileRef) {
        let index = file.index();
        self.active = (index < self.documents.len()).then_some(DocumentId(index));
        self.compare_mode = false;
        if self.active.is_none() {
            tracing::warn!(
                requested = index + 1,
                stored = self.documents.len(),
                "Switch requested to a file that was never uploaded"
            );
        }
    }
}
