// Export modules for use in the binary and tests
pub mod config;
pub mod doc_loader;
pub mod error;
pub mod http;
pub mod intent;
pub mod llm;
pub mod resolver;
pub mod server;

// Re-export commonly used types for convenience
pub use doc_loader::{Document, Upload};
pub use error::{Result, ServerError};
pub use llm::{LanguageModel, OpenAiModel};
pub use resolver::{FileContextResolver, ResolveError, ResolvedContext};
pub use server::DocQaServer;
