use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocLoaderError {
    #[error("PDF extraction failed for '{file}': {message}")]
    Pdf { file: String, message: String },
}

/// An uploaded document: its extracted text plus the inferred topic label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub topic: String,
    pub content: String,
}

impl Document {
    /// Topics are always stored lowercased so lookups can be case-insensitive.
    pub fn new(topic: impl AsRef<str>, content: impl Into<String>) -> Self {
        Self {
            topic: topic.as_ref().to_lowercase(),
            content: content.into(),
        }
    }
}

/// A file as delivered by the upload layer, before any text extraction.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: Option<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    /// Trusts the declared MIME type first, then falls back to the file extension.
    pub fn is_pdf(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            if mime.eq_ignore_ascii_case("application/pdf") {
                return true;
            }
        }
        self.file_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
    }

    fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Extracts the plain text of an upload. PDFs go through `pdf-extract`,
/// everything else is decoded as UTF-8.
pub fn extract_text(upload: &Upload) -> Result<String, DocLoaderError> {
    if upload.is_pdf() {
        let raw = pdf_extract::extract_text_from_mem(&upload.bytes).map_err(|e| {
            DocLoaderError::Pdf {
                file: upload.display_name().to_string(),
                message: e.to_string(),
            }
        })?;
        let text = clean_pdf_text(&raw);
        tracing::debug!(
            file = upload.display_name(),
            chars = text.chars().count(),
            "Extracted text from PDF"
        );
        Ok(text)
    } else {
        Ok(String::from_utf8_lossy(&upload.bytes).into_owned())
    }
}

/// Trims every line and collapses runs of blank lines left behind by PDF layout.
fn clean_pdf_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .fold(Vec::<&str>::new(), |mut acc, line| {
            if !line.is_empty() || acc.last().is_some_and(|prev| !prev.is_empty()) {
                acc.push(line);
            }
            acc
        })
        .join("\n")
        .trim()
        .to_string()
}
