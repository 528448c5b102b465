//! Source acquisition: turn an uploaded PDF, pasted text or a PMC id into a
//! single [`NormalizedPayload`].
//!
//! The three input kinds are variants of one [`PaperSource`] enum with a
//! single [`PaperSource::acquire`] entry point, so the orchestrator never
//! branches on input kind itself. Every size and length bound is enforced
//! here, before the model is called.

use crate::error::AnalysisError;
use crate::pipeline::fetch::{PmcId, RecordSource};
use crate::pipeline::normalize::extract_text_from_xml;
use crate::prompts::InputModality;
use tracing::{debug, info, warn};

/// Largest accepted PDF upload: 20 MiB.
pub const MAX_PDF_BYTES: usize = 20 * 1024 * 1024;

/// Only this declared media type is accepted for uploads.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Remote text shorter than this (in characters) is treated as "no full text".
pub const MIN_REMOTE_CHARS: usize = 100;

/// Remote text longer than this (in characters) is truncated.
pub const MAX_REMOTE_CHARS: usize = 100_000;

/// Appended after truncated remote text.
pub const TRUNCATION_MARKER: &str = "\n\n[Text truncated]";

const NO_CONTENT: &str = "Please provide a PDF file or paste paper text.";

/// An uploaded file as received from the caller.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub filename: String,
    /// Media type declared by the client, not sniffed.
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Where the paper comes from.
#[derive(Debug, Clone)]
pub enum PaperSource {
    Pdf(PdfUpload),
    PastedText(String),
    /// Unvalidated identifier; checked during acquisition.
    RemoteRecord(String),
}

/// One analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub source: PaperSource,
    pub title: Option<String>,
}

impl AnalysisRequest {
    pub fn pdf(upload: PdfUpload) -> Self {
        Self {
            source: PaperSource::Pdf(upload),
            title: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            source: PaperSource::PastedText(text.into()),
            title: None,
        }
    }

    pub fn remote(pmcid: impl Into<String>) -> Self {
        Self {
            source: PaperSource::RemoteRecord(pmcid.into()),
            title: None,
        }
    }

    /// Attach a known title. Blank titles are dropped.
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    /// Build a request from upload-form fields.
    ///
    /// A file takes precedence over text. Text is trimmed and counts as
    /// absent when empty; with neither present the request is rejected.
    pub fn from_form(
        file: Option<PdfUpload>,
        text: Option<String>,
        title: Option<String>,
    ) -> Result<Self, AnalysisError> {
        let text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let request = match (file, text) {
            (Some(upload), _) => Self::pdf(upload),
            (None, Some(text)) => Self::text(text),
            (None, None) => return Err(AnalysisError::invalid_input(NO_CONTENT)),
        };
        Ok(request.with_title(title))
    }
}

/// Kind of payload handed to the extraction model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Binary,
    Text,
}

/// Acquired paper content, ready for the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedPayload {
    Binary { data: Vec<u8>, mime_type: String },
    Text(String),
}

impl NormalizedPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            NormalizedPayload::Binary { .. } => PayloadKind::Binary,
            NormalizedPayload::Text(_) => PayloadKind::Text,
        }
    }

    pub fn modality(&self) -> InputModality {
        match self.kind() {
            PayloadKind::Binary => InputModality::Binary,
            PayloadKind::Text => InputModality::Text,
        }
    }
}

impl PaperSource {
    /// Check everything that can be checked without I/O.
    ///
    /// [`acquire`](Self::acquire) runs this first; it is exposed so callers
    /// can reject bad input before doing anything else.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        match self {
            PaperSource::Pdf(upload) => validate_pdf(upload),
            PaperSource::PastedText(text) => {
                if text.trim().is_empty() {
                    Err(AnalysisError::invalid_input(NO_CONTENT))
                } else {
                    Ok(())
                }
            }
            PaperSource::RemoteRecord(id) => PmcId::parse(id).map(|_| ()),
        }
    }

    /// Produce the payload for this source.
    ///
    /// Only [`PaperSource::RemoteRecord`] touches `records`, and only after
    /// the identifier has been validated.
    pub async fn acquire(
        &self,
        records: &dyn RecordSource,
    ) -> Result<NormalizedPayload, AnalysisError> {
        self.validate()?;
        match self {
            PaperSource::Pdf(upload) => {
                debug!("Accepted PDF '{}' ({} bytes)", upload.filename, upload.data.len());
                if !upload.data.starts_with(b"%PDF") {
                    warn!("'{}' is declared as PDF but lacks the %PDF header", upload.filename);
                }
                Ok(NormalizedPayload::Binary {
                    data: upload.data.clone(),
                    mime_type: PDF_MIME_TYPE.to_string(),
                })
            }
            PaperSource::PastedText(text) => {
                Ok(NormalizedPayload::Text(text.trim().to_string()))
            }
            PaperSource::RemoteRecord(raw) => {
                let id = PmcId::parse(raw)?;
                let xml = records.fetch_full_text(&id).await?;
                let text = bound_remote_text(&id, extract_text_from_xml(&xml))?;
                Ok(NormalizedPayload::Text(text))
            }
        }
    }
}

fn validate_pdf(upload: &PdfUpload) -> Result<(), AnalysisError> {
    if upload.content_type != PDF_MIME_TYPE {
        return Err(AnalysisError::invalid_input("Only PDF files are accepted."));
    }
    if upload.data.len() > MAX_PDF_BYTES {
        return Err(AnalysisError::invalid_input("PDF must be under 20 MB."));
    }
    Ok(())
}

/// Enforce the minimum and maximum remote text length.
///
/// Lengths are in characters, so truncation never splits a code point.
fn bound_remote_text(id: &PmcId, text: String) -> Result<String, AnalysisError> {
    let chars = text.chars().count();
    if chars < MIN_REMOTE_CHARS {
        return Err(AnalysisError::InsufficientContent {
            pmcid: id.to_string(),
            chars,
        });
    }
    if chars <= MAX_REMOTE_CHARS {
        return Ok(text);
    }

    info!("{}: truncating {} characters to {}", id, chars, MAX_REMOTE_CHARS);
    let cut = text
        .char_indices()
        .nth(MAX_REMOTE_CHARS)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
    truncated.push_str(&text[..cut]);
    truncated.push_str(TRUNCATION_MARKER);
    Ok(truncated)
}
