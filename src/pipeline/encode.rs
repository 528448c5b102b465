//! Document encoding: raw bytes → base64 attachment for the model request.
//!
//! Multimodal APIs take inline documents as base64 in the JSON body together
//! with their media type. `edgequake-llm` carries any inline attachment as
//! [`ImageData`]; providers forward the declared media type unchanged, which
//! is how a PDF reaches Gemini as `application/pdf` inline data.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// Encode a document for the extraction request.
pub fn encode_document(data: &[u8], mime_type: &str) -> ImageData {
    let b64 = STANDARD.encode(data);
    debug!("Encoded {} → {} bytes base64", mime_type, b64.len());
    ImageData::new(b64, mime_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_pdf_bytes() {
        let raw = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n";
        let data = encode_document(raw, "application/pdf");
        assert_eq!(data.mime_type, "application/pdf");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(decoded, raw);
    }

    #[test]
    fn encode_empty() {
        let data = encode_document(&[], "application/pdf");
        assert!(data.data.is_empty());
    }
}
