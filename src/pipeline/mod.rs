//! Pipeline stages for paper analysis.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and the network-facing ones can be replaced by fakes.
//!
//! ## Data Flow
//!
//! ```text
//! acquire ──▶ (fetch ──▶ normalize) ──▶ llm ──▶ decode
//! (PDF/text/PMC)  (E-utilities, XML→text)  (model)  (JSON→result)
//! ```
//!
//! 1. [`acquire`]   — validate the request and produce one payload
//! 2. [`fetch`]     — PMC transport behind the [`fetch::RecordSource`] trait
//! 3. [`normalize`] — JATS XML to whitespace-collapsed prose
//! 4. [`encode`]    — base64-wrap binary documents for the model request
//! 5. [`llm`]       — one model call behind [`llm::CompletionService`]
//! 6. [`decode`]    — strip fences, validate against the schema, type the result

pub mod acquire;
pub mod decode;
pub mod encode;
pub mod fetch;
pub mod llm;
pub mod normalize;
