//! Instruction prompt for paper analysis.
//!
//! The prompt is a pure function of the input modality and the optional
//! title. The output schema it embeds is rendered from
//! [`crate::schema::ANALYSIS_SCHEMA`], which is also what the response
//! decoder validates against.
//!
//! For text input the paper itself is not part of [`build_prompt`]; the
//! orchestrator appends it with [`with_paper_text`].

use crate::schema::{constraint_notes, render_schema, ANALYSIS_SCHEMA};

/// How the paper reaches the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModality {
    /// The PDF is attached to the request as a document.
    Binary,
    /// The paper text follows the instructions.
    Text,
}

const PREAMBLE: &str = "You are a research intelligence assistant.";

const BINARY_INSTRUCTION: &str = "The research paper PDF is attached. Analyze the full paper.";

const TEXT_INSTRUCTION: &str = "Analyze the following research paper text.";

const TASKS: &str = r#"Your tasks:
1. Extract the author(s), publication date, and journal name (if available).
2. Identify what problem the paper studies.
3. What it finds or concludes.
4. Why it matters in the real world.
5. Which UN Sustainable Development Goal(s) it most closely relates to (use SDG numbers 1–17).
6. Whether the findings only apply to a specific country, region or place.
7. Propose exactly 3 actionable challenges inspired by the findings that an ordinary person could take on."#;

const OUTPUT_RULE: &str =
    "Return ONLY valid JSON matching this exact schema — no markdown, no code fences, no extra text:";

/// Build the instruction prompt.
///
/// Identical inputs always produce byte-identical output. A title only adds
/// a `Title: …` line; the rest of the wording is unchanged.
pub fn build_prompt(modality: InputModality, title: Option<&str>) -> String {
    let instruction = match modality {
        InputModality::Binary => BINARY_INSTRUCTION,
        InputModality::Text => TEXT_INSTRUCTION,
    };
    let paper_ref = match title {
        Some(t) => format!("Title: {t}\n"),
        None => String::new(),
    };

    let mut prompt = format!("{PREAMBLE} {instruction}\n\n{paper_ref}{TASKS}\n\n{OUTPUT_RULE}\n\n");
    prompt.push_str(&render_schema(ANALYSIS_SCHEMA));

    let notes = constraint_notes(ANALYSIS_SCHEMA);
    if !notes.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&notes.join("\n"));
    }
    prompt
}

/// Append the paper text to a text-modality prompt, separated by a blank line.
pub fn with_paper_text(prompt: &str, text: &str) -> String {
    format!("{prompt}\n\n{text}")
}
