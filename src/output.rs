//! Output types returned by the analysis pipeline.
//!
//! [`AnalysisResult`] is only ever constructed by
//! [`crate::pipeline::decode::decode_response`] after the model's reply has
//! been validated against [`crate::schema::ANALYSIS_SCHEMA`]. Field names are
//! the wire names: serialising a result yields the same JSON the model was
//! asked to produce.

use crate::schema::{ANYWHERE, NO_LOCATION_CONSTRAINT};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Structured summary of one paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub authors: Option<String>,
    pub date_published: Option<String>,
    pub journal: Option<String>,
    /// A specific place, or [`NO_LOCATION_CONSTRAINT`].
    pub location_constraint: String,
    pub sdg_primary: u8,
    /// Kept exactly as the model returned it; may repeat `sdg_primary`.
    pub sdg_secondary: Vec<u8>,
    pub summary: String,
    pub lesson: Lesson,
    /// Three challenges are requested; the count is not re-validated.
    pub challenges: Vec<Challenge>,
}

/// The plain-language lesson drawn from the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    pub main_summary: String,
    pub why_it_matters: String,
}

/// An actionable challenge inspired by the paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub title: String,
    pub description: String,
    /// A specific place, or [`ANYWHERE`].
    pub location: String,
}

impl Challenge {
    pub fn is_anywhere(&self) -> bool {
        self.location.trim().eq_ignore_ascii_case(ANYWHERE)
    }
}

impl AnalysisResult {
    /// True when the findings are tied to a specific place.
    pub fn is_location_bound(&self) -> bool {
        !self
            .location_constraint
            .trim()
            .eq_ignore_ascii_case(NO_LOCATION_CONSTRAINT)
    }

    /// Primary goal followed by the secondary goals, in the order given.
    pub fn all_sdgs(&self) -> Vec<u8> {
        std::iter::once(self.sdg_primary)
            .chain(self.sdg_secondary.iter().copied())
            .collect()
    }

    /// Human-readable rendering used by the CLI.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".into());

        let _ = writeln!(out, "{}", self.lesson.title);
        let _ = writeln!(out, "{}", "=".repeat(self.lesson.title.chars().count()));
        let _ = writeln!(out);
        let _ = writeln!(out, "Authors:   {}", or_unknown(&self.authors));
        let _ = writeln!(out, "Journal:   {}", or_unknown(&self.journal));
        let _ = writeln!(out, "Published: {}", or_unknown(&self.date_published));
        let _ = writeln!(out, "Location:  {}", self.location_constraint);
        let _ = writeln!(out, "Primary:   {}", sdg_badge(self.sdg_primary));
        if !self.sdg_secondary.is_empty() {
            let secondary: Vec<String> = self.sdg_secondary.iter().map(|&s| sdg_badge(s)).collect();
            let _ = writeln!(out, "Secondary: {}", secondary.join(", "));
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Summary");
        let _ = writeln!(out, "  {}", self.summary);
        let _ = writeln!(out);
        let _ = writeln!(out, "What the paper says");
        let _ = writeln!(out, "  {}", self.lesson.main_summary);
        let _ = writeln!(out);
        let _ = writeln!(out, "Why it matters");
        let _ = writeln!(out, "  {}", self.lesson.why_it_matters);

        if !self.challenges.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Challenges");
            for (i, c) in self.challenges.iter().enumerate() {
                let _ = writeln!(out, "  {}. {} [{}]", i + 1, c.title, c.location);
                let _ = writeln!(out, "     {}", c.description);
            }
        }
        out
    }
}

fn sdg_badge(n: u8) -> String {
    match crate::sdg::label(n) {
        Some(label) => format!("SDG {n} — {label}"),
        None => format!("SDG {n}"),
    }
}

/// One search hit from PubMed Central.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PmcSummary {
    pub pmcid: String,
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub date: String,
}
