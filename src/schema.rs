//! The output schema the extraction model must honour.
//!
//! [`ANALYSIS_SCHEMA`] is the only description of the result shape. The
//! prompt embeds [`render_schema`] of it and the response decoder validates
//! model output with [`validate`] against the same table, so the two cannot
//! drift apart. The typed mirror is [`crate::output::AnalysisResult`]; a test
//! below keeps the field names of both in sync.

use serde_json::Value;

/// Sentinel for `location_constraint` when findings are not location-bound.
pub const NO_LOCATION_CONSTRAINT: &str = "No location constraint";

/// Sentinel for a challenge that can be taken on from anywhere.
pub const ANYWHERE: &str = "Anywhere";

/// Number of challenges requested from the model.
pub const CHALLENGE_COUNT: usize = 3;

/// JSON type expected for one field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    /// A string, or `null` when the model could not find the value.
    /// An absent key is read as `null`.
    NullableText,
    /// A required string.
    Text,
    /// A required integer in 1–17.
    Sdg,
    /// An array of integers in 1–17 (may be empty).
    SdgList,
    /// A nested object.
    Object(&'static [Field]),
    /// An array of objects; `len` is requested in the prompt, not enforced.
    ObjectList {
        fields: &'static [Field],
        len: usize,
    },
}

/// One field of the schema, with the hint shown to the model.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub ty: FieldType,
    pub hint: &'static str,
}

const fn field(name: &'static str, ty: FieldType, hint: &'static str) -> Field {
    Field { name, ty, hint }
}

const LESSON_FIELDS: &[Field] = &[
    field(
        "title",
        FieldType::Text,
        "a readable, engaging title for the key lesson",
    ),
    field(
        "main_summary",
        FieldType::Text,
        "what the paper is saying, explained simply",
    ),
    field(
        "why_it_matters",
        FieldType::Text,
        "why this matters in the real world",
    ),
];

const CHALLENGE_FIELDS: &[Field] = &[
    field(
        "title",
        FieldType::Text,
        "short, action-oriented challenge title",
    ),
    field(
        "description",
        FieldType::Text,
        "a concrete action a student or citizen could take, inspired by the paper's findings",
    ),
    field(
        "location",
        FieldType::Text,
        "\"Anywhere\" if it can be done from any place, otherwise the specific place it applies to",
    ),
];

/// The complete result schema, in prompt order.
pub const ANALYSIS_SCHEMA: &[Field] = &[
    field(
        "authors",
        FieldType::NullableText,
        "comma-separated list of author names, or null if not found",
    ),
    field(
        "date_published",
        FieldType::NullableText,
        "publication date as found in the paper, e.g. '2023', 'March 2024', '2024-01-15', or null if not found",
    ),
    field(
        "journal",
        FieldType::NullableText,
        "journal or conference name, or null if not found",
    ),
    field(
        "location_constraint",
        FieldType::Text,
        "the specific country, region or place the findings are bound to, or \"No location constraint\"",
    ),
    field("sdg_primary", FieldType::Sdg, "number 1-17"),
    field("sdg_secondary", FieldType::SdgList, "number 1-17"),
    field(
        "summary",
        FieldType::Text,
        "plain-language summary of the paper in 2-3 sentences",
    ),
    field("lesson", FieldType::Object(LESSON_FIELDS), ""),
    field(
        "challenges",
        FieldType::ObjectList {
            fields: CHALLENGE_FIELDS,
            len: CHALLENGE_COUNT,
        },
        "",
    ),
];

// ── Rendering ────────────────────────────────────────────────────────────

/// Render `fields` as the JSON-like template embedded in the prompt.
pub fn render_schema(fields: &[Field]) -> String {
    let mut out = String::with_capacity(1024);
    render_object(fields, 0, &mut out);
    out
}

fn render_object(fields: &[Field], depth: usize, out: &mut String) {
    let pad = "  ".repeat(depth + 1);
    out.push_str("{\n");
    for (i, f) in fields.iter().enumerate() {
        out.push_str(&pad);
        out.push('"');
        out.push_str(f.name);
        out.push_str("\": ");
        render_value(f, depth + 1, out);
        if i + 1 < fields.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str(&"  ".repeat(depth));
    out.push('}');
}

fn render_value(f: &Field, depth: usize, out: &mut String) {
    match f.ty {
        FieldType::NullableText | FieldType::Text => {
            out.push_str(&format!("\"<{}>\"", f.hint));
        }
        FieldType::Sdg => out.push_str(&format!("<{}>", f.hint)),
        FieldType::SdgList => out.push_str(&format!("[<{}>, ...]", f.hint)),
        FieldType::Object(sub) => render_object(sub, depth, out),
        FieldType::ObjectList { fields, .. } => {
            let pad = "  ".repeat(depth + 1);
            out.push_str("[\n");
            out.push_str(&pad);
            render_object(fields, depth + 1, out);
            out.push('\n');
            out.push_str(&"  ".repeat(depth));
            out.push(']');
        }
    }
}

/// Extra constraints that the JSON template alone cannot express.
pub fn constraint_notes(fields: &[Field]) -> Vec<String> {
    let mut notes = Vec::new();
    for f in fields {
        match f.ty {
            FieldType::ObjectList { len, .. } => notes.push(format!(
                "\"{}\" must contain exactly {} items.",
                f.name, len
            )),
            FieldType::Sdg => notes.push(format!(
                "\"{}\" must be a single integer between 1 and 17.",
                f.name
            )),
            _ => {}
        }
    }
    notes
}

// ── Validation ───────────────────────────────────────────────────────────

/// Check `value` against `fields`, returning every violation found.
///
/// An empty vector means the value has the expected shape. Unknown keys are
/// ignored.
pub fn validate(value: &Value, fields: &[Field]) -> Vec<String> {
    let mut violations = Vec::new();
    validate_object(value, fields, "", &mut violations);
    violations
}

fn validate_object(value: &Value, fields: &[Field], path: &str, out: &mut Vec<String>) {
    let Some(map) = value.as_object() else {
        let at = if path.is_empty() { "root" } else { path };
        out.push(format!("{at}: expected object, got {}", json_type(value)));
        return;
    };

    for f in fields {
        let at = if path.is_empty() {
            f.name.to_string()
        } else {
            format!("{path}.{}", f.name)
        };
        match map.get(f.name) {
            None if matches!(f.ty, FieldType::NullableText) => {}
            None => out.push(format!("{at}: missing")),
            Some(v) => validate_field(v, f.ty, &at, out),
        }
    }
}

fn validate_field(v: &Value, ty: FieldType, at: &str, out: &mut Vec<String>) {
    match ty {
        FieldType::NullableText => {
            if !(v.is_null() || v.is_string()) {
                out.push(format!("{at}: expected string or null, got {}", json_type(v)));
            }
        }
        FieldType::Text => {
            if !v.is_string() {
                out.push(format!("{at}: expected string, got {}", json_type(v)));
            }
        }
        FieldType::Sdg => check_sdg(v, at, out),
        FieldType::SdgList => match v.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    check_sdg(item, &format!("{at}[{i}]"), out);
                }
            }
            None => out.push(format!("{at}: expected array, got {}", json_type(v))),
        },
        FieldType::Object(sub) => validate_object(v, sub, at, out),
        FieldType::ObjectList { fields, .. } => match v.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_object(item, fields, &format!("{at}[{i}]"), out);
                }
            }
            None => out.push(format!("{at}: expected array, got {}", json_type(v))),
        },
    }
}

fn check_sdg(v: &Value, at: &str, out: &mut Vec<String>) {
    match v.as_i64() {
        Some(n) if crate::sdg::is_valid(n) => {}
        Some(n) => out.push(format!("{at}: SDG {n} is outside 1-17")),
        None => out.push(format!("{at}: expected integer 1-17, got {}", json_type(v))),
    }
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::AnalysisResult;
    use serde_json::json;

    fn valid_value() -> Value {
        json!({
            "authors": "A. Author, B. Author",
            "date_published": null,
            "journal": "The Lancet",
            "location_constraint": NO_LOCATION_CONSTRAINT,
            "sdg_primary": 3,
            "sdg_secondary": [6, 13],
            "summary": "A summary.",
            "lesson": {
                "title": "Lesson",
                "main_summary": "Main",
                "why_it_matters": "Why"
            },
            "challenges": [
                { "title": "One", "description": "d1", "location": ANYWHERE },
                { "title": "Two", "description": "d2", "location": "Kenya" },
                { "title": "Three", "description": "d3", "location": ANYWHERE }
            ]
        })
    }

    #[test]
    fn rendered_schema_names_every_field() {
        let text = render_schema(ANALYSIS_SCHEMA);
        for name in [
            "authors",
            "date_published",
            "journal",
            "location_constraint",
            "sdg_primary",
            "sdg_secondary",
            "summary",
            "lesson",
            "main_summary",
            "why_it_matters",
            "challenges",
            "description",
            "location",
        ] {
            assert!(text.contains(&format!("\"{name}\":")), "missing {name}");
        }
        assert!(text.contains("\"sdg_primary\": <number 1-17>,"));
        assert!(text.contains("\"sdg_secondary\": [<number 1-17>, ...],"));
        assert!(text.starts_with("{\n") && text.ends_with("\n}"));
    }

    #[test]
    fn rendered_schema_mentions_sentinels() {
        let text = render_schema(ANALYSIS_SCHEMA);
        assert!(text.contains(NO_LOCATION_CONSTRAINT));
        assert!(text.contains(ANYWHERE));
        assert!(text.contains("or null if not found"));
    }

    #[test]
    fn constraint_notes_cover_challenge_count() {
        let notes = constraint_notes(ANALYSIS_SCHEMA);
        assert!(notes
            .iter()
            .any(|n| n == "\"challenges\" must contain exactly 3 items."));
    }

    #[test]
    fn valid_value_has_no_violations() {
        assert!(validate(&valid_value(), ANALYSIS_SCHEMA).is_empty());
    }

    #[test]
    fn violations_are_collected_not_short_circuited() {
        let mut v = valid_value();
        v["sdg_primary"] = json!(18);
        v["sdg_secondary"] = json!([2, "x"]);
        v["lesson"]["title"] = json!(7);
        v.as_object_mut().unwrap().remove("summary");
        v["challenges"][1] = json!("not an object");

        let violations = validate(&v, ANALYSIS_SCHEMA);
        assert_eq!(violations.len(), 5, "{violations:?}");
        assert!(violations.contains(&"sdg_primary: SDG 18 is outside 1-17".to_string()));
        assert!(violations
            .contains(&"sdg_secondary[1]: expected integer 1-17, got string".to_string()));
        assert!(violations.contains(&"lesson.title: expected string, got integer".to_string()));
        assert!(violations.contains(&"summary: missing".to_string()));
        assert!(violations
            .contains(&"challenges[1]: expected object, got string".to_string()));
    }

    #[test]
    fn absent_nullable_field_reads_as_null() {
        let mut v = valid_value();
        v.as_object_mut().unwrap().remove("journal");
        assert!(validate(&v, ANALYSIS_SCHEMA).is_empty());
    }

    #[test]
    fn fractional_sdg_is_rejected() {
        let mut v = valid_value();
        v["sdg_primary"] = json!(3.5);
        let violations = validate(&v, ANALYSIS_SCHEMA);
        assert_eq!(
            violations,
            vec!["sdg_primary: expected integer 1-17, got number".to_string()]
        );
    }

    #[test]
    fn non_object_root() {
        assert_eq!(
            validate(&json!([1, 2]), ANALYSIS_SCHEMA),
            vec!["root: expected object, got array".to_string()]
        );
    }

    #[test]
    fn schema_and_typed_result_agree() {
        let typed: AnalysisResult = serde_json::from_value(valid_value()).unwrap();
        let back = serde_json::to_value(&typed).unwrap();
        let keys: Vec<&str> = back.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        let mut schema_keys: Vec<&str> = ANALYSIS_SCHEMA.iter().map(|f| f.name).collect();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        schema_keys.sort_unstable();
        assert_eq!(keys_sorted, schema_keys);
    }
}
