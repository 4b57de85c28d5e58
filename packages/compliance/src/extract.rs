//! Tolerant extraction of the audit verdict from model output.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::types::{AuditResult, AuditStatus, Violation};

/// Verdict as written by the model. Keys are read leniently: a missing,
/// null or mistyped value takes its default, and an unrecognized status
/// stays `None` so the caller picks the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelVerdict {
    pub status: Option<AuditStatus>,
    pub violations: Vec<Violation>,
    pub final_text: String,
}

impl ModelVerdict {
    /// Read a verdict from a JSON object.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let status = object
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| AuditStatus::from_str(s).ok());
        let violations = match object.get("violations") {
            Some(Value::Array(items)) => items.iter().map(violation_from_value).collect(),
            _ => Vec::new(),
        };
        Self {
            status,
            violations,
            final_text: text_field(object.get("final_text")),
        }
    }

    /// Convert into a result, using `default_status` when none was given.
    pub fn into_result(self, default_status: AuditStatus) -> AuditResult {
        AuditResult {
            status: self.status.unwrap_or(default_status),
            violations: self.violations,
            final_text: self.final_text,
        }
    }
}

fn violation_from_value(value: &Value) -> Violation {
    match value {
        Value::Object(fields) => Violation {
            phrase: text_field(fields.get("phrase")),
            citation: text_field(fields.get("citation")),
            reason: text_field(fields.get("reason")),
        },
        // A bare string is taken as the flagged phrase.
        Value::String(phrase) => Violation {
            phrase: phrase.clone(),
            ..Violation::default()
        },
        _ => Violation::default(),
    }
}

/// Strings pass through, null and absent become empty, and any other
/// value is kept in its JSON form.
fn text_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Outcome of extracting a verdict from raw model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Extracted(ModelVerdict),
    /// No parseable JSON object; carries the raw text unchanged.
    Unparsed(String),
}

impl Extraction {
    pub fn is_extracted(&self) -> bool {
        matches!(self, Extraction::Extracted(_))
    }

    /// Resolve to a result. `fallback` is the status for unparsed output
    /// and for verdicts without a status.
    pub fn resolve(self, fallback: AuditStatus) -> AuditResult {
        match self {
            Extraction::Extracted(verdict) => verdict.into_result(fallback),
            Extraction::Unparsed(raw) => AuditResult::unparsed(raw, fallback),
        }
    }
}

/// Span from the first `{` to the last `}`, inclusive.
pub fn json_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Extract the verdict object embedded in `raw`, tolerating surrounding
/// prose and markdown fences. Any JSON object in the span counts as a
/// verdict, however loosely its keys are typed.
pub fn extract_verdict(raw: &str) -> Extraction {
    let Some(span) = json_span(raw) else {
        return Extraction::Unparsed(raw.to_string());
    };
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Extraction::Extracted(ModelVerdict::from_object(&object)),
        Ok(_) => Extraction::Unparsed(raw.to_string()),
        Err(e) => {
            tracing::debug!(error = %e, "model output JSON did not parse");
            Extraction::Unparsed(raw.to_string())
        }
    }
}
