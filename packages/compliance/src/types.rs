use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Listing copy submitted for a Fair Housing audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRequest {
    /// Free text to audit.
    pub text: String,
    /// Two-letter jurisdiction code (e.g. `AZ`).
    pub state: String,
    /// Brokerage name used for the `Listed by` sign-off.
    pub brokerage: String,
    /// Agency-specific rule text, passed to the model as data.
    pub rules: String,
    pub is_owner: bool,
}

/// Verdict of an audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    #[serde(alias = "pass", alias = "Pass")]
    Pass,
    #[serde(alias = "fail", alias = "Fail")]
    Fail,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Pass => "PASS",
            AuditStatus::Fail => "FAIL",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PASS" => Ok(AuditStatus::Pass),
            "FAIL" => Ok(AuditStatus::Fail),
            other => Err(format!("unknown audit status '{other}'")),
        }
    }
}

/// A phrase flagged by the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Violation {
    #[serde(default)]
    pub phrase: String,
    /// Protected-class category, e.g. "familial status".
    #[serde(default)]
    pub citation: String,
    #[serde(default)]
    pub reason: String,
}

/// Result returned to callers of the audit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditResult {
    pub status: AuditStatus,
    pub violations: Vec<Violation>,
    pub final_text: String,
}

impl AuditResult {
    /// Result used when the model output could not be parsed.
    pub fn unparsed(raw_text: impl Into<String>, status: AuditStatus) -> Self {
        Self {
            status,
            violations: Vec::new(),
            final_text: raw_text.into(),
        }
    }
}

/// Inputs for generating a listing description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingBrief {
    pub address: String,
    pub specs: String,
    pub features: String,
    pub tone: String,
}

/// Token usage reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
