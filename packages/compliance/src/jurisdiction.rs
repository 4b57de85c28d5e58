//! Jurisdiction-specific disclosure rules applied to audited text.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ComplianceError, Result};
use crate::types::AuditResult;

/// When a disclosure rule applies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleCondition {
    Always,
    /// Only when the lister holds an ownership interest.
    OwnerOnly,
}

impl RuleCondition {
    fn holds(&self, is_owner: bool) -> bool {
        match self {
            RuleCondition::Always => true,
            RuleCondition::OwnerOnly => is_owner,
        }
    }
}

/// Appends `suffix` unless the text already contains `marker`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisclosureRule {
    pub condition: RuleCondition,
    pub marker: String,
    pub suffix: String,
}

impl DisclosureRule {
    /// Apply to `text`, returning whether it changed.
    pub fn apply(&self, is_owner: bool, text: &mut String) -> bool {
        if !self.condition.holds(is_owner) || text.contains(&self.marker) {
            return false;
        }
        text.push_str(&self.suffix);
        true
    }
}

/// Ordered disclosure rules per jurisdiction code. Codes match exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct JurisdictionRules {
    rules: BTreeMap<String, Vec<DisclosureRule>>,
}

impl Default for JurisdictionRules {
    /// Built-in table: Arizona owner/agent disclosure.
    fn default() -> Self {
        Self::empty().with_rule(
            "AZ",
            DisclosureRule {
                condition: RuleCondition::OwnerOnly,
                marker: "Owner/Agent".into(),
                suffix: " (Owner/Agent)".into(),
            },
        )
    }
}

impl JurisdictionRules {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// Append a rule to a jurisdiction's list.
    pub fn with_rule(mut self, code: impl Into<String>, rule: DisclosureRule) -> Self {
        self.rules.entry(code.into()).or_default().push(rule);
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml).map_err(|e| ComplianceError::InvalidRules(e.to_string()))
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn rules_for(&self, code: &str) -> &[DisclosureRule] {
        self.rules.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn jurisdictions(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Apply every rule for `code` in order. Returns how many fired.
    pub fn apply(&self, code: &str, is_owner: bool, result: &mut AuditResult) -> usize {
        self.rules_for(code)
            .iter()
            .filter(|rule| rule.apply(is_owner, &mut result.final_text))
            .count()
    }
}
