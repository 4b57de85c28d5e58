use std::str::FromStr;
use std::time::Duration;

use crate::error::{ComplianceError, Result};
use crate::types::AuditStatus;

pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-3-5-sonnet-20241022-v2:0";
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// Which hosted endpoint serves model requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    Bedrock,
    Anthropic,
}

impl FromStr for ModelProvider {
    type Err = ComplianceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bedrock" => Ok(ModelProvider::Bedrock),
            "anthropic" => Ok(ModelProvider::Anthropic),
            other => Err(ComplianceError::Config(format!(
                "unknown MODEL_PROVIDER '{other}' (expected 'bedrock' or 'anthropic')"
            ))),
        }
    }
}

/// Sampling parameters for one kind of model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: u32,
    pub temperature: f64,
}

impl GenerationParams {
    /// Deterministic parameters for audits.
    pub const AUDIT: Self = Self {
        max_tokens: 2048,
        temperature: 0.0,
    };

    /// Parameters for listing copy.
    pub const DRAFT: Self = Self {
        max_tokens: 1000,
        temperature: 0.7,
    };
}

/// Configuration for model access and the audit policy.
///
/// NOTE: Do NOT derive `Debug` on this struct: `api_key` would be exposed.
#[derive(Clone)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    pub model_id: String,
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub timeout_secs: u64,
    pub audit: GenerationParams,
    pub draft: GenerationParams,
    /// Status reported when the model output contains no parseable verdict.
    pub unparsed_status: AuditStatus,
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.parse().ok())
}

impl ModelConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider = match lookup("MODEL_PROVIDER") {
            Some(v) => v.parse()?,
            None => ModelProvider::Bedrock,
        };

        let api_key = lookup("MODEL_API_KEY").filter(|k| !k.is_empty());
        if provider == ModelProvider::Anthropic && api_key.is_none() {
            return Err(ComplianceError::Config(
                "MODEL_API_KEY not set (required for MODEL_PROVIDER=anthropic)".into(),
            ));
        }

        let model_id = lookup("MODEL_ID").unwrap_or_else(|| DEFAULT_MODEL_ID.into());

        let api_base_url =
            lookup("MODEL_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let timeout_secs = parse_var(&lookup, "MODEL_TIMEOUT_SECS").unwrap_or(60);

        let audit = GenerationParams {
            max_tokens: parse_var(&lookup, "AUDIT_MAX_TOKENS")
                .unwrap_or(GenerationParams::AUDIT.max_tokens),
            temperature: parse_var(&lookup, "AUDIT_TEMPERATURE")
                .unwrap_or(GenerationParams::AUDIT.temperature),
        };

        let draft = GenerationParams {
            max_tokens: parse_var(&lookup, "DRAFT_MAX_TOKENS")
                .unwrap_or(GenerationParams::DRAFT.max_tokens),
            temperature: parse_var(&lookup, "DRAFT_TEMPERATURE")
                .unwrap_or(GenerationParams::DRAFT.temperature),
        };

        let unparsed_status = match lookup("AUDIT_UNPARSED_STATUS") {
            Some(v) => v.parse().map_err(ComplianceError::Config)?,
            None => AuditStatus::Pass,
        };

        Ok(Self {
            provider,
            model_id,
            api_key,
            api_base_url,
            timeout_secs,
            audit,
            draft,
            unparsed_status,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Create a config builder for testing.
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder {
            provider: ModelProvider::Bedrock,
            model_id: DEFAULT_MODEL_ID.into(),
            api_key: None,
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout_secs: 60,
            audit: GenerationParams::AUDIT,
            draft: GenerationParams::DRAFT,
            unparsed_status: AuditStatus::Pass,
        }
    }
}

/// Builder for constructing `ModelConfig` in tests.
pub struct ModelConfigBuilder {
    provider: ModelProvider,
    model_id: String,
    api_key: Option<String>,
    api_base_url: String,
    timeout_secs: u64,
    audit: GenerationParams,
    draft: GenerationParams,
    unparsed_status: AuditStatus,
}

impl ModelConfigBuilder {
    pub fn provider(mut self, provider: ModelProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn audit(mut self, audit: GenerationParams) -> Self {
        self.audit = audit;
        self
    }

    pub fn draft(mut self, draft: GenerationParams) -> Self {
        self.draft = draft;
        self
    }

    pub fn unparsed_status(mut self, status: AuditStatus) -> Self {
        self.unparsed_status = status;
        self
    }

    pub fn build(self) -> ModelConfig {
        ModelConfig {
            provider: self.provider,
            model_id: self.model_id,
            api_key: self.api_key,
            api_base_url: self.api_base_url,
            timeout_secs: self.timeout_secs,
            audit: self.audit,
            draft: self.draft,
            unparsed_status: self.unparsed_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_vars(vars: &[(&str, &str)]) -> Result<ModelConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ModelConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = from_vars(&[]).expect("config");
        assert_eq!(config.provider, ModelProvider::Bedrock);
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert_eq!(config.api_key, None);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.audit, GenerationParams::AUDIT);
        assert_eq!(config.draft, GenerationParams::DRAFT);
        assert_eq!(config.unparsed_status, AuditStatus::Pass);
    }

    #[test]
    fn unparsed_status_can_fail_closed() {
        let config = from_vars(&[("AUDIT_UNPARSED_STATUS", "FAIL")]).expect("config");
        assert_eq!(config.unparsed_status, AuditStatus::Fail);

        let config = from_vars(&[("AUDIT_UNPARSED_STATUS", " pass ")]).expect("config");
        assert_eq!(config.unparsed_status, AuditStatus::Pass);
    }

    #[test]
    fn invalid_unparsed_status_is_config_error() {
        let err = from_vars(&[("AUDIT_UNPARSED_STATUS", "MAYBE")])
            .err()
            .expect("should fail");
        assert!(matches!(err, ComplianceError::Config(ref msg) if msg.contains("MAYBE")));
    }

    #[test]
    fn anthropic_requires_api_key() {
        let err = from_vars(&[("MODEL_PROVIDER", "anthropic")])
            .err()
            .expect("should fail");
        assert!(matches!(err, ComplianceError::Config(ref msg) if msg.contains("MODEL_API_KEY")));

        let err = from_vars(&[("MODEL_PROVIDER", "anthropic"), ("MODEL_API_KEY", "")])
            .err()
            .expect("empty key should fail");
        assert!(matches!(err, ComplianceError::Config(_)));

        let config = from_vars(&[("MODEL_PROVIDER", "anthropic"), ("MODEL_API_KEY", "sk-test")])
            .expect("config");
        assert_eq!(config.provider, ModelProvider::Anthropic);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn unknown_provider_is_config_error() {
        let err = from_vars(&[("MODEL_PROVIDER", "openai")])
            .err()
            .expect("should fail");
        assert!(matches!(err, ComplianceError::Config(_)));
    }

    #[test]
    fn numeric_overrides_and_bad_values() {
        let config = from_vars(&[
            ("MODEL_TIMEOUT_SECS", "15"),
            ("AUDIT_MAX_TOKENS", "4096"),
            ("DRAFT_TEMPERATURE", "not-a-number"),
        ])
        .expect("config");
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.audit.max_tokens, 4096);
        assert_eq!(config.draft.temperature, GenerationParams::DRAFT.temperature);
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("Bedrock".parse::<ModelProvider>().ok(), Some(ModelProvider::Bedrock));
        assert_eq!(
            " anthropic ".parse::<ModelProvider>().ok(),
            Some(ModelProvider::Anthropic)
        );
        assert!("openai".parse::<ModelProvider>().is_err());
    }

    #[test]
    fn builder_defaults_match_audit_contract() {
        let config = ModelConfig::builder().build();
        assert_eq!(config.audit.temperature, 0.0);
        assert_eq!(config.audit.max_tokens, 2048);
        assert_eq!(config.draft.max_tokens, 1000);
        assert_eq!(config.unparsed_status, AuditStatus::Pass);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }
}
