use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GenerationParams;
use crate::error::Result;
use crate::extract::{extract_verdict, Extraction};
use crate::jurisdiction::JurisdictionRules;
use crate::model::{ModelInvoker, ModelRequest};
use crate::prompt;
use crate::types::{AuditRequest, AuditResult, AuditStatus, ListingBrief};

/// Listing audit: prompt, model call, verdict extraction, disclosures.
///
/// Holds no per-request state and can be shared across concurrent requests.
pub struct AuditPipeline {
    model: Arc<dyn ModelInvoker>,
    params: GenerationParams,
    unparsed_status: AuditStatus,
    rules: JurisdictionRules,
}

impl AuditPipeline {
    pub fn new(
        model: Arc<dyn ModelInvoker>,
        params: GenerationParams,
        unparsed_status: AuditStatus,
        rules: JurisdictionRules,
    ) -> Self {
        Self {
            model,
            params,
            unparsed_status,
            rules,
        }
    }

    pub fn rules(&self) -> &JurisdictionRules {
        &self.rules
    }

    /// Audit one listing. Only the model call can fail.
    ///
    /// When the model output holds no parseable verdict, the raw text is
    /// returned as `final_text` with the configured fallback status. With
    /// the default `PASS` fallback this is fail-open: unparsed output is
    /// reported as compliant.
    pub async fn run(&self, request: &AuditRequest) -> Result<AuditResult> {
        info!(jurisdiction = %request.state, is_owner = request.is_owner, "auditing listing");

        let prompt = prompt::build_audit_prompt(request);
        let model_request = ModelRequest::single_turn(prompt.system, prompt.user, self.params);

        let response = self.model.invoke(&model_request).await?;
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model responded"
        );

        let extraction = extract_verdict(&response.content);
        if let Extraction::Unparsed(_) = extraction {
            warn!(
                jurisdiction = %request.state,
                fallback_status = %self.unparsed_status,
                "model output had no parseable verdict, using fallback"
            );
        }

        let mut result = extraction.resolve(self.unparsed_status);
        let applied = self.rules.apply(&request.state, request.is_owner, &mut result);

        info!(
            status = %result.status,
            violations = result.violations.len(),
            disclosures = applied,
            "audit complete"
        );

        Ok(result)
    }
}

/// Generates listing descriptions.
pub struct ListingWriter {
    model: Arc<dyn ModelInvoker>,
    params: GenerationParams,
}

impl ListingWriter {
    pub fn new(model: Arc<dyn ModelInvoker>, params: GenerationParams) -> Self {
        Self { model, params }
    }

    pub async fn write(&self, brief: &ListingBrief) -> Result<String> {
        info!(tone = %brief.tone, "drafting listing copy");

        let prompt = prompt::build_listing_prompt(brief);
        let request = ModelRequest::single_turn(prompt.system, prompt.user, self.params);
        let response = self.model.invoke(&request).await?;

        Ok(response.content.trim().to_string())
    }
}
