//! Fair Housing compliance core for listing copy.
//!
//! An audit renders a prompt, calls the model through [`ModelInvoker`],
//! extracts the JSON verdict from the reply and applies jurisdiction
//! disclosure rules.

pub mod config;
pub mod error;
pub mod extract;
pub mod jurisdiction;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod types;

pub use config::{GenerationParams, ModelConfig, ModelProvider};
pub use error::{ComplianceError, Result};
pub use extract::{extract_verdict, Extraction, ModelVerdict};
pub use jurisdiction::{DisclosureRule, JurisdictionRules, RuleCondition};
#[cfg(any(test, feature = "test-utils"))]
pub use model::test_support::MockModelInvoker;
pub use model::{AnthropicClient, Message, ModelInvoker, ModelRequest, ModelResponse, Role};
pub use pipeline::{AuditPipeline, ListingWriter};
pub use types::{AuditRequest, AuditResult, AuditStatus, ListingBrief, TokenUsage, Violation};
