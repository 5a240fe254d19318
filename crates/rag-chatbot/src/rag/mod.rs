//! Question answering: scope classification, retrieval, generation and validation

pub mod context;
pub mod engine;
pub mod json;
pub mod prompt;
pub mod scope;
pub mod trace;
pub mod validate;

pub use engine::{AnswerPayload, RagEngine};
pub use json::{parse_json_loose, LooseJsonError};
pub use prompt::{PromptBuilder, FIXED_MSG, NO_DOC_MSG, NO_INDEX_MSG, NO_WEB_MSG};
pub use scope::{ScopeClassifier, ScopeLabel, ScopeVerdict};
pub use trace::{Decision, DecisionRecord, Failover, Stage};
pub use validate::{rule_validate, AnswerValidator};
