//! Per-request pipeline trace and structured decision logs

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{DocHit, WebHit};

use super::scope::{ScopeRaw, ScopeVerdict};

/// Version of the trace and decision-log records
pub const SCHEMA_VERSION: u32 = 1;

/// Named millisecond timings (`retrieval_ms_doc`, `llm_ms`, `total_ms`, ...)
pub type Timing = BTreeMap<&'static str, u64>;

/// Pipeline stage at which a decision record is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ScopeChecked,
    EarlyReject,
    Generated,
    Validated,
    Done,
}

/// Outcome recorded with a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    RejectScope,
    RejectValidate,
    Accept,
}

/// Fallback applied in hybrid mode when one side had no hits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failover {
    DocToWeb,
    WebToDoc,
}

impl Failover {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DocToWeb => "doc→web",
            Self::WebToDoc => "web→doc",
        }
    }

    /// `doc→web` when only web hits exist, `web→doc` when only doc hits exist
    pub fn detect(doc_hits: usize, web_hits: usize) -> Option<Self> {
        match (doc_hits, web_hits) {
            (0, w) if w > 0 => Some(Self::DocToWeb),
            (d, 0) if d > 0 => Some(Self::WebToDoc),
            _ => None,
        }
    }
}

impl Serialize for Failover {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Rule and LLM validator findings
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidatorReport {
    pub rule: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm: Option<Vec<String>>,
}

/// Settings the request ran with
#[derive(Debug, Clone, Serialize)]
pub struct TraceParams {
    pub mode: String,
    pub top_k: usize,
    pub threshold: f32,
    pub embed_model: String,
    pub llm_model: String,
}

/// Intermediate results collected while answering
#[derive(Debug, Clone, Default)]
pub struct Steps {
    pub scope: Option<ScopeVerdict>,
    pub scope_raw: Option<ScopeRaw>,
    pub doc_hits: Vec<DocHit>,
    pub web_hits: Vec<WebHit>,
    pub context_preview_doc: Vec<String>,
    pub context_preview_web: Vec<String>,
    pub usage: Option<Value>,
    pub llm_model_used: Option<String>,
    pub validator: Option<ValidatorReport>,
    pub failover: Option<Failover>,
}

/// Full trace of one answered request
#[derive(Debug, Clone, Serialize)]
pub struct RagTrace<'a> {
    pub schema_version: u32,
    pub trace_id: &'a str,
    pub params: &'a TraceParams,
    pub timing: &'a Timing,
    pub steps: TraceSteps<'a>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceSteps<'a> {
    pub query: &'a str,
    pub doc_hits: &'a [DocHit],
    pub web_hits: &'a [WebHit],
    pub context_preview: Vec<String>,
    /// Prompts are not recorded
    pub prompt: &'static str,
    pub usage: Option<&'a Value>,
    pub failover: Option<Failover>,
    pub scope: Option<&'a ScopeVerdict>,
    pub scope_raw: Option<&'a ScopeRaw>,
    pub validator: Option<&'a ValidatorReport>,
}

#[derive(Debug, Serialize)]
struct Counts {
    doc_hits: usize,
    web_hits: usize,
}

/// One decision-log record
#[derive(Debug, Serialize)]
pub struct DecisionRecord<'a> {
    schema_version: u32,
    trace_id: &'a str,
    stage: Stage,
    mode: &'a str,
    query_len: usize,
    timing_ms: &'a Timing,
    scope: Option<&'a ScopeVerdict>,
    decision: Option<Decision>,
    counts: Counts,
    validator: Option<&'a ValidatorReport>,
    failover: Option<Failover>,
}

impl<'a> DecisionRecord<'a> {
    pub fn new(stage: Stage, trace_id: &'a str, mode: &'a str, query: &str, timing: &'a Timing) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            trace_id,
            stage,
            mode,
            query_len: query.chars().count(),
            timing_ms: timing,
            scope: None,
            decision: None,
            counts: Counts {
                doc_hits: 0,
                web_hits: 0,
            },
            validator: None,
            failover: None,
        }
    }

    pub fn scope(mut self, scope: Option<&'a ScopeVerdict>) -> Self {
        self.scope = scope;
        self
    }

    pub fn decision(mut self, decision: Decision) -> Self {
        self.decision = Some(decision);
        self
    }

    pub fn hits(mut self, doc_hits: usize, web_hits: usize) -> Self {
        self.counts = Counts { doc_hits, web_hits };
        self
    }

    pub fn validator(mut self, validator: Option<&'a ValidatorReport>) -> Self {
        self.validator = validator;
        self
    }

    pub fn failover(mut self, failover: Option<Failover>) -> Self {
        self.failover = failover;
        self
    }

    /// Log as one `rag.decision` event
    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(record) => tracing::info!(
                target: "rag.decision",
                trace_id = self.trace_id,
                stage = ?self.stage,
                record = %record,
                "rag.decision"
            ),
            Err(e) => tracing::warn!("failed to serialise decision record: {}", e),
        }
    }
}
