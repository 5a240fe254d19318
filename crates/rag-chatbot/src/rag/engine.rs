//! Answer pipeline: scope check, retrieval, generation, validation

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{AnswerConfig, RagConfig};
use crate::error::Result;
use crate::providers::{ChatMessage, ChatOptions, LlmProvider, Providers};
use crate::retrieval::LocalVectorStore;
use crate::types::{SearchMode, Source, WebHit};

use super::context::{
    doc_hit_text, doc_preview, dedup_preview, normalize_contexts, summarize_sources,
    truncate_chars, web_preview,
};
use super::prompt::{PromptBuilder, FIXED_MSG, NO_DOC_MSG, NO_INDEX_MSG, NO_WEB_MSG};
use super::scope::ScopeClassifier;
use super::trace::{
    Decision, DecisionRecord, Failover, RagTrace, Stage, Steps, Timing, TraceParams, TraceSteps,
    ValidatorReport, SCHEMA_VERSION,
};
use super::validate::{rule_validate, AnswerValidator};

/// Documents whose chunks become context
const DOC_CONTEXT_HITS: usize = 3;
/// Characters of a document or page used as context
const CONTEXT_CHARS: usize = 3000;
/// Characters per source when hybrid mode re-summarises
const HYBRID_CONTEXT_CHARS: usize = 1500;
/// Sources considered when hybrid mode re-summarises
const HYBRID_MAX_SOURCES: usize = 6;
/// Previews per kind
const PREVIEW_LIMIT: usize = 3;

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

/// What the pipeline hands back to the HTTP layer
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerPayload {
    pub answer: String,
    pub sources: Vec<Source>,
    /// Present only for debug requests with debug output enabled
    pub trace: Option<Value>,
}

impl AnswerPayload {
    fn rejected() -> Self {
        Self {
            answer: FIXED_MSG.to_string(),
            sources: Vec::new(),
            trace: None,
        }
    }
}

/// Result of one retrieval branch
#[derive(Debug, Default)]
struct Branch {
    answer: String,
    sources: Vec<Source>,
    /// Context text per source, used when hybrid mode re-summarises
    texts: HashMap<String, String>,
}

/// Mutable per-request state
struct Run {
    timing: Timing,
    steps: Steps,
}

/// Output of the generation step
struct Generated {
    answer: String,
    sources: Vec<Source>,
    failover: Option<Failover>,
}

/// The answer pipeline
pub struct RagEngine {
    settings: AnswerConfig,
    llm_model: String,
    temperature: f32,
    llm: Arc<dyn LlmProvider>,
    providers: Providers,
    store: LocalVectorStore,
    classifier: ScopeClassifier,
    validator: AnswerValidator,
}

impl RagEngine {
    pub fn new(config: &RagConfig, providers: Providers, store: LocalVectorStore) -> Self {
        let llm = providers.llm.clone();
        Self {
            settings: config.answer.clone(),
            llm_model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            classifier: ScopeClassifier::new(llm.clone(), config.llm.classifier_model()),
            validator: AnswerValidator::new(llm.clone(), &config.llm.model),
            llm,
            providers,
            store,
        }
    }

    /// Answer `query`, recording decisions under `trace_id`
    pub async fn answer(
        &self,
        query: &str,
        mode: SearchMode,
        debug: bool,
        trace_id: &str,
    ) -> Result<AnswerPayload> {
        let started = Instant::now();
        let mode_str = mode.as_str();
        let params = TraceParams {
            mode: mode_str.to_string(),
            top_k: self.settings.top_k,
            threshold: self.settings.threshold,
            embed_model: self.providers.embedder.model().to_string(),
            llm_model: self.llm_model.clone(),
        };
        let mut run = Run {
            timing: Timing::new(),
            steps: Steps::default(),
        };

        let (verdict, raw) = self.classifier.classify(query).await?;
        run.steps.scope = Some(verdict);
        run.steps.scope_raw = Some(raw);
        DecisionRecord::new(Stage::ScopeChecked, trace_id, mode_str, query, &run.timing)
            .scope(run.steps.scope.as_ref())
            .emit();

        let accepted = run
            .steps
            .scope
            .as_ref()
            .map(|v| v.accepts(f64::from(self.settings.scope_threshold)))
            .unwrap_or(false);
        if !accepted {
            DecisionRecord::new(Stage::EarlyReject, trace_id, mode_str, query, &run.timing)
                .scope(run.steps.scope.as_ref())
                .decision(Decision::RejectScope)
                .emit();
            return Ok(AnswerPayload::rejected());
        }

        let generated = self.generate(query, mode, &mut run).await?;
        let (doc_count, web_count) = (run.steps.doc_hits.len(), run.steps.web_hits.len());
        DecisionRecord::new(Stage::Generated, trace_id, mode_str, query, &run.timing)
            .scope(run.steps.scope.as_ref())
            .hits(doc_count, web_count)
            .failover(generated.failover)
            .emit();

        let rule_errors = rule_validate(
            &generated.answer,
            &generated.sources,
            self.settings.max_answer_chars,
        );
        if rule_errors.is_empty() {
            run.steps.validator = Some(ValidatorReport::default());
        } else {
            let (ok, llm_errors) = self.validator.validate(query, &generated.answer).await?;
            run.steps.validator = Some(ValidatorReport {
                rule: rule_errors,
                llm: Some(llm_errors),
            });
            if !ok {
                DecisionRecord::new(Stage::Validated, trace_id, mode_str, query, &run.timing)
                    .scope(run.steps.scope.as_ref())
                    .validator(run.steps.validator.as_ref())
                    .decision(Decision::RejectValidate)
                    .hits(doc_count, web_count)
                    .failover(generated.failover)
                    .emit();
                return Ok(AnswerPayload::rejected());
            }
        }

        run.timing.insert("total_ms", elapsed_ms(started));
        run.steps.failover = generated.failover;

        let ui_sources = summarize_sources(&run.steps.doc_hits, &run.steps.web_hits);
        let previews: Vec<String> = run
            .steps
            .context_preview_doc
            .iter()
            .chain(&run.steps.context_preview_web)
            .cloned()
            .collect();

        let trace = RagTrace {
            schema_version: SCHEMA_VERSION,
            trace_id,
            params: &params,
            timing: &run.timing,
            steps: TraceSteps {
                query,
                doc_hits: &run.steps.doc_hits,
                web_hits: &run.steps.web_hits,
                context_preview: dedup_preview(&previews, HYBRID_MAX_SOURCES),
                prompt: "[hidden]",
                usage: run.steps.usage.as_ref(),
                failover: run.steps.failover,
                scope: run.steps.scope.as_ref(),
                scope_raw: run.steps.scope_raw.as_ref(),
                validator: run.steps.validator.as_ref(),
            },
        };

        DecisionRecord::new(Stage::Done, trace_id, mode_str, query, &run.timing)
            .scope(run.steps.scope.as_ref())
            .validator(run.steps.validator.as_ref())
            .decision(Decision::Accept)
            .hits(doc_count, web_count)
            .failover(generated.failover)
            .emit();

        let trace_value = serde_json::to_value(&trace)?;
        tracing::info!(target: "rag.trace", trace_id, trace = %trace_value, "rag.trace");

        Ok(AnswerPayload {
            answer: generated.answer,
            sources: ui_sources,
            trace: (debug && self.settings.debug_rag).then_some(trace_value),
        })
    }

    async fn generate(&self, query: &str, mode: SearchMode, run: &mut Run) -> Result<Generated> {
        match mode {
            SearchMode::Doc => {
                let doc = self.doc(query, run).await?;
                Ok(Generated {
                    answer: doc.answer,
                    sources: doc.sources,
                    failover: None,
                })
            }
            SearchMode::Web => {
                let web = self.web(query, run).await?;
                Ok(Generated {
                    answer: web.answer,
                    sources: web.sources,
                    failover: None,
                })
            }
            SearchMode::Hybrid => self.hybrid(query, run).await,
        }
    }

    /// Doc and web together; a failing side is logged and treated as empty
    async fn hybrid(&self, query: &str, run: &mut Run) -> Result<Generated> {
        let doc = match self.doc(query, run).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("hybrid: document retrieval failed: {}", e);
                Branch::default()
            }
        };
        let web = match self.web(query, run).await {
            Ok(web) => web,
            Err(e) => {
                tracing::warn!("hybrid: web retrieval failed: {}", e);
                Branch::default()
            }
        };

        let mut contexts = Vec::new();
        for source in doc.sources.iter().chain(&web.sources).take(HYBRID_MAX_SOURCES) {
            let key = source.url.as_ref().or(source.path.as_ref());
            if let Some(text) = key.and_then(|k| doc.texts.get(k).or_else(|| web.texts.get(k))) {
                if !text.is_empty() {
                    contexts.push(truncate_chars(text, HYBRID_CONTEXT_CHARS));
                }
            }
        }

        let answer = if contexts.is_empty() {
            format!("{}\n\n{}", doc.answer, web.answer)
        } else {
            self.summarize(&contexts, query, run).await?
        };

        let failover = Failover::detect(run.steps.doc_hits.len(), run.steps.web_hits.len());
        let mut sources = doc.sources;
        sources.extend(web.sources);
        Ok(Generated {
            answer,
            sources,
            failover,
        })
    }

    async fn doc(&self, query: &str, run: &mut Run) -> Result<Branch> {
        if !self.store.exists() {
            run.steps.doc_hits = Vec::new();
            return Ok(Branch {
                answer: NO_INDEX_MSG.to_string(),
                ..Default::default()
            });
        }

        let started = Instant::now();
        let embedding = self.providers.embedder.embed(query).await?;
        let mut hits = self.store.search(embedding, self.settings.top_k).await?;
        run.timing.insert("retrieval_ms_doc", elapsed_ms(started));

        if self.settings.threshold > 0.0 {
            hits.retain(|h| h.score >= self.settings.threshold);
        }

        let mut contexts = Vec::new();
        let mut sources = Vec::new();
        let mut texts = HashMap::new();
        for hit in hits.iter().take(DOC_CONTEXT_HITS) {
            let text = doc_hit_text(hit, CONTEXT_CHARS);
            if !text.is_empty() {
                contexts.push(text.clone());
                texts.entry(hit.meta.path.clone()).or_insert(text);
            }
            sources.push(Source::from_doc_hit(hit));
        }

        let answer = if contexts.is_empty() {
            NO_DOC_MSG.to_string()
        } else {
            self.summarize(&contexts, query, run).await?
        };
        run.steps.context_preview_doc = doc_preview(&hits, PREVIEW_LIMIT);
        run.steps.doc_hits = hits;

        Ok(Branch {
            answer,
            sources,
            texts,
        })
    }

    async fn web(&self, query: &str, run: &mut Run) -> Result<Branch> {
        let started = Instant::now();
        let results = self.providers.web.search(query, 1).await?;
        run.timing.insert("retrieval_ms_web", elapsed_ms(started));

        let mut contexts = Vec::new();
        let mut sources = Vec::new();
        let mut texts = HashMap::new();
        let mut web_hits: Vec<WebHit> = Vec::new();

        for (rank, result) in (1..).zip(results.iter().take(self.settings.top_k)) {
            let Some(url) = result.url.as_deref().filter(|u| !u.is_empty()) else {
                continue;
            };
            let text = self.providers.fetcher.fetch_text(url).await;
            if text.is_empty() {
                continue;
            }

            let snippet = match result.snippet.as_deref() {
                Some(s) if !s.is_empty() => s.to_string(),
                _ => truncate_chars(&text, 240),
            };
            contexts.push(truncate_chars(&text, CONTEXT_CHARS));

            let hit = WebHit {
                title: result.title.clone(),
                url: url.to_string(),
                rank,
                score: None,
                snippet,
            };
            sources.push(Source::from_web_hit(&hit));
            web_hits.push(hit);
            texts.insert(url.to_string(), text);
        }

        run.steps.context_preview_web = web_preview(&web_hits, PREVIEW_LIMIT);
        run.steps.web_hits = web_hits;

        let answer = if contexts.is_empty() {
            NO_WEB_MSG.to_string()
        } else {
            self.summarize(&contexts, query, run).await?
        };

        Ok(Branch {
            answer,
            sources,
            texts,
        })
    }

    /// Answer from contexts with the configured system prompt
    async fn summarize(&self, contexts: &[String], query: &str, run: &mut Run) -> Result<String> {
        let normalized = normalize_contexts(
            contexts,
            self.settings.ctx_max_chunks,
            self.settings.ctx_max_chars,
        );
        let messages = [
            ChatMessage::system(self.settings.system_prompt.trim()),
            ChatMessage::user(PromptBuilder::answer_user(query, &normalized)),
        ];
        let options = ChatOptions::new(&self.llm_model).with_temperature(self.temperature);

        let output = self.llm.chat(&messages, &options).await?;
        *run.timing.entry("llm_ms").or_insert(0) += output.meta.ms;
        if output.meta.usage.is_some() {
            run.steps.usage = output.meta.usage;
        }
        run.steps.llm_model_used = Some(self.llm_model.clone());

        Ok(output.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMeta, ChatOutput, EmbeddingProvider, PageFetcher, WebSearchProvider};
    use crate::retrieval::VectorStore;
    use crate::types::hit::SearchHit;
    use crate::types::{ChunkMeta, SourceKind};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replies by matching the system prompt
    struct ScriptedLlm {
        scope: String,
        answer: String,
        review: String,
        calls: Mutex<Vec<String>>,
        answer_temperatures: Mutex<Vec<f32>>,
    }

    impl ScriptedLlm {
        fn new(scope: &str, answer: &str, review: &str) -> Arc<Self> {
            Arc::new(Self {
                scope: scope.to_string(),
                answer: answer.to_string(),
                review: review.to_string(),
                calls: Mutex::new(Vec::new()),
                answer_temperatures: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn chat(&self, messages: &[ChatMessage], options: &ChatOptions) -> Result<ChatOutput> {
            let system = &messages[0].content;
            let (kind, text) = if system == PromptBuilder::scope_system() {
                ("scope", &self.scope)
            } else if system == PromptBuilder::validator_system() {
                ("review", &self.review)
            } else {
                self.answer_temperatures.lock().push(options.temperature);
                ("answer", &self.answer)
            };
            self.calls.lock().push(kind.to_string());
            Ok(ChatOutput {
                text: text.clone(),
                meta: ChatMeta {
                    ms: 5,
                    model: "fake".to_string(),
                    ..Default::default()
                },
            })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct AxisEmbedder;

    #[async_trait]
    impl EmbeddingProvider for AxisEmbedder {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn model(&self) -> &str {
            "axis"
        }

        fn name(&self) -> &str {
            "test"
        }
    }

    struct FixedSearch(Vec<SearchHit>);

    #[async_trait]
    impl WebSearchProvider for FixedSearch {
        async fn search(&self, _query: &str, _pages: usize) -> Result<Vec<SearchHit>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl WebSearchProvider for FailingSearch {
        async fn search(&self, _query: &str, _pages: usize) -> Result<Vec<SearchHit>> {
            Err(crate::error::Error::search("unavailable"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct StaticFetcher;

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch_text(&self, url: &str) -> String {
            if url.contains("empty") {
                String::new()
            } else {
                format!("{} のページ本文。補助上限は450万円。", url)
            }
        }
    }

    fn search_hit(url: &str, snippet: Option<&str>) -> SearchHit {
        SearchHit {
            title: Some(format!("title {}", url)),
            url: Some(url.to_string()),
            snippet: snippet.map(str::to_string),
            ..Default::default()
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        llm: Arc<ScriptedLlm>,
        engine: RagEngine,
    }

    fn fixture(llm: Arc<ScriptedLlm>, web: Arc<dyn WebSearchProvider>, with_index: bool, debug_rag: bool) -> Fixture {
        let mut config = RagConfig::default();
        config.answer.debug_rag = debug_rag;
        fixture_with(llm, web, with_index, config)
    }

    fn fixture_with(
        llm: Arc<ScriptedLlm>,
        web: Arc<dyn WebSearchProvider>,
        with_index: bool,
        config: RagConfig,
    ) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(VectorStore::new(dir.path()));
        if with_index {
            store
                .save(
                    &[vec![1.0, 0.0], vec![0.0, 1.0]],
                    &[
                        ChunkMeta::pdf("guide.pdf", "data/pdf/guide.pdf", 2, 0, 5, "補助上限は450万円です。"),
                        ChunkMeta::text("other.txt", "data/pdf/other.txt", 0, "無関係な本文"),
                    ],
                )
                .unwrap();
        }

        let providers = Providers {
            llm: llm.clone(),
            embedder: Arc::new(AxisEmbedder),
            web,
            fetcher: Arc::new(StaticFetcher),
        };
        let engine = RagEngine::new(&config, providers, LocalVectorStore::new(store));
        Fixture {
            _dir: dir,
            llm,
            engine,
        }
    }

    const IN_SCOPE: &str = r#"{"label":"IN","score":0.95,"reason":"補助金"}"#;

    #[tokio::test]
    async fn test_out_of_scope_rejected_early() {
        let llm = ScriptedLlm::new(r#"{"label":"OUT","score":0.98,"reason":"無関係"}"#, "x", "x");
        let f = fixture(llm, Arc::new(FixedSearch(vec![])), true, false);

        let payload = f.engine.answer("秋葉原のラーメン", SearchMode::Doc, false, "t1").await.unwrap();
        assert_eq!(payload.answer, FIXED_MSG);
        assert!(payload.sources.is_empty());
        assert_eq!(f.llm.calls(), vec!["scope"]);
    }

    #[tokio::test]
    async fn test_doc_mode_answers_with_sources() {
        let llm = ScriptedLlm::new(IN_SCOPE, "上限は450万円です。", "x");
        let f = fixture(llm, Arc::new(FixedSearch(vec![])), true, true);

        let payload = f.engine.answer("IT導入補助金の上限は？", SearchMode::Doc, true, "t2").await.unwrap();
        assert_eq!(payload.answer, "上限は450万円です。");
        assert_eq!(payload.sources.len(), 2);
        assert_eq!(payload.sources[0].title.as_deref(), Some("guide.pdf"));
        assert_eq!(payload.sources[0].page, Some(2));
        assert_eq!(f.llm.calls(), vec!["scope", "answer"]);

        let trace = payload.trace.unwrap();
        assert_eq!(trace["trace_id"], "t2");
        assert_eq!(trace["params"]["mode"], "doc");
        assert_eq!(trace["steps"]["prompt"], "[hidden]");
        assert_eq!(trace["steps"]["validator"]["rule"], serde_json::json!([]));
        assert!(trace["steps"]["context_preview"][0]
            .as_str()
            .unwrap()
            .starts_with("[guide.pdf p.2]"));
        assert!(trace["timing"]["total_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_trace_hidden_unless_enabled() {
        let llm = ScriptedLlm::new(IN_SCOPE, "上限は450万円です。", "x");
        let f = fixture(llm, Arc::new(FixedSearch(vec![])), true, false);
        let payload = f.engine.answer("補助金", SearchMode::Doc, true, "t3").await.unwrap();
        assert!(payload.trace.is_none());
    }

    #[tokio::test]
    async fn test_missing_index_goes_through_validation() {
        let llm = ScriptedLlm::new(IN_SCOPE, "unused", r#"{"ok":true,"reasons":[]}"#);
        let f = fixture(llm, Arc::new(FixedSearch(vec![])), false, false);

        let payload = f.engine.answer("補助金", SearchMode::Doc, false, "t4").await.unwrap();
        assert_eq!(payload.answer, NO_INDEX_MSG);
        assert_eq!(f.llm.calls(), vec!["scope", "review"]);
    }

    #[tokio::test]
    async fn test_failed_review_returns_fixed_message() {
        let llm = ScriptedLlm::new(IN_SCOPE, "unused", r#"{"ok":false,"reasons":["根拠なし"]}"#);
        let f = fixture(llm, Arc::new(FixedSearch(vec![])), false, false);

        let payload = f.engine.answer("補助金", SearchMode::Doc, false, "t5").await.unwrap();
        assert_eq!(payload.answer, FIXED_MSG);
        assert!(payload.sources.is_empty());
    }

    #[tokio::test]
    async fn test_web_mode_skips_empty_pages() {
        let llm = ScriptedLlm::new(IN_SCOPE, "Webによると450万円です。", "x");
        let results = vec![
            search_hit("https://empty.example.jp/", Some("s0")),
            search_hit("https://a.go.jp/1", None),
            search_hit("https://b.go.jp/2", Some("概要")),
        ];
        let f = fixture(llm, Arc::new(FixedSearch(results)), false, false);

        let payload = f.engine.answer("補助金", SearchMode::Web, false, "t6").await.unwrap();
        assert_eq!(payload.answer, "Webによると450万円です。");
        let urls: Vec<_> = payload.sources.iter().filter_map(|s| s.url.clone()).collect();
        assert_eq!(urls, vec!["https://a.go.jp/1", "https://b.go.jp/2"]);
        assert!(payload.sources.iter().all(|s| s.kind == SourceKind::Web));
    }

    #[tokio::test]
    async fn test_hybrid_failover_when_web_fails() {
        let llm = ScriptedLlm::new(IN_SCOPE, "両方から: 450万円", "x");
        let f = fixture(llm, Arc::new(FailingSearch), true, true);

        let payload = f.engine.answer("補助金", SearchMode::Hybrid, true, "t7").await.unwrap();
        assert_eq!(payload.answer, "両方から: 450万円");
        let trace = payload.trace.unwrap();
        assert_eq!(trace["steps"]["failover"], "web→doc");
        assert_eq!(f.llm.calls(), vec!["scope", "answer", "answer"]);
    }

    #[tokio::test]
    async fn test_hybrid_without_context_concatenates() {
        let llm = ScriptedLlm::new(IN_SCOPE, "unused", r#"{"ok":true,"reasons":[]}"#);
        let f = fixture(llm, Arc::new(FixedSearch(vec![])), false, false);

        let payload = f.engine.answer("補助金", SearchMode::Hybrid, false, "t8").await.unwrap();
        assert_eq!(payload.answer, format!("{}\n\n{}", NO_INDEX_MSG, NO_WEB_MSG));
    }

    #[tokio::test]
    async fn test_threshold_drops_low_scoring_hits() {
        let llm = ScriptedLlm::new(IN_SCOPE, "上限は450万円です。", "x");
        let mut config = RagConfig::default();
        config.answer.threshold = 0.5;
        let f = fixture_with(llm, Arc::new(FixedSearch(vec![])), true, config);

        let payload = f.engine.answer("補助金", SearchMode::Doc, false, "t9").await.unwrap();
        assert_eq!(payload.answer, "上限は450万円です。");
        assert_eq!(payload.sources.len(), 1);
        assert_eq!(payload.sources[0].title.as_deref(), Some("guide.pdf"));
    }

    #[tokio::test]
    async fn test_threshold_above_all_scores_leaves_no_context() {
        let llm = ScriptedLlm::new(IN_SCOPE, "unused", r#"{"ok":true,"reasons":[]}"#);
        let mut config = RagConfig::default();
        config.answer.threshold = 1.5;
        let f = fixture_with(llm, Arc::new(FixedSearch(vec![])), true, config);

        let payload = f.engine.answer("補助金", SearchMode::Doc, false, "t10").await.unwrap();
        assert_eq!(payload.answer, NO_DOC_MSG);
        assert!(payload.sources.is_empty());
        assert_eq!(f.llm.calls(), vec!["scope", "review"]);
    }

    #[tokio::test]
    async fn test_answer_uses_configured_temperature() {
        let llm = ScriptedLlm::new(IN_SCOPE, "上限は450万円です。", "x");
        let mut config = RagConfig::default();
        config.llm.temperature = 0.7;
        let f = fixture_with(llm, Arc::new(FixedSearch(vec![])), true, config);

        f.engine.answer("補助金", SearchMode::Doc, false, "t11").await.unwrap();
        assert_eq!(*f.llm.answer_temperatures.lock(), vec![0.7]);
    }
}
