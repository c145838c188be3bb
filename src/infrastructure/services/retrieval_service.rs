//! Retrieval orchestrator
//!
//! Turns a routed question into a grounded answer: searches the document
//! collection or the web depending on the category, then asks the generative
//! model to answer from that evidence only. Optionally splits a compound
//! question into sub-questions answered in parallel and synthesized.

use std::sync::Arc;

use futures::future::{join_all, try_join};
use tracing::{info, warn};

use super::completion_gateway::CompletionGateway;
use super::embedding_gateway::EmbeddingGateway;
use super::router_service::RouterService;
use super::timeout::{TimeoutConfig, bounded};
use crate::domain::{
    DocumentIndex, DomainError, IndexMatch, LlmRequest, ProgressReporter, QueryOptions,
    RetrievalConfig, RetrievalOutcome, RouteCategory, RouteDecision, SourceRef, SubQueryReport,
    WebResult, WebSearchProvider,
};
use crate::infrastructure::observability::record_escalation;

const COMPONENT: &str = "RetrievalOrchestrator";

pub const WEB_DISABLED_ANSWER: &str = "Web search is disabled for this query and no matching \
documents were found in the knowledge base.";

const NO_DOCUMENTS_ANSWER: &str =
    "No relevant documents were found in the knowledge base for this question.";

const NO_WEB_RESULTS_ANSWER: &str = "The web search returned no results for this question.";

const ANSWER_PROMPT: &str = "You answer questions using only the numbered context passages \
provided. Cite figures exactly as they appear. If the context does not contain the answer, \
say so plainly instead of guessing.";

const SYNTHESIS_PROMPT: &str = "You combine answers to sub-questions into one coherent answer \
to the original question. Use only the information in the sub-question answers. Mention \
explicitly when a sub-question could not be answered.";

pub struct RetrievalOrchestrator {
    router: Arc<RouterService>,
    embeddings: Arc<EmbeddingGateway>,
    completion: Arc<CompletionGateway>,
    index: Arc<dyn DocumentIndex>,
    web: Arc<dyn WebSearchProvider>,
    config: RetrievalConfig,
    timeouts: TimeoutConfig,
}

impl std::fmt::Debug for RetrievalOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalOrchestrator")
            .field("index", &self.index.index_name())
            .field("web", &self.web.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

impl RetrievalOrchestrator {
    pub fn new(
        router: Arc<RouterService>,
        embeddings: Arc<EmbeddingGateway>,
        completion: Arc<CompletionGateway>,
        index: Arc<dyn DocumentIndex>,
        web: Arc<dyn WebSearchProvider>,
        config: RetrievalConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            router,
            embeddings,
            completion,
            index,
            web,
            config,
            timeouts,
        }
    }

    fn collection_for(&self, category: RouteCategory) -> &str {
        match category {
            RouteCategory::ApiDocQuery => &self.config.api_doc_collection,
            RouteCategory::DocumentQuery | RouteCategory::WebQuery => {
                &self.config.document_collection
            }
        }
    }

    /// Top-K matches at or above the relevance floor, best first
    async fn search_collection(
        &self,
        collection: &str,
        embedding: &[f32],
    ) -> Result<Vec<IndexMatch>, DomainError> {
        let mut matches = bounded(
            "document_index",
            self.timeouts.index(),
            self.index.search(collection, embedding, self.config.top_k),
        )
        .await?;

        matches.retain(|m| m.score >= self.config.min_relevance);
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(self.config.top_k);

        Ok(matches)
    }

    async fn search_web(&self, question: &str) -> Result<Vec<WebResult>, DomainError> {
        let mut results = bounded(
            "web_search",
            self.timeouts.web_search(),
            self.web.search(question),
        )
        .await?;

        results.truncate(self.config.max_web_results);
        Ok(results)
    }

    async fn generate_answer(&self, question: &str, passages: &[&str]) -> Result<String, DomainError> {
        let context = passages
            .iter()
            .enumerate()
            .map(|(i, passage)| format!("[{}] {}", i + 1, passage))
            .collect::<Vec<_>>()
            .join("\n\n");

        let request = LlmRequest::builder()
            .system(ANSWER_PROMPT)
            .user(format!("Question: {}\n\nContext:\n{}", question, context))
            .temperature(self.config.answer_temperature)
            .max_tokens(self.config.answer_max_tokens)
            .build();

        self.completion.complete(&self.config.answer_model, request).await
    }

    async fn answer_from_documents(
        &self,
        question: &str,
        matches: &[IndexMatch],
        category: RouteCategory,
        reporter: &dyn ProgressReporter,
    ) -> Result<RetrievalOutcome, DomainError> {
        reporter.info(
            COMPONENT,
            &format!("Generating answer from {} document passages", matches.len()),
        );

        let passages: Vec<&str> = matches.iter().map(|m| m.content.as_str()).collect();
        let answer = self.generate_answer(question, &passages).await?;
        let sources = matches.iter().map(SourceRef::from_match).collect();

        Ok(RetrievalOutcome::new(answer, sources, category))
    }

    async fn answer_from_web(
        &self,
        question: &str,
        category: RouteCategory,
        reporter: &dyn ProgressReporter,
    ) -> Result<RetrievalOutcome, DomainError> {
        reporter.info(COMPONENT, "Searching the web");
        let results = self.search_web(question).await?;

        if results.is_empty() {
            reporter.warning(COMPONENT, "Web search returned no results");
            let mut outcome = RetrievalOutcome::new(NO_WEB_RESULTS_ANSWER, Vec::new(), category);
            outcome.degraded = true;
            return Ok(outcome);
        }

        reporter.info(
            COMPONENT,
            &format!("Generating answer from {} web results", results.len()),
        );

        let passages: Vec<&str> = results.iter().map(|r| r.content.as_str()).collect();
        let answer = self.generate_answer(question, &passages).await?;
        let sources = results.iter().map(SourceRef::from_web).collect();

        Ok(RetrievalOutcome::new(answer, sources, category))
    }

    /// Web question with web search turned off: answer from both collections, flagged degraded
    async fn answer_without_web(
        &self,
        question: &str,
        embedding: &[f32],
        reporter: &dyn ProgressReporter,
    ) -> Result<RetrievalOutcome, DomainError> {
        reporter.warning(
            COMPONENT,
            "Web search disabled; answering from the document collections only",
        );

        let (filings, api_docs) = try_join(
            self.search_collection(&self.config.document_collection, embedding),
            self.search_collection(&self.config.api_doc_collection, embedding),
        )
        .await?;

        let mut matches: Vec<IndexMatch> = filings.into_iter().chain(api_docs).collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(self.config.top_k);

        let mut outcome = if matches.is_empty() {
            RetrievalOutcome::new(WEB_DISABLED_ANSWER, Vec::new(), RouteCategory::WebQuery)
        } else {
            self.answer_from_documents(question, &matches, RouteCategory::WebQuery, reporter)
                .await?
        };

        outcome.degraded = true;
        Ok(outcome)
    }

    fn nothing_found(&self, category: RouteCategory) -> RetrievalOutcome {
        let mut outcome = RetrievalOutcome::new(NO_DOCUMENTS_ANSWER, Vec::new(), category);
        outcome.degraded = true;
        outcome
    }

    /// Gather evidence for `question` according to `decision` and answer from it
    pub async fn retrieve_and_answer(
        &self,
        question: &str,
        embedding: &[f32],
        decision: &RouteDecision,
        options: QueryOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<RetrievalOutcome, DomainError> {
        let category = decision.category;

        match category {
            RouteCategory::DocumentQuery => {
                let collection = self.collection_for(category);
                reporter.info(COMPONENT, &format!("Searching filings in '{}'", collection));
                let matches = self.search_collection(collection, embedding).await?;

                if !matches.is_empty() {
                    return self
                        .answer_from_documents(question, &matches, category, reporter)
                        .await;
                }

                if !options.allow_web_search {
                    reporter.warning(COMPONENT, "No relevant filings found and web search is disabled");
                    return Ok(self.nothing_found(category));
                }

                warn!(
                    from = %category,
                    to = %RouteCategory::WebQuery,
                    min_relevance = self.config.min_relevance,
                    "No filing matched; escalating to web search"
                );
                reporter.warning(
                    COMPONENT,
                    &format!(
                        "No filing matched above relevance {:.2}; escalating to web search",
                        self.config.min_relevance
                    ),
                );
                record_escalation(category, RouteCategory::WebQuery);

                let mut outcome = self.answer_from_web(question, category, reporter).await?;
                outcome.escalated = true;
                Ok(outcome)
            }
            RouteCategory::ApiDocQuery => {
                let collection = self.collection_for(category);
                reporter.info(COMPONENT, &format!("Searching API docs in '{}'", collection));
                let matches = self.search_collection(collection, embedding).await?;

                if matches.is_empty() {
                    reporter.warning(COMPONENT, "No relevant API documentation found");
                    return Ok(self.nothing_found(category));
                }

                self.answer_from_documents(question, &matches, category, reporter)
                    .await
            }
            RouteCategory::WebQuery if options.allow_web_search => {
                self.answer_from_web(question, category, reporter).await
            }
            RouteCategory::WebQuery => self.answer_without_web(question, embedding, reporter).await,
        }
    }

    async fn answer_slot(
        &self,
        index: usize,
        question: &str,
        options: QueryOptions,
        reporter: &dyn ProgressReporter,
    ) -> (SubQueryReport, Option<RetrievalOutcome>) {
        let embedding = match self.embeddings.embed(question).await {
            Ok(embedding) => embedding,
            Err(e) => {
                reporter.warning(COMPONENT, &format!("Sub-question {} failed: {}", index + 1, e));
                return (
                    SubQueryReport::failed(index, question, None, e.kind(), e.detail()),
                    None,
                );
            }
        };

        let decision = self.router.classify(question).await;
        reporter.info(
            COMPONENT,
            &format!("Sub-question {} routed to {}", index + 1, decision.category),
        );

        match self
            .retrieve_and_answer(question, &embedding, &decision, options, reporter)
            .await
        {
            Ok(outcome) => (
                SubQueryReport::answered(index, question, outcome.category, &outcome.answer),
                Some(outcome),
            ),
            Err(e) => {
                reporter.warning(COMPONENT, &format!("Sub-question {} failed: {}", index + 1, e));
                (
                    SubQueryReport::failed(
                        index,
                        question,
                        Some(decision.category),
                        e.kind(),
                        e.detail(),
                    ),
                    None,
                )
            }
        }
    }

    /// Decompose, answer every sub-question concurrently, then synthesize.
    ///
    /// A question that does not split is answered on the single path. Failed
    /// sub-questions are kept in place as explicit markers.
    pub async fn answer_with_sub_queries(
        &self,
        question: &str,
        embedding: &[f32],
        options: QueryOptions,
        reporter: &dyn ProgressReporter,
    ) -> Result<RetrievalOutcome, DomainError> {
        reporter.info(COMPONENT, "Decomposing question into sub-questions");
        let sub_questions = self.router.decompose(question).await;

        if sub_questions.len() <= 1 {
            reporter.info(COMPONENT, "Question does not split; answering directly");
            let decision = self.router.classify(question).await;
            return self
                .retrieve_and_answer(question, embedding, &decision, options, reporter)
                .await;
        }

        reporter.info(
            COMPONENT,
            &format!("Answering {} sub-questions in parallel", sub_questions.len()),
        );

        // slots run concurrently on this task and borrow the caller's reporter
        let slots = join_all(
            sub_questions
                .iter()
                .enumerate()
                .map(|(index, sub)| self.answer_slot(index, sub, options, reporter)),
        )
        .await;

        let (reports, outcomes): (Vec<SubQueryReport>, Vec<Option<RetrievalOutcome>>) =
            slots.into_iter().unzip();
        let outcomes: Vec<RetrievalOutcome> = outcomes.into_iter().flatten().collect();

        let breakdown = reports
            .iter()
            .map(|r| {
                format!(
                    "Sub-question {}: {}\nAnswer: {}",
                    r.index + 1,
                    r.question,
                    r.rendered_answer()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut degraded = outcomes.iter().any(|o| o.degraded);
        let answer = if outcomes.is_empty() {
            degraded = true;
            format!("[synthesis unavailable: no sub-question could be answered]\n\n{}", breakdown)
        } else {
            match self.synthesize(question, &breakdown).await {
                Ok(synthesis) => format!("{}\n\n---\n\n{}", synthesis, breakdown),
                Err(e) => {
                    reporter.warning(COMPONENT, &format!("Synthesis failed: {}", e));
                    degraded = true;
                    format!("[synthesis unavailable: {}] {}\n\n{}", e.kind(), e.detail(), breakdown)
                }
            }
        };

        let failed = reports.iter().filter(|r| r.is_failed()).count();
        info!(
            sub_questions = reports.len(),
            failed,
            "Sub-question answers aggregated"
        );

        let mut outcome = RetrievalOutcome::new(
            answer,
            outcomes.iter().flat_map(|o| o.sources.iter().cloned()).collect(),
            dominant_category(&reports),
        );
        outcome.degraded = degraded;
        outcome.escalated = outcomes.iter().any(|o| o.escalated);
        outcome.sub_queries = reports;

        Ok(outcome)
    }

    async fn synthesize(&self, question: &str, breakdown: &str) -> Result<String, DomainError> {
        let request = LlmRequest::builder()
            .system(SYNTHESIS_PROMPT)
            .user(format!(
                "Original question: {}\n\nSub-question answers:\n{}",
                question, breakdown
            ))
            .temperature(self.config.answer_temperature)
            .max_tokens(self.config.answer_max_tokens)
            .build();

        self.completion.complete(&self.config.answer_model, request).await
    }
}

/// Most frequent category among answered sub-questions; first seen wins ties
fn dominant_category(reports: &[SubQueryReport]) -> RouteCategory {
    let answered: Vec<RouteCategory> = reports
        .iter()
        .filter(|r| !r.is_failed())
        .filter_map(|r| r.category)
        .collect();

    let mut best: Option<(RouteCategory, usize)> = None;
    for category in &answered {
        let count = answered.iter().filter(|c| *c == category).count();
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((*category, count));
        }
    }

    best.map(|(c, _)| c).unwrap_or(RouteCategory::WebQuery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::retrieval::{MockDocumentIndex, MockWebSearchProvider};
    use crate::domain::search::RecordingReporter;
    use crate::domain::{DecisionSource, ErrorKind, RouterConfig, SourceType};

    const DIM: usize = 16;

    fn orchestrator(
        llm: MockLlmProvider,
        index: MockDocumentIndex,
        web: MockWebSearchProvider,
    ) -> RetrievalOrchestrator {
        let completion = Arc::new(CompletionGateway::new(Arc::new(llm), Duration::from_secs(1)));
        let router = Arc::new(RouterService::new(completion.clone(), RouterConfig::default()).unwrap());
        let embeddings = Arc::new(EmbeddingGateway::new(
            Arc::new(MockEmbeddingProvider::new(DIM)),
            "mock",
            DIM,
            Duration::from_secs(1),
        ));

        RetrievalOrchestrator::new(
            router,
            embeddings,
            completion,
            Arc::new(index),
            Arc::new(web),
            RetrievalConfig::default(),
            TimeoutConfig::uniform(1_000),
        )
    }

    fn decision(category: RouteCategory) -> RouteDecision {
        RouteDecision::new(category, DecisionSource::Model)
    }

    fn filings_index(matches: Vec<IndexMatch>) -> MockDocumentIndex {
        let mut index = MockDocumentIndex::new();
        index.expect_search().returning(move |collection, _, _| {
            if collection == "10k_data" {
                Ok(matches.clone())
            } else {
                Ok(Vec::new())
            }
        });
        index.expect_index_name().return_const("mock-index");
        index
    }

    fn unused_web() -> MockWebSearchProvider {
        let mut web = MockWebSearchProvider::new();
        web.expect_search().never();
        web.expect_provider_name().return_const("mock-web");
        web
    }

    fn web_returning(content: &'static str) -> MockWebSearchProvider {
        let mut web = MockWebSearchProvider::new();
        web.expect_search()
            .returning(move |_| Ok(vec![WebResult::new(content).with_metadata("source", "ares")]));
        web.expect_provider_name().return_const("mock-web");
        web
    }

    #[tokio::test]
    async fn test_document_query_grounds_on_filings() {
        let index = filings_index(vec![
            IndexMatch::new("Uber revenue was $17.455 billion in 2021", 0.82),
            IndexMatch::new("unrelated footnote", 0.1),
        ]);
        let llm = MockLlmProvider::new().on("Question: What was Uber", "Uber's 2021 revenue was $17.455B.");
        let orchestrator = orchestrator(llm, index, unused_web());
        let reporter = RecordingReporter::default();

        let outcome = orchestrator
            .retrieve_and_answer(
                "What was Uber's revenue in 2021?",
                &[0.1; DIM],
                &decision(RouteCategory::DocumentQuery),
                QueryOptions::default(),
                &reporter,
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Uber's 2021 revenue was $17.455B.");
        assert_eq!(outcome.sources.len(), 1);
        assert_eq!(outcome.sources[0].source_type, SourceType::Document);
        assert!(!outcome.degraded && !outcome.escalated);
        assert!(outcome.is_cacheable());
        assert!(reporter.contains("10k_data"));
    }

    #[tokio::test]
    async fn test_document_query_escalates_to_web() {
        let index = filings_index(vec![IndexMatch::new("weak", 0.05)]);
        let web = web_returning("Quarterly revenue rose 20%");
        let orchestrator = orchestrator(MockLlmProvider::new(), index, web);
        let reporter = RecordingReporter::default();

        let outcome = orchestrator
            .retrieve_and_answer(
                "What was Acme's revenue?",
                &[0.1; DIM],
                &decision(RouteCategory::DocumentQuery),
                QueryOptions::default(),
                &reporter,
            )
            .await
            .unwrap();

        assert!(outcome.escalated);
        assert_eq!(outcome.category, RouteCategory::DocumentQuery);
        assert!(outcome.sources.iter().all(|s| s.source_type == SourceType::Web));
        assert!(reporter.contains("escalating to web search"));
    }

    #[tokio::test]
    async fn test_document_query_without_matches_or_web() {
        let orchestrator = orchestrator(MockLlmProvider::new(), filings_index(vec![]), unused_web());

        let outcome = orchestrator
            .retrieve_and_answer(
                "What was Acme's revenue?",
                &[0.1; DIM],
                &decision(RouteCategory::DocumentQuery),
                QueryOptions::default().with_web_search(false),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, NO_DOCUMENTS_ANSWER);
        assert!(!outcome.is_cacheable());
    }

    #[tokio::test]
    async fn test_api_query_searches_api_collection() {
        let mut index = MockDocumentIndex::new();
        index
            .expect_search()
            .times(1)
            .returning(|collection, _, top_k| {
                assert_eq!(collection, "opnai_data");
                assert_eq!(top_k, 5);
                Ok(vec![IndexMatch::new("Use the embeddings endpoint", 0.7)])
            });
        let orchestrator = orchestrator(MockLlmProvider::new(), index, unused_web());

        let outcome = orchestrator
            .retrieve_and_answer(
                "How do I create embeddings?",
                &[0.1; DIM],
                &decision(RouteCategory::ApiDocQuery),
                QueryOptions::default(),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.category, RouteCategory::ApiDocQuery);
        assert_eq!(outcome.sources.len(), 1);
    }

    #[tokio::test]
    async fn test_web_query_uses_web_results() {
        let llm = MockLlmProvider::new().on("Question: Top leadership", "Servant leadership leads.");
        let orchestrator = orchestrator(llm, filings_index(vec![]), web_returning("Servant leadership"));

        let outcome = orchestrator
            .retrieve_and_answer(
                "Top leadership styles in 2024",
                &[0.1; DIM],
                &decision(RouteCategory::WebQuery),
                QueryOptions::default(),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Servant leadership leads.");
        assert_eq!(outcome.sources[0].source_type, SourceType::Web);
    }

    #[tokio::test]
    async fn test_web_disabled_degrades_to_documents() {
        let index = filings_index(vec![IndexMatch::new("Leadership discussion in a 10-K", 0.6)]);
        let orchestrator = orchestrator(MockLlmProvider::new(), index, unused_web());

        let outcome = orchestrator
            .retrieve_and_answer(
                "Top leadership styles in 2024",
                &[0.1; DIM],
                &decision(RouteCategory::WebQuery),
                QueryOptions::default().with_web_search(false),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert!(outcome.degraded);
        assert_eq!(outcome.sources.len(), 1);
        assert!(outcome.sources.iter().all(|s| s.source_type == SourceType::Document));
    }

    #[tokio::test]
    async fn test_web_disabled_without_evidence_skips_model() {
        let llm = Arc::new(MockLlmProvider::new());
        let completion = Arc::new(CompletionGateway::new(llm.clone(), Duration::from_secs(1)));
        let router = Arc::new(RouterService::new(completion.clone(), RouterConfig::default()).unwrap());
        let embeddings = Arc::new(EmbeddingGateway::new(
            Arc::new(MockEmbeddingProvider::new(DIM)),
            "mock",
            DIM,
            Duration::from_secs(1),
        ));
        let orchestrator = RetrievalOrchestrator::new(
            router,
            embeddings,
            completion,
            Arc::new(filings_index(vec![])),
            Arc::new(unused_web()),
            RetrievalConfig::default(),
            TimeoutConfig::default(),
        );

        let outcome = orchestrator
            .retrieve_and_answer(
                "Latest AI news",
                &[0.1; DIM],
                &decision(RouteCategory::WebQuery),
                QueryOptions::default().with_web_search(false),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, WEB_DISABLED_ANSWER);
        assert!(outcome.degraded);
        assert!(outcome.sources.is_empty());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_index_failure_propagates() {
        let mut index = MockDocumentIndex::new();
        index
            .expect_search()
            .returning(|_, _, _| Err(DomainError::retrieval("qdrant", "collection missing")));
        let orchestrator = orchestrator(MockLlmProvider::new(), index, unused_web());

        let err = orchestrator
            .retrieve_and_answer(
                "What was Uber's revenue?",
                &[0.1; DIM],
                &decision(RouteCategory::DocumentQuery),
                QueryOptions::default(),
                &RecordingReporter::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RetrievalError);
    }

    fn sub_query_llm() -> MockLlmProvider {
        MockLlmProvider::new()
            .on(
                "Question to decompose:",
                r#"{"subQuestions":["What was Uber's revenue in 2021?","What is the latest AI news today?"]}"#,
            )
            .on("Question to classify: What was Uber", r#"{"category":"DOCUMENT_QUERY"}"#)
            .on("Question to classify: What is the latest", r#"{"category":"WEB_QUERY"}"#)
            .on("Question: What was Uber", "Uber earned $17.455B in 2021.")
            .on("Original question:", "Combined answer.")
    }

    #[tokio::test]
    async fn test_sub_queries_with_failing_slot() {
        let index = filings_index(vec![IndexMatch::new("Uber revenue $17.455B", 0.9)]);
        let mut web = MockWebSearchProvider::new();
        web.expect_search()
            .returning(|_| Err(DomainError::retrieval("ares", "HTTP 503")));
        web.expect_provider_name().return_const("mock-web");
        let orchestrator = orchestrator(sub_query_llm(), index, web);

        let outcome = orchestrator
            .answer_with_sub_queries(
                "Compare Uber's 2021 revenue with the latest AI news",
                &[0.1; DIM],
                QueryOptions::default(),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.sub_queries.len(), 2);
        assert!(!outcome.sub_queries[0].is_failed());
        assert!(outcome.sub_queries[1].is_failed());
        assert!(outcome.answer.starts_with("Combined answer."));
        assert!(outcome.answer.contains("Uber earned $17.455B in 2021."));
        assert!(outcome.answer.contains("[unavailable: RetrievalError] ares: HTTP 503"));
        assert_eq!(outcome.category, RouteCategory::DocumentQuery);
        assert_eq!(outcome.sources.len(), 1);
        assert!(!outcome.is_cacheable());

        let uber = outcome.answer.find("Sub-question 1:").unwrap();
        let news = outcome.answer.find("Sub-question 2:").unwrap();
        assert!(uber < news);
    }

    #[tokio::test]
    async fn test_synthesis_failure_returns_breakdown() {
        let llm = MockLlmProvider::new()
            .on(
                "Question to decompose:",
                r#"{"subQuestions":["What was Uber's revenue in 2021?","What was Lyft's revenue in 2021?"]}"#,
            )
            .on("Question to classify:", r#"{"category":"DOCUMENT_QUERY"}"#)
            .fail_on("Original question:", "overloaded")
            .with_fallback("From the filing.");
        let index = filings_index(vec![IndexMatch::new("revenue table", 0.9)]);
        let orchestrator = orchestrator(llm, index, unused_web());

        let outcome = orchestrator
            .answer_with_sub_queries(
                "Compare Uber and Lyft revenue in 2021",
                &[0.1; DIM],
                QueryOptions::default(),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert!(outcome.answer.starts_with("[synthesis unavailable: GenerationError]"));
        assert!(outcome.answer.contains("Sub-question 2: What was Lyft's revenue in 2021?"));
        assert!(outcome.degraded);
    }

    #[tokio::test]
    async fn test_simple_question_takes_single_path() {
        let llm = MockLlmProvider::new()
            .on("Question to decompose:", r#"{"subQuestions":["What was Uber's revenue in 2021?"]}"#)
            .on("Question to classify:", r#"{"category":"DOCUMENT_QUERY"}"#)
            .with_fallback("Single answer.");
        let index = filings_index(vec![IndexMatch::new("revenue", 0.9)]);
        let orchestrator = orchestrator(llm, index, unused_web());

        let outcome = orchestrator
            .answer_with_sub_queries(
                "What was Uber's revenue in 2021?",
                &[0.1; DIM],
                QueryOptions::default(),
                &RecordingReporter::default(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.answer, "Single answer.");
        assert!(outcome.sub_queries.is_empty());
        assert!(outcome.is_cacheable());
    }

    #[test]
    fn test_dominant_category() {
        let reports = vec![
            SubQueryReport::answered(0, "a", RouteCategory::WebQuery, "x"),
            SubQueryReport::answered(1, "b", RouteCategory::DocumentQuery, "x"),
            SubQueryReport::answered(2, "c", RouteCategory::DocumentQuery, "x"),
            SubQueryReport::failed(3, "d", Some(RouteCategory::WebQuery), ErrorKind::RetrievalError, "x"),
        ];
        assert_eq!(dominant_category(&reports), RouteCategory::DocumentQuery);
        assert_eq!(dominant_category(&[]), RouteCategory::WebQuery);
    }
}
