//! Debounced analysis of the document text.
//!
//! Every content change reschedules a single pending analysis. When the quiet
//! period elapses the analysis is dispatched and runs to completion even if
//! newer edits arrive; each dispatched call carries a sequence number and only
//! the latest one may write its result to the [`AnalysisStore`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use smol::{Executor, Task, Timer};
use zen_core::{DEFAULT_DEBOUNCE_MS, DEFAULT_MIN_ANALYSIS_CHARS, ZenConfig};

use crate::model::WritingModel;
use crate::store::AnalysisStore;

pub const ANALYSIS_ERROR_MESSAGE: &str =
    "Failed to analyze text. Please check your API key or try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisPipelineConfig {
    pub debounce: Duration,
    /// Texts of this many characters or fewer are never analyzed.
    pub min_chars: usize,
}

impl Default for AnalysisPipelineConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            min_chars: DEFAULT_MIN_ANALYSIS_CHARS,
        }
    }
}

impl From<&ZenConfig> for AnalysisPipelineConfig {
    fn from(config: &ZenConfig) -> Self {
        Self {
            debounce: config.debounce(),
            min_chars: config.min_analysis_chars,
        }
    }
}

pub struct AnalysisPipeline {
    config: AnalysisPipelineConfig,
    executor: Arc<Executor<'static>>,
    dispatcher: Dispatcher,
    pending: Mutex<Option<Task<()>>>,
}

impl AnalysisPipeline {
    pub fn new(
        model: Arc<dyn WritingModel>,
        store: AnalysisStore,
        executor: Arc<Executor<'static>>,
        config: AnalysisPipelineConfig,
    ) -> Self {
        Self {
            config,
            dispatcher: Dispatcher {
                model,
                store,
                executor: executor.clone(),
                latest_request: Arc::new(AtomicU64::new(0)),
            },
            executor,
            pending: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &AnalysisStore {
        &self.dispatcher.store
    }

    pub fn config(&self) -> AnalysisPipelineConfig {
        self.config
    }

    /// React to a document edit. `plain_text` is the stripped document text.
    pub fn content_changed(&self, plain_text: &str) {
        let Some(text) = self.analyzable(plain_text) else {
            self.clear();
            return;
        };

        let dispatcher = self.dispatcher.clone();
        let debounce = self.config.debounce;
        let task = self.executor.spawn(async move {
            Timer::after(debounce).await;
            dispatcher.dispatch(text).detach();
        });

        // Dropping the previous timer task cancels it.
        let previous = self.pending.lock().replace(task);
        drop(previous);
    }

    /// Analyze immediately, skipping the quiet period. Returns `None` when
    /// the text is too short, in which case the current result is cleared.
    pub fn analyze_now(&self, plain_text: &str) -> Option<Task<()>> {
        let Some(text) = self.analyzable(plain_text) else {
            self.clear();
            return None;
        };
        self.cancel_pending();
        Some(self.dispatcher.dispatch(text))
    }

    /// Cancel the scheduled analysis, if any. In-flight calls are unaffected.
    pub fn cancel_pending(&self) {
        let previous = self.pending.lock().take();
        drop(previous);
    }

    /// Whether an analysis is scheduled but not yet dispatched.
    pub fn has_pending(&self) -> bool {
        self.pending
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn analyzable(&self, plain_text: &str) -> Option<String> {
        let text = plain_text.trim();
        (text.chars().count() > self.config.min_chars).then(|| text.to_string())
    }

    fn clear(&self) {
        self.cancel_pending();
        self.dispatcher.invalidate();
        self.dispatcher.store.clear_analysis();
    }
}

impl Drop for AnalysisPipeline {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[derive(Clone)]
struct Dispatcher {
    model: Arc<dyn WritingModel>,
    store: AnalysisStore,
    executor: Arc<Executor<'static>>,
    latest_request: Arc<AtomicU64>,
}

impl Dispatcher {
    /// Start an analysis call. The request becomes the latest synchronously.
    fn dispatch(&self, text: String) -> Task<()> {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.begin_request();

        let model = self.model.clone();
        let store = self.store.clone();
        let latest_request = self.latest_request.clone();
        self.executor.spawn(async move {
            log::debug!("analysis #{request_id} started ({} chars)", text.len());
            let result = model.analyze_text(&text).await;

            if latest_request.load(Ordering::SeqCst) != request_id {
                log::debug!("analysis #{request_id} superseded, discarding response");
                store.complete_request();
                return;
            }

            match result {
                Ok(analysis) => {
                    log::debug!(
                        "analysis #{request_id} finished: {} ({})",
                        analysis.tone.name,
                        analysis.tone.score
                    );
                    store.complete_analysis(Ok(analysis));
                }
                Err(error) => {
                    log::error!("analysis #{request_id} failed: {error}");
                    store.complete_analysis(Err(ANALYSIS_ERROR_MESSAGE.to_string()));
                }
            }
        })
    }

    /// Make every in-flight call stale.
    fn invalidate(&self) {
        self.latest_request.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FakeWritingModel;
    use crate::analysis::{AnalysisResult, Tone};
    use pretty_assertions::assert_eq;

    const DEBOUNCE: Duration = Duration::from_millis(20);

    fn pipeline(model: &Arc<FakeWritingModel>, executor: &Arc<Executor<'static>>) -> AnalysisPipeline {
        AnalysisPipeline::new(
            model.clone(),
            AnalysisStore::new(),
            executor.clone(),
            AnalysisPipelineConfig {
                debounce: DEBOUNCE,
                min_chars: 10,
            },
        )
    }

    fn analysis_with_tone(name: &str) -> AnalysisResult {
        AnalysisResult {
            tone: Tone {
                name: name.into(),
                score: 50,
            },
            ..FakeWritingModel::sample_analysis()
        }
    }

    #[test]
    fn test_edits_within_quiet_period_coalesce() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);

        smol::block_on(executor.run(async {
            pipeline.content_changed("The first draft");
            pipeline.content_changed("The second draft");
            pipeline.content_changed("The third draft");
            assert!(pipeline.has_pending());
            assert!(model.analyze_calls().is_empty());

            Timer::after(DEBOUNCE * 4).await;
        }));

        assert_eq!(model.analyze_calls(), vec!["The third draft"]);
        assert!(!pipeline.has_pending());
        let state = pipeline.store().state();
        assert!(!state.is_loading());
        assert_eq!(state.analysis.unwrap().tone.name, "confident");
    }

    #[test]
    fn test_separate_quiet_periods_each_analyze() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);

        smol::block_on(executor.run(async {
            pipeline.content_changed("The first draft");
            Timer::after(DEBOUNCE * 4).await;
            pipeline.content_changed("The second draft");
            Timer::after(DEBOUNCE * 4).await;
        }));

        assert_eq!(
            model.analyze_calls(),
            vec!["The first draft", "The second draft"]
        );
    }

    #[test]
    fn test_short_text_clears_without_a_call() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);

        smol::block_on(executor.run(async {
            pipeline.analyze_now("Long enough to analyze").unwrap().await;
            assert!(pipeline.store().state().analysis.is_some());

            pipeline.content_changed("Long enough to analyze!");
            pipeline.content_changed("0123456789");
            assert!(!pipeline.has_pending());
            assert!(pipeline.store().state().analysis.is_none());

            pipeline.content_changed("   <tiny>   ");
            Timer::after(DEBOUNCE * 4).await;
        }));

        assert_eq!(model.analyze_calls(), vec!["Long enough to analyze"]);
    }

    #[test]
    fn test_eleven_characters_is_analyzed() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);

        assert!(pipeline.analyze_now("0123456789").is_none());
        let task = pipeline.analyze_now("0123456789a").unwrap();
        smol::block_on(executor.run(task));
        assert_eq!(model.analyze_calls(), vec!["0123456789a"]);
    }

    #[test]
    fn test_failure_sets_error_and_clears_result() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);

        smol::block_on(executor.run(async {
            pipeline.analyze_now("Long enough to analyze").unwrap().await;
            model.push_analysis(Err("quota exceeded".into()), Duration::ZERO);
            pipeline.analyze_now("Long enough to analyze again").unwrap().await;
        }));

        let state = pipeline.store().state();
        assert_eq!(state.error.as_deref(), Some(ANALYSIS_ERROR_MESSAGE));
        assert_eq!(state.analysis, None);
        assert!(!state.is_loading());
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);

        model.push_analysis(Ok(analysis_with_tone("older")), DEBOUNCE * 3);
        model.push_analysis(Ok(analysis_with_tone("newer")), Duration::ZERO);

        smol::block_on(executor.run(async {
            let first = pipeline.analyze_now("The first version").unwrap();
            let second = pipeline.analyze_now("The second version").unwrap();
            assert_eq!(pipeline.store().state().pending_requests, 2);
            second.await;
            first.await;
        }));

        let state = pipeline.store().state();
        assert_eq!(state.analysis.as_ref().unwrap().tone.name, "newer");
        assert!(!state.is_loading());
    }

    #[test]
    fn test_short_text_invalidates_in_flight_analysis() {
        let executor = Arc::new(Executor::new());
        let model = Arc::new(FakeWritingModel::new());
        let pipeline = pipeline(&model, &executor);
        model.push_analysis(Ok(analysis_with_tone("late")), DEBOUNCE * 2);

        smol::block_on(executor.run(async {
            let in_flight = pipeline.analyze_now("Long enough to analyze").unwrap();
            assert!(pipeline.store().state().is_loading());
            pipeline.content_changed("short");
            in_flight.await;
        }));

        let state = pipeline.store().state();
        assert_eq!(state.analysis, None);
        assert!(!state.is_loading());
    }
}
