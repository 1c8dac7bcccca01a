use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use zen_core::{DEFAULT_TONE_COLOR, ToneColor};

use crate::analysis::AnalysisResult;

/// What the analysis panel renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    pub analysis: Option<Arc<AnalysisResult>>,
    /// Model calls currently in flight, analysis and rewrites alike.
    pub pending_requests: usize,
    pub error: Option<String>,
}

impl AnalysisState {
    pub fn is_loading(&self) -> bool {
        self.pending_requests > 0
    }

    /// Accent color for the tone badge; neutral when nothing is analyzed.
    pub fn tone_color(&self) -> ToneColor {
        self.analysis
            .as_ref()
            .map_or(DEFAULT_TONE_COLOR, |analysis| analysis.tone_color())
    }
}

type Observer = Arc<dyn Fn(&AnalysisState) + Send + Sync>;

struct StoreInner {
    state: Mutex<AnalysisState>,
    observers: Mutex<Vec<(usize, Observer)>>,
    next_observer_id: Mutex<usize>,
}

/// Shared analysis state with change notification.
///
/// Cloning yields another handle to the same store. Observers run on the
/// thread that made the change, after the state lock is released.
#[derive(Clone)]
pub struct AnalysisStore {
    inner: Arc<StoreInner>,
}

impl Default for AnalysisStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(AnalysisState::default()),
                observers: Mutex::new(Vec::new()),
                next_observer_id: Mutex::new(0),
            }),
        }
    }

    pub fn state(&self) -> AnalysisState {
        self.inner.state.lock().clone()
    }

    /// Call `callback` after every state change until the returned
    /// [`Subscription`] is dropped.
    #[must_use]
    pub fn subscribe(
        &self,
        callback: impl Fn(&AnalysisState) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut next = self.inner.next_observer_id.lock();
            *next += 1;
            *next
        };
        self.inner.observers.lock().push((id, Arc::new(callback)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// A model call started. Clears any previous error.
    pub fn begin_request(&self) {
        self.update(|state| {
            state.pending_requests += 1;
            state.error = None;
        });
    }

    /// An analysis call finished; `Err` carries the user-facing message and
    /// discards the previous result.
    pub fn complete_analysis(&self, result: Result<AnalysisResult, String>) {
        self.update(|state| {
            state.pending_requests = state.pending_requests.saturating_sub(1);
            match result {
                Ok(analysis) => {
                    state.analysis = Some(Arc::new(analysis));
                    state.error = None;
                }
                Err(message) => {
                    state.analysis = None;
                    state.error = Some(message);
                }
            }
        });
    }

    /// A call finished with nothing to record, e.g. a superseded analysis
    /// or a successful rewrite.
    pub fn complete_request(&self) {
        self.update(|state| {
            state.pending_requests = state.pending_requests.saturating_sub(1);
        });
    }

    pub fn fail_request(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| {
            state.pending_requests = state.pending_requests.saturating_sub(1);
            state.error = Some(message);
        });
    }

    /// Show an error for an action that never reached the model.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| state.error = Some(message));
    }

    /// Drop the current analysis and error, e.g. when the text became too short.
    pub fn clear_analysis(&self) {
        self.update(|state| {
            state.analysis = None;
            state.error = None;
        });
    }

    fn update(&self, f: impl FnOnce(&mut AnalysisState)) {
        let snapshot = {
            let mut state = self.inner.state.lock();
            f(&mut state);
            state.clone()
        };
        let observers: Vec<Observer> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in observers {
            observer(&snapshot);
        }
    }
}

/// Keeps an observer registered. Dropping it unsubscribes.
#[must_use]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: Option<usize>,
}

impl Subscription {
    /// Keep the observer registered for the lifetime of the store.
    pub fn detach(mut self) {
        self.id.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let (Some(id), Some(store)) = (self.id.take(), self.store.upgrade()) {
            store
                .observers
                .lock()
                .retain(|(observer_id, _)| *observer_id != id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FakeWritingModel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_loading_tracks_overlapping_requests() {
        let store = AnalysisStore::new();
        store.begin_request();
        store.begin_request();
        assert_eq!(store.state().pending_requests, 2);

        store.complete_request();
        assert!(store.state().is_loading());

        store.complete_analysis(Ok(FakeWritingModel::sample_analysis()));
        let state = store.state();
        assert!(!state.is_loading());
        assert_eq!(state.analysis.unwrap().tone.name, "confident");
    }

    #[test]
    fn test_failure_clears_previous_analysis() {
        let store = AnalysisStore::new();
        store.begin_request();
        store.complete_analysis(Ok(FakeWritingModel::sample_analysis()));

        store.begin_request();
        store.complete_analysis(Err("boom".into()));
        let state = store.state();
        assert_eq!(state.error.as_deref(), Some("boom"));
        assert_eq!(state.analysis, None);

        store.begin_request();
        assert_eq!(store.state().error, None);
    }

    #[test]
    fn test_reported_error_keeps_requests_and_analysis() {
        let store = AnalysisStore::new();
        store.begin_request();
        store.complete_analysis(Ok(FakeWritingModel::sample_analysis()));
        store.begin_request();

        store.report_error("bad selection");
        let state = store.state();
        assert_eq!(state.error.as_deref(), Some("bad selection"));
        assert_eq!(state.pending_requests, 1);
        assert!(state.analysis.is_some());
    }

    #[test]
    fn test_tone_color_defaults_to_neutral() {
        let store = AnalysisStore::new();
        assert_eq!(store.state().tone_color(), ToneColor::Neutral);
    }

    #[test]
    fn test_dropping_subscription_stops_notifications() {
        let store = AnalysisStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subscription = store.subscribe({
            let seen = seen.clone();
            move |state| seen.lock().push(state.pending_requests)
        });
        store.begin_request();
        store.complete_request();
        drop(subscription);
        store.begin_request();

        assert_eq!(*seen.lock(), vec![1, 0]);
    }

    #[test]
    fn test_observer_can_read_store() {
        let store = AnalysisStore::new();
        let seen = Arc::new(Mutex::new(None));
        store
            .subscribe({
                let store = store.clone();
                let seen = seen.clone();
                move |_| *seen.lock() = Some(store.state().is_loading())
            })
            .detach();

        store.begin_request();
        assert_eq!(*seen.lock(), Some(true));
    }
}
