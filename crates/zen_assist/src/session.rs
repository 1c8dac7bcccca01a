use std::ops::Range;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use parking_lot::Mutex;
use smol::{Executor, Task};
use zen_core::{
    EditorDocument, ManualSelection, MarkupCommandExecutor, PanelResizer,
    PersistentKeyValueStore, RichTextCommandExecutor, TextSelectionProvider, Theme,
    ToolbarCommand, ZenConfig, escape_text, strip_markup,
};

use crate::model::{ModelError, WritingModel};
use crate::pipeline::{AnalysisPipeline, AnalysisPipelineConfig};
use crate::prompts::TransformAction;
use crate::store::AnalysisStore;

/// A rewrite that failed. The document is left as it was.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransformError {
    pub action: String,
    /// User-facing message naming the action.
    pub message: String,
    #[source]
    pub source: TransformFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum TransformFailure {
    #[error("selection {0:?} does not fit the document")]
    InvalidSelection(Range<usize>),
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl TransformError {
    fn new(action: &TransformAction, source: impl Into<TransformFailure>) -> Self {
        let action = action.name().to_string();
        let source = source.into();
        let reason = match source {
            TransformFailure::InvalidSelection(_) => "The selection no longer matches the text.",
            TransformFailure::Model(_) => "Please try again.",
        };
        Self {
            message: format!("Failed to {} text. {reason}", action.to_lowercase()),
            action,
            source,
        }
    }
}

/// Host environment services used by a [`WriterSession`].
#[derive(Clone)]
pub struct SessionPlatform {
    pub selection: Arc<dyn TextSelectionProvider>,
    pub commands: Arc<dyn RichTextCommandExecutor>,
    pub preferences: Arc<dyn PersistentKeyValueStore>,
}

impl SessionPlatform {
    /// Platform without a native editing surface: explicit selection and
    /// markup-rewriting toolbar commands.
    pub fn headless(preferences: Arc<dyn PersistentKeyValueStore>) -> Self {
        Self {
            selection: Arc::new(ManualSelection::default()),
            commands: Arc::new(MarkupCommandExecutor),
            preferences,
        }
    }
}

/// One open editor: the document, its analysis, and the user's actions on it.
pub struct WriterSession {
    document: Mutex<EditorDocument>,
    model: Arc<dyn WritingModel>,
    pipeline: AnalysisPipeline,
    platform: SessionPlatform,
    theme: Mutex<Theme>,
    resizer: Mutex<PanelResizer>,
    more_actions_open: AtomicBool,
}

impl WriterSession {
    pub fn new(
        model: Arc<dyn WritingModel>,
        executor: Arc<Executor<'static>>,
        platform: SessionPlatform,
        config: &ZenConfig,
        initial_markup: impl Into<String>,
    ) -> Self {
        let pipeline = AnalysisPipeline::new(
            model.clone(),
            AnalysisStore::new(),
            executor,
            AnalysisPipelineConfig::from(config),
        );
        let theme = Theme::load(platform.preferences.as_ref());
        Self {
            document: Mutex::new(EditorDocument::new(initial_markup)),
            model,
            pipeline,
            theme: Mutex::new(theme),
            resizer: Mutex::new(PanelResizer::new(config.panel_width_percent)),
            more_actions_open: AtomicBool::new(false),
            platform,
        }
    }

    pub fn store(&self) -> &AnalysisStore {
        self.pipeline.store()
    }

    pub fn pipeline(&self) -> &AnalysisPipeline {
        &self.pipeline
    }

    pub fn markup(&self) -> String {
        self.document.lock().markup().to_string()
    }

    pub fn plain_text(&self) -> String {
        self.document.lock().plain_text()
    }

    /// Replace the document with what the user typed.
    pub fn set_content(&self, markup: impl Into<String>) -> bool {
        let changed = self.document.lock().set_markup(markup);
        if changed {
            self.document_changed();
        }
        changed
    }

    /// Analyze the current text right away, e.g. when the session opens.
    pub fn analyze_now(&self) -> Option<Task<()>> {
        let text = self.plain_text();
        self.pipeline.analyze_now(&text)
    }

    /// Rewrite the selection, or the whole document when nothing is selected.
    pub async fn transform_content(&self, action: &str) -> Result<(), TransformError> {
        self.more_actions_open.store(false, Ordering::SeqCst);
        let action = TransformAction::parse(action);

        let selection = self.platform.selection.selection();
        let target = {
            let document = self.document.lock();
            match &selection {
                Some(range) => document
                    .markup_in_range(range.clone())
                    .map(strip_markup)
                    .ok_or_else(|| range.clone()),
                None => Ok(document.plain_text()),
            }
        };
        let target = match target {
            Ok(target) => target,
            Err(range) => {
                let error = TransformError::new(&action, TransformFailure::InvalidSelection(range));
                log::warn!("{} skipped: {}", action.name(), error.source);
                self.store().report_error(error.message.clone());
                return Err(error);
            }
        };
        if target.trim().is_empty() {
            log::debug!("nothing to {}", action.name());
            return Ok(());
        }

        let store = self.store();
        store.begin_request();
        let result = self.model.transform_text(&target, action.name()).await;
        let rewritten = match result {
            Ok(rewritten) => rewritten,
            Err(error) => {
                log::error!("{} failed: {error}", action.name());
                let error = TransformError::new(&action, error);
                store.fail_request(error.message.clone());
                return Err(error);
            }
        };

        let applied = {
            let mut document = self.document.lock();
            match &selection {
                Some(range) => document
                    .replace_range(range.clone(), &rewritten)
                    .map(|inserted| {
                        self.platform.selection.set_selection(Some(inserted));
                        true
                    })
                    .ok_or_else(|| range.clone()),
                None => Ok(document.set_plain_text(&rewritten)),
            }
        };
        let changed = match applied {
            Ok(changed) => changed,
            Err(range) => {
                let error = TransformError::new(&action, TransformFailure::InvalidSelection(range));
                log::warn!("{} result dropped: {}", action.name(), error.source);
                store.fail_request(error.message.clone());
                return Err(error);
            }
        };
        store.complete_request();
        if changed {
            self.document_changed();
        }
        Ok(())
    }

    /// Replace the whole document with a suggestion.
    pub fn apply_suggestion(&self, suggestion: &str) -> bool {
        let changed = self.document.lock().set_plain_text(suggestion);
        if changed {
            self.document_changed();
        }
        changed
    }

    /// Replace the first occurrence of `mistake`, matched as a plain substring.
    /// Does nothing if it is gone.
    pub fn apply_grammar_correction(&self, mistake: &str, correction: &str) -> bool {
        let changed = self
            .document
            .lock()
            .replace_first(&escape_text(mistake), &escape_text(correction));
        if changed {
            self.document_changed();
        } else {
            log::debug!("{mistake:?} no longer in the document");
        }
        changed
    }

    pub fn exec_command(&self, command: &ToolbarCommand) -> Result<bool> {
        let selection = self.platform.selection.selection();
        let changed = {
            let mut document = self.document.lock();
            self.platform
                .commands
                .execute(command, &mut document, selection)?
        };
        if changed {
            self.document_changed();
        }
        Ok(changed)
    }

    pub fn theme(&self) -> Theme {
        *self.theme.lock()
    }

    /// Switch between light and dark and persist the choice.
    pub fn toggle_theme(&self) -> Result<Theme> {
        let theme = {
            let mut theme = self.theme.lock();
            *theme = theme.toggled();
            *theme
        };
        theme.save(self.platform.preferences.as_ref())?;
        Ok(theme)
    }

    pub fn toggle_more_actions(&self) -> bool {
        !self.more_actions_open.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn is_more_actions_open(&self) -> bool {
        self.more_actions_open.load(Ordering::SeqCst)
    }

    pub fn panel_width_percent(&self) -> f32 {
        self.resizer.lock().width_percent()
    }

    pub fn begin_resize(&self) {
        self.resizer.lock().begin_drag();
    }

    pub fn resize_to(&self, cursor_x: f32, viewport_width: f32) -> f32 {
        self.resizer.lock().drag_to(cursor_x, viewport_width)
    }

    pub fn end_resize(&self) {
        self.resizer.lock().end_drag();
    }

    fn document_changed(&self) {
        let text = self.plain_text();
        self.pipeline.content_changed(&text);
    }
}
