//! The writing assistant behind the editor.
//!
//! Edits flow through a debounced [`AnalysisPipeline`] into a
//! [`WritingModel`]; results land in an [`AnalysisStore`] that the UI
//! observes. [`WriterSession`] ties the document, the platform seams, and
//! the rewrite/apply actions together.

pub mod analysis;
pub mod model;
pub mod pipeline;
pub mod prompts;
pub mod session;
pub mod store;

pub use analysis::{AnalysisResult, GrammarMistake, Tone};
pub use model::{GoogleWritingModel, ModelError, WritingModel};
pub use pipeline::{ANALYSIS_ERROR_MESSAGE, AnalysisPipeline, AnalysisPipelineConfig};
pub use prompts::TransformAction;
pub use session::{SessionPlatform, TransformError, TransformFailure, WriterSession};
pub use store::{AnalysisState, AnalysisStore, Subscription};

#[cfg(any(test, feature = "test-support"))]
pub use model::FakeWritingModel;
