//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to observe a
//! request as it moves through the pipeline. The CLI uses it to drive a
//! spinner; a server could forward the events to a log or a socket.
//!
//! # Example
//!
//! ```rust
//! use sdg_insights::{AnalysisConfig, AnalysisProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl AnalysisProgressCallback for PrintStages {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {}", stage);
//!     }
//! }
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(Arc::new(PrintStages))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::AnalysisError;
use crate::output::AnalysisResult;
use std::fmt;
use std::sync::Arc;

/// One step of the analysis pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validate,
    Acquire,
    BuildPrompt,
    Extract,
    Decode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validate => "Validating input",
            Stage::Acquire => "Acquiring paper",
            Stage::BuildPrompt => "Building prompt",
            Stage::Extract => "Extracting insights",
            Stage::Decode => "Decoding response",
        };
        f.write_str(s)
    }
}

/// Called by the pipeline as a request progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for concurrent requests may arrive from
/// different threads.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once with the final result.
    fn on_analysis_complete(&self, result: &AnalysisResult) {
        let _ = result;
    }

    /// Called once when the request fails; no further events follow.
    fn on_analysis_error(&self, error: &AnalysisError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::fixtures::sample_result;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        outcome: Mutex<Option<String>>,
    }

    impl AnalysisProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_analysis_complete(&self, result: &AnalysisResult) {
            *self.outcome.lock().unwrap() = Some(format!("ok:{}", result.sdg_primary));
        }

        fn on_analysis_error(&self, error: &AnalysisError) {
            *self.outcome.lock().unwrap() = Some(format!("err:{error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Validate);
        cb.on_analysis_complete(&sample_result());
        cb.on_analysis_error(&AnalysisError::invalid_input("x"));
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Validate);
        rec.on_stage_start(Stage::Acquire);
        rec.on_analysis_complete(&sample_result());
        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![Stage::Validate, Stage::Acquire]
        );
        assert_eq!(rec.outcome.lock().unwrap().as_deref(), Some("ok:13"));

        rec.on_analysis_error(&AnalysisError::invalid_input("bad"));
        assert_eq!(rec.outcome.lock().unwrap().as_deref(), Some("err:bad"));
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Extract);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Extract.to_string(), "Extracting insights");
    }
}
