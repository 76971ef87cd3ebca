//! Progress callbacks for a run.

use crate::models::Stage;

/// Receives stage transitions while a run is in flight.
pub trait ProgressNotifier: Send + Sync {
    /// Called when the run enters `stage`.
    fn on_stage(&self, stage: Stage);

    /// Called after each completion call made while in `stage` returns.
    fn on_call_complete(&self, stage: Stage);
}

/// Ignores every notification.
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_stage(&self, _stage: Stage) {}
    fn on_call_complete(&self, _stage: Stage) {}
}
