//! Output rendering.
//!
//! Terminal output, saved reports and the progress spinner.

pub mod generator;
pub mod progress;

pub use generator::{render_intermediate, write_report};
pub use progress::SpinnerProgress;
