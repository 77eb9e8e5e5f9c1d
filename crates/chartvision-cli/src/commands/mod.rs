//! CLI 명령 구현.

pub mod analyze;
pub mod context;
pub mod query;

pub use analyze::run_analyze;
pub use context::{build_classifier, build_pipeline, connect_results};
pub use query::{run_patterns, run_predictions};
