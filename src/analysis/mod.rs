pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod profile;
pub mod quality;
pub mod rules;
#[cfg(test)]
pub(crate) mod testing;

pub use error::AnalysisError;
pub use pipeline::{ProfileProvider, SkinAnalyzer};
pub use profile::AnalysisPayload;
pub use rules::RuleTable;
