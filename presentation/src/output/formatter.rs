//! Output formatter trait

use polis_application::RunSummary;
use polis_domain::AgentRecord;

/// Everything shown when a run ends.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub model: String,
    pub summary: RunSummary,
    /// Registry records, active or not.
    pub members: Vec<AgentRecord>,
}

/// Trait for formatting run reports
pub trait OutputFormatter {
    fn format(&self, report: &RunReport) -> String;

    fn format_json(&self, report: &RunReport) -> String;
}
