//! Console output formatter for run reports

use crate::output::formatter::{OutputFormatter, RunReport};
use colored::Colorize;
use polis_domain::AgentRecord;
use serde_json::json;

/// Formats run reports for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn format(report: &RunReport) -> String {
        let summary = &report.summary;
        let mut output = String::new();

        output.push_str(&Self::header("Polis Run Summary"));
        output.push('\n');

        output.push_str(&format!("{} {}\n", "Model:".cyan().bold(), report.model));
        output.push_str(&format!(
            "{} {} ({})\n",
            "Rounds:".cyan().bold(),
            summary.rounds,
            summary.stop_reason.as_str()
        ));
        output.push_str(&format!(
            "{} {} agents, {} still running\n",
            "Population:".cyan().bold(),
            summary.population,
            summary.running
        ));

        let (active, departed): (Vec<_>, Vec<_>) =
            report.members.iter().partition(|record| record.active);

        output.push_str(&Self::section_header(&format!("Active members ({})", active.len())));
        for record in &active {
            output.push_str(&Self::member_line(record));
        }

        if !departed.is_empty() {
            output.push_str(&Self::section_header(&format!("Departed ({})", departed.len())));
            for record in &departed {
                output.push_str(&Self::member_line(record));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    pub fn format_json(report: &RunReport) -> String {
        let summary = &report.summary;
        let value = json!({
            "model": report.model,
            "rounds": summary.rounds,
            "stop_reason": summary.stop_reason.as_str(),
            "population": summary.population,
            "running": summary.running,
            "members": report.members,
        });
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    fn member_line(record: &AgentRecord) -> String {
        let mut line = format!(
            "\n{} {}\n",
            format!("── {} ──", record.name).yellow().bold(),
            format!("[{}] joined {}", record.identity.short(), record.joined_at.format("%H:%M:%S"))
                .dimmed()
        );
        line.push_str(&Self::indent(&record.persona, "  "));
        line.push('\n');
        if let Some(thought) = record.thoughts.iter().last() {
            line.push_str(&format!("  {} {}\n", "thinking:".dimmed(), thought));
        }
        if let Some(left) = record.left_at {
            line.push_str(&format!("  {} {}\n", "left:".dimmed(), left.format("%H:%M:%S")));
        }
        line
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, report: &RunReport) -> String {
        Self::format(report)
    }

    fn format_json(&self, report: &RunReport) -> String {
        Self::format_json(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use polis_application::{RunSummary, StopReason};
    use polis_domain::{AgentKey, Credential};

    fn report() -> RunReport {
        let key = AgentKey::new(Credential::new("secret").identity(), "Ada");
        let mut active = AgentRecord::joined(&key, "Curious.\nLikes maps.", Utc::now());
        active.thoughts.push("first");
        active.thoughts.push("latest idea");

        let mut gone = AgentRecord::joined(&key.renamed("Grace"), "Quiet.", Utc::now());
        gone.active = false;
        gone.left_at = Some(Utc::now());

        RunReport {
            model: "llama3.1:8b".to_string(),
            summary: RunSummary {
                rounds: 3,
                stop_reason: StopReason::MaxRounds,
                population: 2,
                running: 1,
            },
            members: vec![active, gone],
        }
    }

    #[test]
    fn test_console_lists_members() {
        colored::control::set_override(false);
        let text = ConsoleFormatter::format(&report());

        assert!(text.contains("Rounds: 3 (round limit reached)"));
        assert!(text.contains("Active members (1)"));
        assert!(text.contains("Departed (1)"));
        assert!(text.contains("  Curious.\n  Likes maps."));
        assert!(text.contains("thinking: latest idea"));
        assert!(!text.contains("thinking: first"));
    }

    #[test]
    fn test_json_report() {
        let value: serde_json::Value =
            serde_json::from_str(&ConsoleFormatter::format_json(&report())).unwrap();

        assert_eq!(value["rounds"], 3);
        assert_eq!(value["stop_reason"], "round limit reached");
        assert_eq!(value["members"].as_array().unwrap().len(), 2);
        assert_eq!(value["members"][0]["name"], "Ada");
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "> "), "> a\n> b");
    }
}
