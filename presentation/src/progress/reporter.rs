//! Progress reporting for community rounds

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use polis_application::ports::progress::{RoundProgressNotifier, RoundSummary, TurnOutcome};
use std::sync::Mutex;

/// Reports progress with one bar per round
pub struct ProgressReporter {
    multi: MultiProgress,
    round_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            round_bar: Mutex::new(None),
        }
    }

    fn round_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Colored one-word marker for a turn outcome.
fn outcome_mark(outcome: TurnOutcome) -> String {
    match outcome {
        TurnOutcome::Completed => "v".green().to_string(),
        TurnOutcome::Stopped => "-".yellow().to_string(),
        TurnOutcome::Failed => "x".red().to_string(),
        TurnOutcome::Skipped => ".".dimmed().to_string(),
    }
}

/// One-line round totals, e.g. `12 ok, 1 stopped, 2 failed, 31 tool calls, 1 spawned`.
pub fn round_totals(summary: &RoundSummary) -> String {
    let mut parts = vec![format!("{} ok", summary.completed)];
    if summary.stopped > 0 {
        parts.push(format!("{} stopped", summary.stopped));
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }
    if summary.skipped > 0 {
        parts.push(format!("{} idle", summary.skipped));
    }
    parts.push(format!("{} tool calls", summary.tool_calls));
    if summary.spawned > 0 {
        parts.push(format!("{} spawned", summary.spawned));
    }
    if summary.interrupted {
        parts.push("interrupted".to_string());
    }
    parts.join(", ")
}

impl RoundProgressNotifier for ProgressReporter {
    fn on_round_start(&self, round: usize, eligible: usize) {
        let pb = self.multi.add(ProgressBar::new(eligible as u64));
        pb.set_style(Self::round_style());
        pb.set_prefix(format!("Round {}", round));
        pb.set_message("Starting...");

        if let Ok(mut bar) = self.round_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_turn(&self, _round: usize, agent: &str, outcome: TurnOutcome) {
        if let Ok(bar) = self.round_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            pb.set_message(format!("{} {}", outcome_mark(outcome), agent));
            pb.inc(1);
        }
    }

    fn on_round_complete(&self, summary: &RoundSummary) {
        if let Ok(mut bar) = self.round_bar.lock()
            && let Some(pb) = bar.take()
        {
            pb.finish_with_message(round_totals(summary).green().to_string());
        }
    }

    fn on_agent_spawned(&self, agent: &str, parent: Option<&str>) {
        if let Some(parent) = parent {
            let _ = self.multi.println(format!(
                "  {} {} (created by {})",
                "+".green(),
                agent.bold(),
                parent
            ));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl RoundProgressNotifier for SimpleProgress {
    fn on_round_start(&self, round: usize, eligible: usize) {
        println!(
            "{} {} ({} agents)",
            "->".cyan(),
            format!("Round {}", round).bold(),
            eligible
        );
    }

    fn on_agent_turn(&self, _round: usize, agent: &str, outcome: TurnOutcome) {
        if outcome != TurnOutcome::Skipped {
            println!("  {} {} ({})", outcome_mark(outcome), agent, outcome.as_str());
        }
    }

    fn on_round_complete(&self, summary: &RoundSummary) {
        println!("  {}\n", round_totals(summary).dimmed());
    }

    fn on_agent_spawned(&self, agent: &str, parent: Option<&str>) {
        if let Some(parent) = parent {
            println!("  {} {} (created by {})", "+".green(), agent.bold(), parent);
        }
    }
}
