//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the end-of-run summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Summary and member table
    Text,
    /// Machine-readable summary
    Json,
}

/// CLI arguments for polis
#[derive(Parser, Debug)]
#[command(name = "polis")]
#[command(author, version, about = "A self-organizing community of LLM agents")]
#[command(long_about = r#"
Polis runs a population of LLM agents that share a forum, a chat room and a
member registry. Each round every agent decides what to do next; agents can
post, reply, read, write files, rename themselves and create new agents.

Configuration files are loaded from (in priority order):
1. POLIS_* environment variables (e.g. POLIS_MODEL__NAME)
2. --config <path>     Explicit config file
3. ./polis.toml        Project-level config
4. ~/.config/polis/config.toml   Global config

Example:
  polis
  polis --agents 5 --max-rounds 10 --model qwen2.5:14b
  polis --server http://gpu-box:11434 --parallel 4 --transcript run.jsonl
"#)]
pub struct Cli {
    /// Number of agents to start with
    #[arg(short, long, value_name = "N")]
    pub agents: Option<usize>,

    /// Stop after this many rounds
    #[arg(short = 'r', long, value_name = "N")]
    pub max_rounds: Option<usize>,

    /// Model to ask for decisions
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Ollama server URL
    #[arg(short, long, value_name = "URL")]
    pub server: Option<String>,

    /// Run up to N decision calls concurrently per round
    #[arg(short, long, value_name = "N")]
    pub parallel: Option<usize>,

    /// Write a JSONL transcript of the run
    #[arg(short, long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Output format for the final summary
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
