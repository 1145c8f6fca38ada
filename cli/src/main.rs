//! CLI entrypoint for polis
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::Parser;
use polis_application::{
    CommunityStore, FileStorePort, KnowledgeLookupPort, NoProgress, NoTranscriptLogger, Orchestrator,
    RoundProgressNotifier, RunPassUseCase, SharedInterface, ToolDispatcher, TranscriptLogger,
};
use polis_domain::community_tool_spec;
use polis_infrastructure::{
    ConfigLoader, FileConfig, InMemoryCommunityStore, JsonlTranscriptLogger, LocalFileStore,
    OllamaDecisionGateway, SqliteCommunityStore, StorageBackend, WikipediaLookup,
};
use polis_presentation::{
    Cli, ConsoleFormatter, OutputFormat, ProgressReporter, RunReport, SimpleProgress,
};
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    apply_overrides(&mut config, &cli);

    let problems = config.validate();
    if !problems.is_empty() {
        let list: Vec<String> = problems.iter().map(|p| format!("  - {}", p)).collect();
        bail!("Invalid configuration:\n{}", list.join("\n"));
    }

    // Keep the guard alive so buffered log lines are written on exit
    let _log_guard = init_logging(cli.verbose, &config);

    info!("Starting polis");

    // === Dependency Injection ===
    let store = open_store(&config).await?;
    let params = config.to_orchestrator_params();
    let tool_spec = community_tool_spec(params.knowledge_enabled);

    let gateway = Arc::new(OllamaDecisionGateway::new(config.ollama_settings()));
    match gateway.check_model_available().await {
        Ok(true) => {}
        Ok(false) => warn!(
            "Model {} is not listed by {}",
            config.model.name, config.model.server_url
        ),
        Err(e) => warn!("Could not reach the model server: {}", e),
    }

    let interface =
        Arc::new(SharedInterface::new(store).with_page_size(params.forum_page_size));

    let files: Arc<dyn FileStorePort> = Arc::new(
        LocalFileStore::new(&config.storage.uploads_dir).with_context(|| {
            format!(
                "Failed to prepare uploads directory {}",
                config.storage.uploads_dir.display()
            )
        })?,
    );
    let mut dispatcher = ToolDispatcher::new(Arc::clone(&interface), tool_spec.clone())
        .with_files(files);
    if config.knowledge.enabled {
        let knowledge: Arc<dyn KnowledgeLookupPort> =
            Arc::new(WikipediaLookup::new(config.knowledge.endpoint.clone()));
        dispatcher = dispatcher.with_knowledge(knowledge);
    }

    // An explicit transcript path wins; otherwise a log dir gets a timestamped transcript.
    let transcript = match (&config.logging.transcript_path, &config.logging.dir) {
        (Some(path), _) => JsonlTranscriptLogger::open(path),
        (None, Some(dir)) => JsonlTranscriptLogger::in_dir(dir, Utc::now()),
        (None, None) => None,
    };
    let logger: Arc<dyn TranscriptLogger> = match transcript {
        Some(logger) => {
            info!("Writing transcript to {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoTranscriptLogger),
    };

    let progress: Arc<dyn RoundProgressNotifier> = if cli.quiet {
        Arc::new(NoProgress)
    } else if std::io::stdout().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let pass = RunPassUseCase::new(Arc::clone(&gateway), tool_spec)
        .with_decision_timeout(params.decision_timeout)
        .with_logger(Arc::clone(&logger));

    let mut orchestrator = Orchestrator::new(pass, dispatcher, params)
        .with_progress(progress)
        .with_logger(logger);

    // First Ctrl-C finishes the in-flight agent and ends the run; a second one exits.
    let stop = orchestrator.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nStopping after the current agent... (Ctrl-C again to quit)");
            stop.cancel();
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    if !cli.quiet {
        println!();
        println!("+============================================================+");
        println!("|           Polis - LLM Agent Community                      |");
        println!("+============================================================+");
        println!();
        println!("Model: {} @ {}", config.model.name, config.model.server_url);
        println!(
            "Agents: {} | Store: {}",
            config.orchestrator.agent_count, config.storage.backend
        );
        println!();
    }

    let summary = orchestrator.start(config.orchestrator.agent_count).await;
    info!(
        "Run ended after {} rounds: {}",
        summary.rounds,
        summary.stop_reason.as_str()
    );

    let report = RunReport {
        model: config.model.name.clone(),
        summary,
        members: interface.members(false).await,
    };

    let output = match cli.output {
        OutputFormat::Text => ConsoleFormatter::format(&report),
        OutputFormat::Json => ConsoleFormatter::format_json(&report),
    };
    println!("{}", output);

    Ok(())
}

/// CLI flags take precedence over every config source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(agents) = cli.agents {
        config.orchestrator.agent_count = agents;
    }
    if cli.max_rounds.is_some() {
        config.orchestrator.max_rounds = cli.max_rounds;
    }
    if let Some(model) = &cli.model {
        config.model.name = model.clone();
    }
    if let Some(server) = &cli.server {
        config.model.server_url = server.clone();
    }
    if let Some(parallel) = cli.parallel {
        config.orchestrator.max_concurrent_decisions = parallel;
    }
    if let Some(path) = &cli.transcript {
        config.logging.transcript_path = Some(path.clone());
    }
}

/// Initialize logging based on verbosity level, optionally mirrored to a
/// daily log file under `[logging] dir`.
fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    match &config.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "polis.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(level))
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(level))
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

async fn open_store(config: &FileConfig) -> Result<Arc<dyn CommunityStore>> {
    let store: Arc<dyn CommunityStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryCommunityStore::new()),
        StorageBackend::Sqlite => {
            let path = &config.storage.sqlite_path;
            let store = SqliteCommunityStore::open(path)
                .await
                .with_context(|| format!("Failed to open SQLite store {}", path.display()))?;
            info!("Community store: {}", path.display());
            Arc::new(store)
        }
    };

    if config.storage.reset_on_start {
        store
            .clear_all()
            .await
            .context("Failed to reset the community store")?;
    }
    Ok(store)
}
