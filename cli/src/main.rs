//! CLI entrypoint for persona-chat
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use persona_chat_application::{
    CompletionGateway, ConversationLogger, ExchangeProgressNotifier, GatewayError, NoProgress,
    RetryingGateway, TurnController, TurnError,
};
use persona_chat_infrastructure::{ConfigLoader, FileConfig, GeminiGateway, JsonlConversationLogger};
use persona_chat_presentation::{
    ChatError, ChatRepl, Cli, ConsoleFormatter, OutputConfig, ProgressReporter, ReplConfig,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    info!("Starting persona-chat");

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config: {}", issue);
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    OutputConfig {
        color: config.output.color,
    }
    .apply();

    let registry = config
        .personas
        .build_registry()
        .context("Failed to build persona catalogue")?;

    if cli.list_personas {
        println!("{}", ConsoleFormatter::format_personas(&registry, None));
        return Ok(());
    }

    let persona = cli
        .persona
        .clone()
        .or_else(|| config.personas.default.clone())
        .unwrap_or_else(|| registry.default_persona().id().to_string());
    if !registry.contains(&persona) {
        bail!(
            "Unknown persona '{}'. Use --list-personas to see who is available.",
            persona
        );
    }

    // === Dependency Injection ===
    let behavior = config.behavior.to_behavior_config();
    let gemini = GeminiGateway::new(config.gemini.to_settings(behavior.timeout))
        .map_err(|e| anyhow!("Failed to set up Gemini client: {}", e))?;
    let gateway = RetryingGateway::new(gemini, behavior.retry.clone());

    check_credentials(&gateway, &config).await?;

    let mut controller = TurnController::new(Arc::new(gateway), Arc::new(registry), &persona)?
        .with_behavior(behavior);
    if let Some(logger) = conversation_logger(&config) {
        controller = controller.with_conversation_logger(logger);
    }

    if let Some(token) = &cli.resume {
        controller
            .resume(token)
            .context("Failed to resume conversation")?;
    }

    // Single message mode
    if let Some(message) = &cli.message {
        return send_once(&controller, message, cli.quiet).await;
    }

    let repl_config = ReplConfig {
        show_progress: config.repl.show_progress,
        history_file: config.repl.history_file.clone(),
    };
    let repl = ChatRepl::new(Arc::new(controller))
        .with_progress(repl_config.show_progress && !cli.quiet)
        .with_history_path(repl_config.history_path());

    match repl.run().await {
        Ok(()) => Ok(()),
        Err(ChatError::Fatal(e)) => Err(fatal(e, &config)),
        Err(e) => Err(e.into()),
    }
}

/// Install the stderr subscriber and, with `--log-file`, a file sink.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            let layer = fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new(if verbose < 2 { "debug" } else { level }));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Refuse to start with a missing or rejected key; other probe failures may
/// clear up by the time the first message is sent.
async fn check_credentials(gateway: &impl CompletionGateway, config: &FileConfig) -> Result<()> {
    match gateway.check_credentials().await {
        Ok(()) => Ok(()),
        Err(e @ GatewayError::Auth(_)) => Err(fatal(e, config)),
        Err(e) => {
            warn!("Could not verify Gemini credentials: {}", e);
            Ok(())
        }
    }
}

fn fatal(error: GatewayError, config: &FileConfig) -> anyhow::Error {
    anyhow!(
        "{}\nSet {} (or gemini.api_key in the config file) to a valid Gemini API key.",
        error,
        config.gemini.api_key_env
    )
}

fn conversation_logger(config: &FileConfig) -> Option<Arc<dyn ConversationLogger>> {
    let path = config.logging.conversation_log.as_ref()?;
    let logger = JsonlConversationLogger::open(path)?;
    info!(path = %logger.path().display(), "Writing conversation log");
    Some(Arc::new(logger))
}

async fn send_once<G: CompletionGateway + 'static>(
    controller: &TurnController<G>,
    message: &str,
    quiet: bool,
) -> Result<()> {
    let reporter = ProgressReporter::new();
    let progress: &dyn ExchangeProgressNotifier = if quiet { &NoProgress } else { &reporter };

    let speaker = controller
        .registry()
        .get(controller.active_persona().as_str())
        .map(|p| p.display_name().to_string())?;

    match controller.submit_with_progress(message, progress).await {
        Ok(outcome) => {
            println!("{}", ConsoleFormatter::format_turn(outcome.turn(), &speaker));
            Ok(())
        }
        Err(TurnError::Fatal(e)) => Err(anyhow!("{}", e)),
        Err(e) => Err(e.into()),
    }
}
