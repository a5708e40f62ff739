//! CLI entrypoint for agora
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use agora_application::{
    ArtifactClient, ConversationLogger, DecisionPolicy, NoConversationLogger, Notifier,
    PersistenceSynchronizer, PromptedGenerationClient, SessionCatalog, SessionCommand,
    SessionController, SessionStore, TurnExecutor,
};
use agora_domain::participant::presets::council;
use agora_domain::{Message, ParticipantId, PhaseGuard, Session, SessionId, SessionMode};
use agora_infrastructure::{
    ConfigLoader, FileConfig, JsonFileSessionStore, JsonlConversationLogger,
    OpenAiCompatibleGateway,
};
use agora_presentation::{ChatRepl, Cli, ConsoleFormatter, ConsoleNotifier};
use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Council used when neither --council nor --participant is given
const DEFAULT_COUNCIL: &str = "startup";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).map_err(|e| anyhow!("{e}"))?
    };
    config.validate().context("Invalid configuration")?;

    let _log_guard = init_tracing(cli.verbose, &config)?;
    info!("Starting agora");

    let registry = Arc::new(config.participant_registry());

    if cli.participants {
        print_participants(&registry);
        return Ok(());
    }

    // === Persistence ===
    let local_dir = config.storage.local_dir();
    let local: Arc<dyn SessionStore> = Arc::new(JsonFileSessionStore::new(&local_dir));
    let mut sync = PersistenceSynchronizer::new(local);
    if let Some(remote_dir) = &config.storage.remote_dir {
        info!("Mirroring sessions to {}", remote_dir.display());
        sync = sync.with_remote(Arc::new(JsonFileSessionStore::new(remote_dir)));
    }
    let sync = Arc::new(sync);

    // === Generation ===
    let api_key = config.generation.api_key();
    if api_key.is_none() {
        warn!(
            "{} is not set; requests to {} are sent without credentials",
            config.generation.api_key_env, config.generation.base_url
        );
    }
    let gateway = OpenAiCompatibleGateway::new(&config.generation.base_url, &config.generation.model)
        .with_api_key(api_key);
    let client = Arc::new(
        PromptedGenerationClient::new(Arc::new(gateway)).with_params(config.generation_params()),
    );

    let catalog = SessionCatalog::new(sync.clone(), registry.clone()).with_artifacts(client.clone());

    if cli.list {
        let sessions = catalog.list().await?;
        println!("{}", ConsoleFormatter::format_session_list(&sessions));
        return Ok(());
    }

    if let Some(id) = &cli.delete {
        catalog.delete(&SessionId::from(id.as_str())).await?;
        sync.flush().await;
        println!("Deleted session {id}");
        return Ok(());
    }

    // === Session ===
    let (session, messages) = match &cli.session {
        Some(id) => catalog.open(&SessionId::from(id.as_str())).await?,
        None => (catalog.create(new_session(&cli)?).await?, Vec::new()),
    };

    if let Some(path) = &cli.minutes {
        write_minutes(client.as_ref(), &registry, &session, &messages, path).await?;
        return Ok(());
    }

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let conversation_logger = conversation_logger(&config, &session.id);
    let params = config.orchestrator_params();

    let policy = DecisionPolicy::new(
        client.clone(),
        PhaseGuard::new(params.min_turns_before_phase_advance),
    );
    let executor = TurnExecutor::new(policy, client.clone(), sync.clone(), params)
        .with_notifier(notifier.clone())
        .with_conversation_logger(conversation_logger.clone());
    let handle = SessionController::new(
        session,
        messages,
        registry.clone(),
        executor,
        client.clone(),
        sync.clone(),
    )?
    .with_notifier(notifier)
    .with_conversation_logger(conversation_logger)
    .spawn();

    if sync.has_remote() {
        handle.send(SessionCommand::Reconcile)?;
    }
    if let Some(message) = cli.message.clone() {
        handle.send_message(message)?;
    }

    let formatter = ConsoleFormatter::new().with_rationale(config.repl.show_rationale && !cli.quiet);
    ChatRepl::new(handle, registry)
        .with_formatter(formatter)
        .with_history_file(config.repl.history_file.as_deref().map(PathBuf::from))
        .run()
        .await?;

    sync.flush().await;
    Ok(())
}

/// Install the tracing subscriber; the guard must live until exit
fn init_tracing(verbose: u8, config: &FileConfig) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    match &config.logging.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "agora.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn conversation_logger(config: &FileConfig, id: &SessionId) -> Arc<dyn ConversationLogger> {
    if !config.logging.conversation_log {
        return Arc::new(NoConversationLogger);
    }
    match JsonlConversationLogger::for_session(config.logging.resolved_log_dir(), id) {
        Some(logger) => {
            info!("Conversation transcript: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    }
}

fn new_session(cli: &Cli) -> Result<Session> {
    let preset = match &cli.council {
        Some(id) => Some(council(id).ok_or_else(|| anyhow!("Unknown council preset: {id}"))?),
        None if cli.participant.is_empty() => council(DEFAULT_COUNCIL),
        None => None,
    };

    let participants: Vec<ParticipantId> = match preset {
        Some(preset) => preset.participant_ids(),
        None => cli
            .participant
            .iter()
            .map(|id| ParticipantId::from(id.as_str()))
            .collect(),
    };
    if cli.direct && participants.len() != 1 {
        bail!(
            "--direct needs exactly one participant (-p <id>), got {}",
            participants.len()
        );
    }

    let title = cli
        .title
        .clone()
        .or_else(|| preset.map(|p| p.title.to_string()))
        .unwrap_or_else(|| "New conversation".to_string());
    let context = cli
        .context
        .clone()
        .or_else(|| preset.map(|p| p.context.to_string()))
        .unwrap_or_default();
    let mode = if cli.direct {
        SessionMode::Direct
    } else {
        SessionMode::Council
    };

    Ok(Session::new(title, participants)
        .with_context(context)
        .with_mode(mode))
}

async fn write_minutes(
    client: &dyn ArtifactClient,
    registry: &agora_domain::ParticipantRegistry,
    session: &Session,
    messages: &[Message],
    path: &PathBuf,
) -> Result<()> {
    if messages.is_empty() {
        bail!("Session {} has no messages yet", session.id);
    }
    let minutes = client
        .meeting_minutes(messages, registry, &session.title)
        .await?;
    std::fs::write(path, minutes)
        .with_context(|| format!("Could not write {}", path.display()))?;
    println!("Minutes saved to {}", path.display());
    Ok(())
}

fn print_participants(registry: &agora_domain::ParticipantRegistry) {
    println!("Participants:");
    for participant in registry.all() {
        println!("{}", ConsoleFormatter::format_participant(participant));
    }
    println!();
    println!("Councils:");
    for preset in agora_domain::COUNCILS.iter() {
        println!(
            "  {:<14} {} ({})",
            preset.id,
            preset.title,
            preset.participants.join(", ")
        );
    }
}
