mod commands;
mod console;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chatwarden_ai::{
    BackendError, CompletionBackend, NlpAvailability, NlpResponder, OpenAiBackend,
    OpenAiModerationScorer,
};
use chatwarden_core::{
    ChatStore, Dispatcher, GatewayCaps, ModerationClassifier, ReminderScheduler, Responder,
};
use chatwarden_storage::Storage;

#[derive(Parser)]
#[command(name = "chatwarden", version, about = "Moderating conversational chat agent")]
struct Cli {
    /// Path to the database file.
    #[arg(long, global = true, default_value = "chatwarden.db")]
    db: PathBuf,

    /// Generation backend API key.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive console gateway.
    Run {
        /// User id to attribute console messages to.
        #[arg(long, default_value = "console-user")]
        user: String,
    },
    /// One-shot standalone generation for ad hoc testing.
    Ask {
        prompt: Vec<String>,
    },
    /// Show or update stored settings.
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings snapshot.
    Show,
    /// Update individual settings fields.
    Set(SetArgs),
}

#[derive(Args)]
struct SetArgs {
    #[arg(long)]
    context_awareness: Option<bool>,
    #[arg(long)]
    auto_moderation: Option<bool>,
    #[arg(long)]
    context_size: Option<usize>,
    #[arg(long)]
    nlp_model: Option<String>,
    #[arg(long)]
    temperature: Option<f32>,
    #[arg(long)]
    max_tokens: Option<u32>,
    #[arg(long)]
    command_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let storage = Arc::new(Storage::open(&cli.db)?);
    let api_key = cli.api_key.clone().unwrap_or_default();

    match cli.command {
        Commands::Run { user } => {
            let (dispatcher, _) = build_runtime(storage, &api_key).await;
            console::run(dispatcher, &user).await
        }
        Commands::Ask { prompt } => {
            let prompt = prompt.join(" ");
            if prompt.trim().is_empty() {
                println!("Usage: chatwarden ask <prompt>");
                return Ok(());
            }
            let (_, responder) = build_runtime(storage, &api_key).await;
            println!("{}", responder.generate_standalone(&prompt).await);
            Ok(())
        }
        Commands::Settings { action } => run_settings(storage, action),
    }
}

/// Wire up the dispatcher and responder against the opened storage.
async fn build_runtime(
    storage: Arc<Storage>,
    api_key: &str,
) -> (Arc<Dispatcher>, Arc<NlpResponder>) {
    let store: Arc<dyn ChatStore> = storage;

    let backend = Arc::new(OpenAiBackend::new(api_key));
    let availability = Arc::new(match backend.validate().await {
        Ok(()) => {
            info!("generation backend credentials validated");
            NlpAvailability::live()
        }
        Err(e @ BackendError::Config(_)) => {
            warn!(error = %e, "credential validation failed, starting in fallback mode");
            NlpAvailability::fallback()
        }
        Err(e) => {
            warn!(error = %e, "credential validation inconclusive, assuming live");
            NlpAvailability::live()
        }
    });

    let responder = Arc::new(NlpResponder::new(backend, store.clone(), availability));

    let scorer = Arc::new(OpenAiModerationScorer::new(api_key));
    let classifier = Arc::new(ModerationClassifier::new(scorer, store.clone()));
    let scheduler = Arc::new(ReminderScheduler::new(Arc::new(
        console::ConsoleReminderSink,
    )));
    let registry = Arc::new(commands::builtin_registry());

    let responder_dyn: Arc<dyn Responder> = responder.clone();
    let dispatcher = Arc::new(Dispatcher::new(
        store,
        registry,
        classifier,
        responder_dyn,
        scheduler,
        GatewayCaps::default(),
    ));

    (dispatcher, responder)
}

fn run_settings(storage: Arc<Storage>, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = storage.get_settings()?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set(args) => {
            let mut settings = storage.get_settings()?;
            if let Some(v) = args.context_awareness {
                settings.context_awareness = v;
            }
            if let Some(v) = args.auto_moderation {
                settings.auto_moderation = v;
            }
            if let Some(v) = args.context_size {
                settings.context_size = v;
            }
            if let Some(v) = args.nlp_model {
                settings.nlp_model = v;
            }
            if let Some(v) = args.temperature {
                settings.temperature = v;
            }
            if let Some(v) = args.max_tokens {
                settings.max_tokens = v;
            }
            if let Some(v) = args.command_prefix {
                settings.command_prefix = v;
            }
            storage.put_settings(&settings)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
