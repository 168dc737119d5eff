//! TeamDeck CLI
//!
//! Command-line interface for the TeamDeck live dashboard.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{debug, info};

use teamdeck::classify::{classify, to_natural};
use teamdeck::config::{data_dir, Config};
use teamdeck::export::{self, ExportFormat};
use teamdeck::live::{ConnectionPhase, DashboardState, LiveClient, ReconnectPolicy};
use teamdeck::notify::{InboxWatcher, NotificationCenter, RawMessageWatcher};
use teamdeck::tui::App;

/// TeamDeck - Live dashboard for multi-agent teams
#[derive(Parser)]
#[command(name = "teamdeck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TEAMDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// WebSocket URL of the dashboard backend (overrides the config file)
    #[arg(long, global = true, env = "TEAMDECK_URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the TUI dashboard
    Dashboard {
        /// Refresh rate in milliseconds
        #[arg(long)]
        refresh: Option<u64>,
    },

    /// Stream classified messages and updates to stdout
    Watch {
        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// Classify a single message and print its natural-language form
    Classify {
        /// Message text (plain or a JSON envelope)
        text: String,

        /// Precomputed summary to prefer for plain text
        #[arg(long)]
        summary: Option<String>,
    },

    /// Export dashboard data to a file
    Export {
        /// What to export
        #[arg(value_enum)]
        what: ExportTarget,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,

        /// Output file (defaults to `<what>-<date>.<ext>`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Restrict to one team
        #[arg(long)]
        team: Option<String>,

        /// Restrict messages to one agent's inbox
        #[arg(long)]
        agent: Option<String>,

        /// How long to wait for data
        #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum ExportTarget {
    Teams,
    Tasks,
    Messages,
    Outputs,
}

impl ExportTarget {
    fn stem(self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::Tasks => "tasks",
            Self::Messages => "messages",
            Self::Outputs => "outputs",
        }
    }

    fn is_loaded(self, state: &DashboardState) -> bool {
        let snapshot = &state.snapshot;
        match self {
            Self::Teams | Self::Tasks => !snapshot.teams.is_empty(),
            Self::Messages => !snapshot.all_inboxes.is_empty(),
            Self::Outputs => !snapshot.agent_outputs.is_empty(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.url.clone() {
        config.server.url = url;
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    // The dashboard owns the terminal, so its logs go to a file
    let _log_guard = match &cli.command {
        Commands::Dashboard { .. } => match init_file_logging(&config) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Error setting up logging: {e}");
                return ExitCode::FAILURE;
            }
        },
        _ => {
            init_logging(&config);
            None
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Dashboard { refresh } => run_dashboard(config, refresh).await,
        Commands::Watch { json } => run_watch(config, json).await,
        Commands::Classify { text, summary } => {
            run_classify(&text, summary.as_deref());
            Ok(())
        }
        Commands::Export {
            what,
            format,
            output,
            team,
            agent,
            timeout,
        } => run_export(config, what, format, output, team.as_deref(), agent.as_deref(), timeout).await,
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn env_filter(config: &Config) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level))
}

fn init_logging(config: &Config) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(std::io::stderr);
    if config.logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_file_logging(config: &Config) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = data_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "teamdeck.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let registry = tracing_subscriber::registry().with(env_filter(config));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    if config.logging.format == "json" {
        registry.with(layer.json()).init();
    } else {
        registry.with(layer).init();
    }

    info!("Starting teamdeck v{}", env!("CARGO_PKG_VERSION"));
    info!(log_dir = %log_dir.display(), "Logging to file");
    Ok(guard)
}

fn connect(config: &Config) -> anyhow::Result<LiveClient> {
    let policy = ReconnectPolicy::from(&config.reconnect);
    debug!(url = %config.server.url, ?policy, "Opening live connection");
    Ok(LiveClient::connect(&config.server.url, policy)?)
}

async fn run_dashboard(mut config: Config, refresh: Option<u64>) -> anyhow::Result<()> {
    if let Some(refresh) = refresh {
        config.tui.refresh_rate_ms = refresh;
    }
    info!(
        url = %config.server.url,
        refresh_ms = config.tui.refresh_rate_ms,
        "Starting TUI dashboard"
    );

    let live = connect(&config)?;
    let notifications = NotificationCenter::with_store(
        config.notifications.store_path(),
        config.notifications.max_stored,
    );
    let mut app = App::new(&config, notifications);
    let result = app.run(&live).await;
    live.close().await;
    Ok(result?)
}

async fn run_watch(config: Config, json: bool) -> anyhow::Result<()> {
    let live = connect(&config)?;
    let mut state_rx = live.subscribe();
    let mut raw_watcher = RawMessageWatcher::new();
    let mut inbox_watcher = InboxWatcher::new();
    let mut seen_revision = 0;
    let mut last_phase = ConnectionPhase::Idle;

    if !json {
        println!("Watching {} (Ctrl+C to stop)", live.url());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
        let state = state_rx.borrow_and_update().clone();

        if state.phase != last_phase {
            last_phase = state.phase;
            if json {
                println!(
                    "{}",
                    json!({
                        "event": "connection",
                        "phase": state.phase,
                        "attempts": state.reconnect_attempts,
                        "error": state.last_error,
                    })
                );
            } else {
                match &state.last_error {
                    Some(err) if !state.is_connected => {
                        println!("[{}] {err}", state.status_label());
                    }
                    _ => println!("[{}]", state.status_label()),
                }
            }
        }

        if state.revision == seen_revision {
            continue;
        }
        seen_revision = state.revision;

        if let Some(draft) = state.last_raw_message.as_ref().and_then(|raw| raw_watcher.observe(raw)) {
            if json {
                println!(
                    "{}",
                    json!({
                        "event": "update",
                        "kind": draft.kind.unwrap_or_default().as_str(),
                        "title": draft.title,
                        "message": draft.message,
                        "team": draft.team,
                    })
                );
            } else {
                println!("* {}: {}", draft.title, draft.message);
            }
        }

        for alert in inbox_watcher.observe(&state.snapshot.all_inboxes) {
            let natural = alert.classification();
            if json {
                println!(
                    "{}",
                    json!({
                        "event": "message",
                        "team": alert.team,
                        "from": alert.from,
                        "to": alert.agent,
                        "category": natural.category,
                        "text": natural.text,
                    })
                );
            } else {
                println!(
                    "{} [{}] {}: {}",
                    alert.team,
                    natural.category,
                    alert.title(),
                    natural.text
                );
            }
        }
    }

    live.close().await;
    Ok(())
}

fn run_classify(text: &str, summary: Option<&str>) {
    let natural = to_natural(text, summary);
    println!("category: {}", classify(text));
    println!("display:  {} ({})", natural.text, natural.category);
}

async fn run_export(
    config: Config,
    what: ExportTarget,
    format: ExportFormat,
    output: Option<PathBuf>,
    team: Option<&str>,
    agent: Option<&str>,
    timeout: Duration,
) -> anyhow::Result<()> {
    let live = connect(&config)?;
    let mut state_rx = live.subscribe();

    let waited = tokio::time::timeout(timeout, state_rx.wait_for(|s| what.is_loaded(s))).await;
    let state = match waited {
        Ok(Ok(state)) => state.clone(),
        Ok(Err(_)) => bail!("live connection ended before any {} arrived", what.stem()),
        Err(_) => {
            let state = live.state();
            live.close().await;
            match state.last_error {
                Some(err) => bail!("no {} received within {timeout:?}: {err}", what.stem()),
                None => bail!("no {} received within {timeout:?}", what.stem()),
            }
        }
    };
    live.close().await;

    let Some(contents) = render_export(&state, what, format, team, agent)? else {
        println!("Nothing to export");
        return Ok(());
    };

    let path = output.unwrap_or_else(|| {
        PathBuf::from(export::default_filename(
            what.stem(),
            format.extension(),
            chrono::Local::now().date_naive(),
        ))
    });
    export::write_export(&path, &contents)?;
    println!("Wrote {}", display_path(&path));
    Ok(())
}

fn render_export(
    state: &DashboardState,
    what: ExportTarget,
    format: ExportFormat,
    team: Option<&str>,
    agent: Option<&str>,
) -> anyhow::Result<Option<String>> {
    let snapshot = &state.snapshot;
    let teams: Vec<_> = snapshot
        .teams
        .iter()
        .filter(|t| team.map_or(true, |name| t.name == name))
        .cloned()
        .collect();

    let contents = match (what, format) {
        (ExportTarget::Teams, ExportFormat::Json) => Some(export::to_json(&teams)?),
        (ExportTarget::Teams, ExportFormat::Csv) => export::to_csv(&export::team_rows(&teams)),
        (ExportTarget::Tasks, ExportFormat::Json) => Some(export::to_json(&export::task_rows(&teams, None))?),
        (ExportTarget::Tasks, ExportFormat::Csv) => export::to_csv(&export::task_rows(&teams, None)),
        (ExportTarget::Outputs, ExportFormat::Json) => Some(export::to_json(&snapshot.agent_outputs)?),
        (ExportTarget::Outputs, ExportFormat::Csv) => export::to_csv(&export::output_rows(&snapshot.agent_outputs)),
        (ExportTarget::Messages, format) => {
            let inboxes: Vec<(&String, &String, &teamdeck::models::AgentInbox)> = snapshot
                .all_inboxes
                .iter()
                .filter(|(name, _)| team.map_or(true, |t| t == name.as_str()))
                .flat_map(|(team_name, inboxes)| {
                    inboxes
                        .iter()
                        .filter(|(name, _)| agent.map_or(true, |a| a == name.as_str()))
                        .map(move |(agent_name, inbox)| (team_name, agent_name, inbox))
                })
                .collect();
            if inboxes.iter().all(|(_, _, inbox)| inbox.messages.is_empty()) {
                None
            } else if format == ExportFormat::Json {
                let records: Vec<_> = inboxes
                    .iter()
                    .map(|(team_name, agent_name, inbox)| {
                        json!({"teamName": team_name, "agentName": agent_name, "messages": inbox.messages})
                    })
                    .collect();
                Some(export::to_json(&records)?)
            } else {
                let mut out = String::new();
                for (team_name, agent_name, inbox) in inboxes.iter().filter(|(_, _, i)| !i.messages.is_empty()) {
                    let csv = export::messages_to_csv(team_name, agent_name, &inbox.messages);
                    if out.is_empty() {
                        out = csv;
                    } else if let Some((_, rows)) = csv.split_once('\n') {
                        out.push('\n');
                        out.push_str(rows);
                    }
                }
                Some(out)
            }
        }
    };
    Ok(contents)
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "teamdeck", &mut io::stdout());
}
