//! Parley CLI — a minimal chat relay for a local language model.
//!
//! `parley serve` runs the relay; `parley chat` and `parley ask` talk to one.

mod client;
mod setup;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::*;
use tracing_subscriber::EnvFilter;

use parley_core::config::ParleyConfig;
use parley_core::orchestrator::ChatOrchestrator;
use parley_core::session::SessionStore;
use parley_hub::api::ApiState;
use parley_hub::backends::{FallbackBackend, OllamaBackend};

use client::{DEFAULT_URL, RelayClient, request_timeout};

const DEFAULT_SESSION: &str = "default-session";

// ─── CLI Definition ────────────────────────────────────────

/// Parley — relay chat turns to a locally hosted language model
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 🌐 Start the relay server (POST /chat, GET /ws)
    Serve {
        /// Host to bind to
        #[arg(long, env = "PARLEY_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "PARLEY_PORT")]
        port: Option<u16>,

        /// Model to complete with
        #[arg(short, long, env = "PARLEY_MODEL")]
        model: Option<String>,

        /// Model server base URL
        #[arg(long, env = "PARLEY_API_BASE")]
        api_base: Option<String>,

        /// Seconds before a completion call is abandoned
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Turns kept per session
        #[arg(long)]
        max_turns: Option<usize>,
    },

    /// 💬 Interactive chat against a running relay
    Chat {
        /// Relay base URL
        #[arg(long, env = "PARLEY_URL", default_value = DEFAULT_URL)]
        url: String,

        /// Session to chat in
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,

        /// Seconds to wait for a reply (default: backend timeout plus a margin)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// ❓ Send a single message and print the reply
    Ask {
        /// The message to send
        message: String,

        /// Relay base URL
        #[arg(long, env = "PARLEY_URL", default_value = DEFAULT_URL)]
        url: String,

        /// Session to send in
        #[arg(short, long, default_value = DEFAULT_SESSION)]
        session: String,

        /// Seconds to wait for a reply (default: backend timeout plus a margin)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// ⚙️  Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key to set (e.g. model, api_base, port, max_turns)
        key: String,
        /// Value to set
        value: String,
    },
    /// Print the config file location
    Path,
}

// ─── Helpers ───────────────────────────────────────────────

fn print_banner() {
    let version = env!("CARGO_PKG_VERSION");
    println!();
    println!("{}", "    ╔══════════════════════════════════════╗".cyan());
    println!("{}", format!("    ║          💬 Parley v{:<8}         ║", version).cyan());
    println!("{}", "    ║   a tiny relay for your local LLM    ║".cyan());
    println!("{}", "    ╚══════════════════════════════════════╝\n".cyan());
}

/// Log to stdout. Used by the server, whose terminal is its log.
fn init_stdout_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .init();
}

/// Log to a daily file so interactive output stays clean.
fn init_file_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = setup::data_dir().join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&log_dir, "parley.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();

    guard
}

/// How long `chat` and `ask` wait for the relay. Without a flag, outlast the
/// configured backend timeout so the relay's fallback reply gets through.
fn client_timeout(timeout_secs: Option<u64>) -> anyhow::Result<Duration> {
    Ok(match timeout_secs {
        Some(secs) => Duration::from_secs(secs),
        None => request_timeout(setup::load_config()?.backend.timeout()),
    })
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,parley_core=debug,parley_hub=debug"))
}

// ─── Main ──────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = match &cli.command {
        Commands::Serve { .. } => {
            init_stdout_logging();
            None
        }
        _ => Some(init_file_logging()),
    };

    match cli.command {
        Commands::Serve {
            host,
            port,
            model,
            api_base,
            timeout_secs,
            max_turns,
        } => {
            let mut config = setup::load_config()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(model) = model {
                config.backend.model = model;
            }
            if let Some(api_base) = api_base {
                config.backend.api_base = api_base;
            }
            if let Some(secs) = timeout_secs {
                config.backend.timeout_secs = secs;
            }
            if let Some(turns) = max_turns {
                config.session.max_turns = turns;
            }
            run_serve(config).await?;
        }

        Commands::Chat {
            url,
            session,
            timeout_secs,
        } => {
            let relay = RelayClient::new(&url, client_timeout(timeout_secs)?)?;
            run_chat(&relay, &session).await?;
        }

        Commands::Ask {
            message,
            url,
            session,
            timeout_secs,
        } => {
            let relay = RelayClient::new(&url, client_timeout(timeout_secs)?)?;
            run_ask(&relay, &session, &message).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => setup::run_config_show()?,
            ConfigAction::Set { key, value } => setup::run_config_set(&key, &value)?,
            ConfigAction::Path => {
                println!("{}", ParleyConfig::default_path().display());
            }
        },
    }

    Ok(())
}

// ─── Command Handlers ──────────────────────────────────────

async fn run_serve(config: ParleyConfig) -> anyhow::Result<()> {
    if config.backend.provider != "ollama" {
        anyhow::bail!(
            "Unsupported backend provider: {} (supported: ollama)",
            config.backend.provider
        );
    }

    let backend_config = config.backend.clone();
    let timeout = backend_config.timeout();
    let fallbacks = backend_config.fallback_models.clone();
    let backend = FallbackBackend::new(OllamaBackend::new(backend_config)?, fallbacks);

    let store = Arc::new(SessionStore::with_max_turns(config.session.max_turns));
    let chat = ChatOrchestrator::new(store, Arc::new(backend)).with_timeout(timeout);

    let available = chat.backend().is_available().await;
    if !available {
        tracing::warn!(
            "Model server at {} is not reachable; replies will fall back until it is",
            config.backend.api_base
        );
    }

    print_banner();
    println!("  {} {}", "Mode:".dimmed(), "🌐 Relay Server".green().bold());
    println!("  {} {}", "Backend:".dimmed(), config.backend.provider.cyan());
    println!("  {} {}", "Model:".dimmed(), config.backend.model.cyan());
    println!(
        "  {} {} {}",
        "Model server:".dimmed(),
        config.backend.api_base.cyan(),
        if available {
            "(reachable)".green()
        } else {
            "(not reachable yet, replies fall back until it is)".yellow()
        }
    );
    println!(
        "  {} {}",
        "Endpoint:".dimmed(),
        format!("http://{}:{}", config.server.host, config.server.port)
            .green()
            .bold()
    );
    println!();
    println!("  {}", "Endpoints:".bold());
    println!("    {} — Chat turn", "POST   /chat".cyan());
    println!("    {} — Chat over WebSocket", "GET    /ws".cyan());
    println!("    {} — Health check", "GET    /health".cyan());
    println!("    {} — Relay status", "GET    /status".cyan());
    println!("    {} — List sessions", "GET    /sessions".cyan());
    println!("    {} — Session history", "GET    /sessions/{id}".cyan());
    println!("    {} — Clear a session", "DELETE /sessions/{id}".cyan());
    println!();
    println!("  {}", "Example:".bold());
    println!(
        "    {}",
        format!(
            "curl -X POST http://{}:{}/chat -H 'Content-Type: application/json' -d '{{\"session_id\": \"demo\", \"message\": \"hello\"}}'",
            config.server.host, config.server.port
        )
        .dimmed()
    );
    println!();

    parley_hub::api::start_server(ApiState::new(chat), &config.server).await?;

    Ok(())
}

async fn run_chat(relay: &RelayClient, session: &str) -> anyhow::Result<()> {
    print_banner();
    println!("  {} {}", "Relay:".dimmed(), relay.base_url().green());
    println!("  {} {}", "Session:".dimmed(), session.green());
    println!();
    println!(
        "  {} {}",
        "Commands:".dimmed(),
        "/quit /clear /history /sessions /help".dimmed()
    );
    println!();

    loop {
        print!("{} ", "You ›".green().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "/quit" | "/exit" | "/q" => {
                println!("{}", "👋 Goodbye!".cyan());
                break;
            }
            "/clear" => {
                match relay.clear(session).await {
                    Ok(()) => println!("{}", "🗑️  History cleared.".yellow()),
                    Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
                }
                continue;
            }
            "/history" => {
                match relay.history(session).await {
                    Ok(turns) if turns.is_empty() => println!("{}", "  (no turns yet)".dimmed()),
                    Ok(turns) => {
                        println!();
                        for turn in turns {
                            println!("  {} {}", format!("{}:", turn.role()).cyan(), turn.content());
                        }
                        println!();
                    }
                    Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
                }
                continue;
            }
            "/sessions" => {
                match relay.sessions().await {
                    Ok(sessions) => {
                        println!("\n{}", "📚 Sessions:".bold());
                        for id in sessions {
                            let marker = if id == session { "▶" } else { " " };
                            println!("  {} {}", marker.green(), id.cyan());
                        }
                        println!();
                    }
                    Err(e) => eprintln!("{} {}\n", "Error:".red().bold(), e),
                }
                continue;
            }
            "/help" => {
                println!("\n{}", "Commands:".bold());
                println!("  /quit      — Exit");
                println!("  /clear     — Clear this session's history");
                println!("  /history   — Show this session's turns");
                println!("  /sessions  — List sessions on the relay");
                println!("  /help      — Show this help");
                println!();
                continue;
            }
            _ => {}
        }

        let spinner = indicatif::ProgressBar::new_spinner();
        spinner.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(80));

        let result = relay.send(session, input).await;
        spinner.finish_and_clear();

        match result {
            Ok(reply) => println!("\n{} {}\n", "AI ›".cyan().bold(), reply.trim()),
            Err(e) => {
                tracing::warn!("Chat turn in {} failed: {:#}", session, e);
                eprintln!("{} {}\n", "Error:".red().bold(), e);
            }
        }
    }

    Ok(())
}

/// Print the reply. A failed request is returned so the process exits
/// non-zero.
async fn run_ask(relay: &RelayClient, session: &str, message: &str) -> anyhow::Result<()> {
    let reply = relay
        .send(session, message)
        .await
        .inspect_err(|e| tracing::warn!("Ask in {} failed: {:#}", session, e))?;
    println!("{}", reply.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn relay(url: &str) -> RelayClient {
        RelayClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_ask_succeeds_on_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "response": "hi" })),
            )
            .mount(&server)
            .await;

        assert!(run_ask(&relay(&server.uri()), "s1", "hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_ask_fails_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = run_ask(&relay(&server.uri()), "s1", "hello").await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_ask_fails_when_relay_is_down() {
        let err = run_ask(&relay("http://127.0.0.1:9"), "s1", "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Cannot connect"));
    }

    #[test]
    fn test_explicit_client_timeout() {
        assert_eq!(client_timeout(Some(7)).unwrap(), Duration::from_secs(7));
    }
}
