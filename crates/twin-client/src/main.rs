//! wheel-twin: headless operator console for the wheel controller.
//!
//! Wires together the device link, the receive loop, and the operator
//! session, then runs the consumer loop on the main task.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ LinkManager::connect()     -- blocks until the device answers
//!  └─ Dispatcher::start()        -- receive task, lines -> mpsc
//!  └─ consumer loop (this task)
//!       ├─ inbound line          -> OperatorSession::handle_line
//!       ├─ 1 s ticker            -> OperatorSession::poll_link
//!       ├─ stdin (own thread)    -> ConsoleCommand -> start/stop/+/-/status
//!       └─ Ctrl-C / "quit"       -> shutdown
//! ```
//!
//! # Configuration precedence
//!
//! Command-line flags (or their `WHEEL_TWIN_*` environment variables) win
//! over the TOML file, which wins over built-in defaults.  `RUST_LOG`, when
//! set, wins over the configured log level.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use twin_client::application::operator::{DeviceLink, OperatorSession};
use twin_client::infrastructure::network::{Dispatcher, LinkManager, TcpConnector};
use twin_client::infrastructure::storage::config::{default_config_path, load_config, AppConfig};
use twin_client::infrastructure::ui_bridge::{run_console_command, spawn_line_reader, ConsoleCommand};
use twin_core::FramingMode;

/// Command-line arguments.  Anything left unset falls back to the config file.
#[derive(Debug, Parser)]
#[command(
    name = "wheel-twin",
    about = "Operator console for the wheel controller's line protocol",
    version
)]
struct Cli {
    /// Path to the TOML config file.  Defaults to the platform config dir.
    #[arg(long, env = "WHEEL_TWIN_CONFIG")]
    config: Option<PathBuf>,

    /// Device hostname or IP address.
    #[arg(long, env = "WHEEL_TWIN_HOST")]
    host: Option<String>,

    /// Device TCP port.
    #[arg(long, env = "WHEEL_TWIN_PORT")]
    port: Option<u16>,

    /// Pause between failed connection attempts, in milliseconds.
    #[arg(long, env = "WHEEL_TWIN_RECONNECT_DELAY_MS")]
    reconnect_delay_ms: Option<u64>,

    /// Bound on a single socket read, in milliseconds.
    #[arg(long, env = "WHEEL_TWIN_READ_TIMEOUT_MS")]
    read_timeout_ms: Option<u64>,

    /// Bound on writing one command, in milliseconds.
    #[arg(long, env = "WHEEL_TWIN_WRITE_TIMEOUT_MS")]
    write_timeout_ms: Option<u64>,

    /// Line framing across reads: `per_read` or `buffered`.
    #[arg(long, env = "WHEEL_TWIN_FRAMING")]
    framing: Option<FramingMode>,
}

impl Cli {
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.link.host = host.clone();
        }
        if let Some(port) = self.port {
            config.link.port = port;
        }
        if let Some(ms) = self.reconnect_delay_ms {
            config.link.reconnect_delay_ms = ms;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.link.read_timeout_ms = ms;
        }
        if let Some(ms) = self.write_timeout_ms {
            config.link.write_timeout_ms = ms;
        }
        if let Some(framing) = self.framing {
            config.link.framing = framing;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let mut config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    cli.apply_to(&mut config);
    config.link.validate().context("invalid link configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.logging.level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let link_config = config.link.to_link_config();
    info!(
        endpoint = %link_config.endpoint(),
        framing = ?link_config.framing,
        config = ?config_path,
        "wheel-twin starting"
    );

    let link = Arc::new(LinkManager::new(link_config.clone(), TcpConnector));

    // ── Initial connection ────────────────────────────────────────────────────
    tokio::select! {
        _ = link.connect() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested before the device answered");
            return Ok(());
        }
    }

    // ── Receive task ──────────────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let (mut lines, receive_task) = Dispatcher::new(Arc::clone(&link)).start(Arc::clone(&running));

    // ── Consumer loop ─────────────────────────────────────────────────────────
    let mut session = OperatorSession::new(Arc::clone(&link) as Arc<dyn DeviceLink>);
    session.poll_link();

    let mut status_poll = tokio::time::interval(link_config.status_poll_interval);
    let mut console = spawn_line_reader(std::io::BufReader::new(std::io::stdin()), 16);
    let mut console_open = true;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("ready; commands: start, stop, +, -, status, send <text>, quit");

    loop {
        tokio::select! {
            Some(line) = lines.recv() => {
                session.handle_line(&line);
            }
            _ = status_poll.tick() => {
                session.poll_link();
            }
            input = console.recv(), if console_open => match input {
                Some(text) if text.trim().is_empty() => {}
                Some(text) => match text.parse::<ConsoleCommand>() {
                    Ok(command) => match run_console_command(&mut session, command).await {
                        Some(reply) => println!("{reply}"),
                        None => break,
                    },
                    Err(e) => warn!("{e}"),
                },
                None => {
                    info!("stdin closed; running until Ctrl-C");
                    console_open = false;
                }
            },
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    running.store(false, Ordering::Relaxed);
    receive_task.abort();
    link.close().await;
    info!(summary = %session.state().summary(), "wheel-twin stopped");
    Ok(())
}
