//! Operator console bridge.
//!
//! Maps text typed by the operator onto [`OperatorSession`] actions and turns
//! the session state into serializable snapshots.  The binary reads stdin
//! line by line through [`spawn_line_reader`], parses each line into a
//! [`ConsoleCommand`], runs it here, and prints the JSON reply.
//!
//! ```text
//! stdin "+"  ──> ConsoleCommand::Faster ──> session.faster() ──> {"success":true,"data":"velocidad:1",...}
//! stdin "status" ──> ConsoleCommand::Status ──> snapshot() ──> {"success":true,"data":{...},...}
//! ```
//!
//! # `ConsoleResult<T>`
//!
//! Every reply uses the same envelope:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```

use std::io::BufRead;
use std::str::FromStr;
use std::thread;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use twin_core::{Command, MotorState};

use crate::application::operator::OperatorSession;

// ── Console commands ──────────────────────────────────────────────────────────

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Start,
    Stop,
    /// `+`: shorter step delay.
    Faster,
    /// `-`: longer step delay.
    Slower,
    Status,
    /// `send <text>`: pass text through unchanged.
    Raw(String),
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if let Some(rest) = input.strip_prefix("send ") {
            let text = rest.trim();
            if text.is_empty() {
                return Err("send needs a message".to_string());
            }
            return Ok(ConsoleCommand::Raw(text.to_string()));
        }
        match input.to_ascii_lowercase().as_str() {
            "start" => Ok(ConsoleCommand::Start),
            "stop" => Ok(ConsoleCommand::Stop),
            "+" | "faster" => Ok(ConsoleCommand::Faster),
            "-" | "slower" => Ok(ConsoleCommand::Slower),
            "status" | "s" => Ok(ConsoleCommand::Status),
            "quit" | "exit" | "q" => Ok(ConsoleCommand::Quit),
            other => Err(format!(
                "unknown command {other:?} (try start, stop, +, -, status, send <text>, quit)"
            )),
        }
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

/// Display snapshot of the twin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwinStatusDto {
    /// `"Connected"` or `"Disconnected"`, as last sampled.
    pub connection_status: String,
    pub motor: MotorState,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    /// Step delay shown to the operator, in ms/step.
    pub step_delay_ms: u32,
    /// Step delay the operator last asked for.
    pub requested_step_delay_ms: u32,
    pub summary: String,
}

/// Unified reply envelope for console commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConsoleResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ConsoleResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }

    /// Compact JSON, one line.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"success":false,"data":null,"error":"unserializable reply: {e}"}}"#)
        })
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Builds a display snapshot from the session.
pub fn snapshot(session: &OperatorSession) -> TwinStatusDto {
    let state = session.state();
    TwinStatusDto {
        connection_status: if state.link_up { "Connected" } else { "Disconnected" }.to_string(),
        motor: state.motor,
        temperature_c: state.temperature_c,
        humidity_pct: state.humidity_pct,
        step_delay_ms: state.step_delay_ms,
        requested_step_delay_ms: session.speed().step_delay_ms(),
        summary: state.summary(),
    }
}

/// Runs one console command.  Returns the JSON reply to print, or `None`
/// when the operator asked to quit.
pub async fn run_console_command(session: &mut OperatorSession, command: ConsoleCommand) -> Option<String> {
    let reply = match command {
        ConsoleCommand::Quit => return None,
        ConsoleCommand::Status => return Some(ConsoleResult::ok(snapshot(session)).to_json()),
        ConsoleCommand::Start => sent_reply(session.start().await, Command::Start.to_string()),
        ConsoleCommand::Stop => sent_reply(session.stop().await, Command::Stop.to_string()),
        ConsoleCommand::Faster => {
            let sent = session.faster().await;
            sent_reply(sent, session.speed().command().to_string())
        }
        ConsoleCommand::Slower => {
            let sent = session.slower().await;
            sent_reply(sent, session.speed().command().to_string())
        }
        ConsoleCommand::Raw(text) => {
            if session.send_raw(&text).await {
                ConsoleResult::ok(text)
            } else {
                ConsoleResult::err(format!("{text:?} was not sent (invalid text or link down)"))
            }
        }
    };
    Some(reply.to_json())
}

fn sent_reply(sent: bool, command: String) -> ConsoleResult<String> {
    if sent {
        ConsoleResult::ok(command)
    } else {
        ConsoleResult::err(format!("{command} was dropped; the link is reconnecting"))
    }
}

// ── Console input ─────────────────────────────────────────────────────────────

/// Reads `input` line by line on a dedicated OS thread and forwards each
/// line over a bounded channel.
///
/// The channel closes at end of input or on a read error.  The thread is
/// detached rather than run on tokio's blocking pool: a read parked on a
/// terminal would otherwise keep the runtime from shutting down after the
/// consumer loop has exited.
pub fn spawn_line_reader<R>(input: R, capacity: usize) -> mpsc::Receiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let spawned = thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read operator input");
                        break;
                    }
                }
            }
            debug!("console input reader finished");
        });
    if let Err(e) = spawned {
        warn!(error = %e, "could not start console input reader; console disabled");
    }
    rx
}

// ── Tests ─────────────────────────────────────────────────────────────────────
