//! OperatorSession: the consumer-side use case.
//!
//! Owns the [`TwinState`] and the [`SpeedSetting`] and is the only code that
//! mutates them.  It runs on the single consumer task: inbound lines arrive
//! through [`handle_line`](OperatorSession::handle_line), operator actions
//! through `start`/`stop`/`faster`/`slower`, and the link flag is sampled by
//! [`poll_link`](OperatorSession::poll_link).
//!
//! The socket itself lives behind the [`DeviceLink`] trait, implemented in
//! the infrastructure layer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info};

use twin_core::{parse_line, Command, SpeedSetting, TwinState};

/// What the session needs from the connection.
#[async_trait]
pub trait DeviceLink: Send + Sync {
    /// Sends one command line.  Returns `true` if it was written to the
    /// socket; a `false` command is lost and will not be retried.
    async fn send_line(&self, command: &str) -> bool;

    /// The live/not-live flag at this instant.
    fn is_live(&self) -> bool;
}

/// Consumer context state plus the link handle.
pub struct OperatorSession {
    link: Arc<dyn DeviceLink>,
    state: TwinState,
    speed: SpeedSetting,
}

impl OperatorSession {
    pub fn new(link: Arc<dyn DeviceLink>) -> Self {
        Self {
            link,
            state: TwinState::default(),
            speed: SpeedSetting::default(),
        }
    }

    pub fn state(&self) -> &TwinState {
        &self.state
    }

    /// The step delay last requested by the operator (the acknowledged one
    /// is in [`TwinState::step_delay_ms`]).
    pub fn speed(&self) -> SpeedSetting {
        self.speed
    }

    /// Parses one inbound line and applies it.  Returns `true` if the state
    /// changed.
    ///
    /// A malformed payload is logged and dropped; it never affects the link.
    pub fn handle_line(&mut self, line: &str) -> bool {
        let message = match parse_line(line) {
            Ok(message) => message,
            Err(e) => {
                error!(line, error = %e, "dropping malformed device message");
                return false;
            }
        };
        let changed = self.state.apply(&message);
        if changed {
            info!(status = %self.state.summary(), "device state updated");
        } else {
            debug!(line, "device line ignored");
        }
        changed
    }

    /// Marks the motor running and sends `start`.
    pub async fn start(&mut self) -> bool {
        self.state.mark_running();
        self.send(Command::Start).await
    }

    /// Marks the motor stopped and sends `stop`.
    pub async fn stop(&mut self) -> bool {
        self.state.mark_stopped();
        self.send(Command::Stop).await
    }

    /// Shortens the step delay by 1 ms (bounded at 1) and sends it.
    pub async fn faster(&mut self) -> bool {
        let command = self.speed.faster();
        self.state.set_step_delay(self.speed.step_delay_ms());
        self.send(command).await
    }

    /// Lengthens the step delay by 1 ms (bounded at 20) and sends it.
    pub async fn slower(&mut self) -> bool {
        let command = self.speed.slower();
        self.state.set_step_delay(self.speed.step_delay_ms());
        self.send(command).await
    }

    /// Sends free-form text, for commands outside the typed vocabulary.
    pub async fn send_raw(&mut self, text: &str) -> bool {
        self.link.send_line(text).await
    }

    /// Samples the link flag.  Returns `true` if it flipped since the last
    /// sample.
    pub fn poll_link(&mut self) -> bool {
        let changed = self.state.set_link_up(self.link.is_live());
        if changed {
            info!(status = %self.state.summary(), "link status changed");
        }
        changed
    }

    async fn send(&self, command: Command) -> bool {
        let text = command.to_string();
        let sent = self.link.send_line(&text).await;
        if !sent {
            info!(command = %text, "command not delivered; re-issue it once the link is up");
        }
        sent
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
