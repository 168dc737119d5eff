//! Connection lifecycle state machine
//!
//! `Idle -> Connecting -> Open -> Closed(n) -> Connecting -> ...` until
//! [`Connection::stop`]. The driver in [`super`] feeds transport events in and
//! gets the next reconnect delay back; no I/O happens here.

use std::time::Duration;

use serde::Serialize;

use super::backoff::ReconnectPolicy;

/// Lifecycle phase of the live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// Not started
    #[default]
    Idle,
    /// Transport handshake in flight
    Connecting,
    /// Receiving updates
    Open,
    /// Disconnected, a reconnect is scheduled
    Closed,
    /// Torn down; nothing further happens
    Stopped,
}

/// Connection state owned by one live client
#[derive(Debug, Clone)]
pub struct Connection {
    phase: ConnectionPhase,
    attempts: u32,
    policy: ReconnectPolicy,
}

impl Connection {
    /// Create an idle connection
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            phase: ConnectionPhase::Idle,
            attempts: 0,
            policy,
        }
    }

    /// Current phase
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Consecutive failed attempts since the last successful open
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start a connection attempt. Returns false once stopped.
    pub fn begin_connect(&mut self) -> bool {
        match self.phase {
            ConnectionPhase::Stopped => false,
            _ => {
                self.phase = ConnectionPhase::Connecting;
                true
            }
        }
    }

    /// The transport reported success
    pub fn opened(&mut self) {
        if self.phase == ConnectionPhase::Connecting {
            self.phase = ConnectionPhase::Open;
            self.attempts = 0;
        }
    }

    /// The transport failed or closed.
    ///
    /// Returns the delay before the next attempt and bumps the attempt
    /// counter, or `None` when the connection has been stopped.
    pub fn closed(&mut self) -> Option<Duration> {
        if self.phase == ConnectionPhase::Stopped {
            return None;
        }
        let delay = self.policy.delay(self.attempts);
        self.attempts = self.attempts.saturating_add(1);
        self.phase = ConnectionPhase::Closed;
        Some(delay)
    }

    /// Explicit teardown; terminal
    pub fn stop(&mut self) {
        self.phase = ConnectionPhase::Stopped;
    }
}
