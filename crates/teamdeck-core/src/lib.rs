//! # TeamDeck
//!
//! Live dashboard client for multi-agent team task execution.
//!
//! TeamDeck subscribes to a dashboard backend over WebSocket, keeps a local
//! picture of every team (roster, tasks, inboxes, outputs and history) and
//! turns the raw messages agents exchange into readable, categorized text.
//!
//! ## Architecture
//!
//! - **Live**: reconnecting WebSocket client and slice-by-slice state updates
//! - **Classify**: message classification and natural-language rendering
//! - **Feed**: per-team message feeds and cross-team search
//! - **Notify**: in-app notification center and desktop alerts
//! - **Export**: JSON and CSV export of teams, tasks, messages and outputs
//! - **TUI**: terminal dashboard
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the dashboard against a local backend
//! teamdeck --url ws://localhost:3001 dashboard
//!
//! # Classify a single message
//! teamdeck classify '{"type":"idle_notification","from":"worker-1"}'
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod classify;
pub mod config;
pub mod error;
pub mod export;
pub mod feed;
pub mod format;
pub mod live;
pub mod models;
pub mod notify;
pub mod tui;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::classify::{classify, to_natural, Category, Classification};
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::live::{DashboardState, LiveClient, ReconnectPolicy};
    pub use crate::models::*;
    pub use crate::notify::{Notification, NotificationCenter, NotificationKind};
}
