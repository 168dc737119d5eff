//! Terminal dashboard
//!
//! Renders the live dashboard state: team overview, task lists, the message
//! feed, agent outputs, team history and notifications.

mod app;
mod components;
mod event;
mod ui;

pub use app::{ActiveTab, App};
pub use event::{Event, EventHandler};
