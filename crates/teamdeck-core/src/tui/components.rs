//! Small widgets shared by the TUI views

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::Span,
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::classify::Category;
use crate::live::ConnectionPhase;
use crate::notify::NotificationKind;

/// A bordered card showing one headline number
pub struct StatCard<'a> {
    title: &'a str,
    value: String,
    color: Color,
}

impl<'a> StatCard<'a> {
    /// Card with a white value
    pub fn new(title: &'a str, value: impl Into<String>) -> Self {
        Self {
            title,
            value: value.into(),
            color: Color::White,
        }
    }

    /// Value colour
    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Draw into `area`
    pub fn render(self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));

        let paragraph = Paragraph::new(self.value)
            .style(Style::default().fg(self.color).bold())
            .alignment(Alignment::Center)
            .block(block);

        frame.render_widget(paragraph, area);
    }
}

/// Inline text progress bar
pub struct ProgressBar {
    ratio: f64,
}

impl ProgressBar {
    /// Bar for `value` out of `max`, clamped to full
    pub fn new(value: f64, max: f64) -> Self {
        let ratio = if max > 0.0 { value / max } else { 0.0 };
        Self {
            ratio: ratio.clamp(0.0, 1.0),
        }
    }

    /// Bar as `width` block characters
    pub fn render_inline(&self, width: usize) -> String {
        let filled = (self.ratio * width as f64).round() as usize;
        format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
    }
}

/// Colored dot plus label for the connection phase
pub fn connection_badge(phase: ConnectionPhase, label: &str, attempts: u32) -> Span<'static> {
    let (symbol, color) = match phase {
        ConnectionPhase::Open => ("●", Color::Green),
        ConnectionPhase::Connecting => ("●", Color::Yellow),
        ConnectionPhase::Closed => ("●", Color::Red),
        ConnectionPhase::Idle | ConnectionPhase::Stopped => ("○", Color::DarkGray),
    };
    let text = if phase == ConnectionPhase::Closed && attempts > 0 {
        format!("{symbol} {label} (#{attempts})")
    } else {
        format!("{symbol} {label}")
    };
    Span::styled(text, Style::default().fg(color))
}

/// Colour for a message category
pub fn category_color(category: Category) -> Color {
    match category {
        Category::Status => Color::Gray,
        Category::Completion => Color::Green,
        Category::Coordination => Color::Cyan,
        Category::Question => Color::Yellow,
        Category::Assignment => Color::Magenta,
        Category::System => Color::Red,
    }
}

/// Colour for a notification kind
pub fn notification_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Team => Color::Blue,
        NotificationKind::Task => Color::Green,
        NotificationKind::Message => Color::LightRed,
        NotificationKind::Output => Color::Magenta,
        NotificationKind::System => Color::Red,
        NotificationKind::Info => Color::Gray,
    }
}
