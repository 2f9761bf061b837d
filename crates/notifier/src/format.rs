//! Per-channel message rendering
//!
//! Every channel renders one block per change and joins blocks with a blank
//! line. Only the link/emphasis syntax differs.

use chrono::{DateTime, Utc};
use dw_core::ChangeRecord;

/// Link and emphasis syntax of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// `**[name](url)**`
    Discord,
    /// `*<url|name>*`
    Slack,
    /// `[name](url)`, sent with Markdown parse mode
    Telegram,
    /// `name - url`
    Plain,
}

/// Render a timestamp the way a US-locale clock shows it: `1/1/2024, 12:00:00 AM`
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

/// Render a single change
pub fn render_block(style: Style, change: &ChangeRecord) -> String {
    let link = match style {
        Style::Discord => format!("**[{}]({})**", change.name, change.url),
        Style::Slack => format!("*<{}|{}>*", change.url, change.name),
        Style::Telegram => format!("[{}]({})", change.name, change.url),
        Style::Plain => format!("{} - {}", change.name, change.url),
    };
    format!("{}\nLast Updated: {}", link, format_timestamp(change.last_updated))
}

/// Render a whole batch into one message
pub fn render_message(style: Style, changes: &[ChangeRecord]) -> String {
    changes
        .iter()
        .map(|change| render_block(style, change))
        .collect::<Vec<_>>()
        .join("\n\n")
}
