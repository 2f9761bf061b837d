//! Notification destinations
//!
//! Each channel struct doubles as its configuration section, so the CLI
//! deserializes `[notifications.<name>]` straight into it.

use crate::format::{render_message, Style};
use dw_core::ChangeRecord;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Template value shipped for the Discord webhook
pub const DISCORD_WEBHOOK_PLACEHOLDER: &str = "DISCORD_WEBHOOK";
/// Template value shipped for the Slack webhook
pub const SLACK_WEBHOOK_PLACEHOLDER: &str = "SLACK_WEBHOOK";
/// Template value shipped for the Telegram bot token
pub const TELEGRAM_TOKEN_PLACEHOLDER: &str = "1234567890:ABC-EXAMPLE-TOKEN";
/// Template value shipped for the Telegram chat id
pub const TELEGRAM_CHAT_PLACEHOLDER: &str = "123456789";

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Whether a credential holds a real value
///
/// Empty strings, the channel's template value and anything starting with
/// `YOUR_` all count as unfilled.
pub fn is_filled(value: &str, placeholder: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != placeholder && !value.starts_with("YOUR_")
}

/// A destination for change notifications
pub trait Channel: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;

    /// All credentials present and none left at a placeholder
    fn is_configured(&self) -> bool;

    fn style(&self) -> Style;

    fn endpoint(&self) -> String;

    /// JSON body carrying `message`
    fn payload(&self, message: &str) -> Value;

    /// Whether a response status means the message was accepted
    fn accepts(&self, status: u16) -> bool;

    /// One consolidated message for the whole batch
    fn render(&self, changes: &[ChangeRecord]) -> String {
        render_message(self.style(), changes)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordChannel {
    pub enabled: bool,
    pub webhook_url: String,
}

impl Default for DiscordChannel {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: DISCORD_WEBHOOK_PLACEHOLDER.to_string(),
        }
    }
}

impl Channel for DiscordChannel {
    fn name(&self) -> &'static str {
        "discord"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_configured(&self) -> bool {
        is_filled(&self.webhook_url, DISCORD_WEBHOOK_PLACEHOLDER)
    }

    fn style(&self) -> Style {
        Style::Discord
    }

    fn endpoint(&self) -> String {
        self.webhook_url.clone()
    }

    fn payload(&self, message: &str) -> Value {
        json!({ "content": message })
    }

    fn accepts(&self, status: u16) -> bool {
        status == 200 || status == 204
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackChannel {
    pub enabled: bool,
    pub webhook_url: String,
}

impl Default for SlackChannel {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: SLACK_WEBHOOK_PLACEHOLDER.to_string(),
        }
    }
}

impl Channel for SlackChannel {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_configured(&self) -> bool {
        is_filled(&self.webhook_url, SLACK_WEBHOOK_PLACEHOLDER)
    }

    fn style(&self) -> Style {
        Style::Slack
    }

    fn endpoint(&self) -> String {
        self.webhook_url.clone()
    }

    fn payload(&self, message: &str) -> Value {
        json!({ "text": message })
    }

    fn accepts(&self, status: u16) -> bool {
        (200..300).contains(&status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramChannel {
    pub enabled: bool,
    pub bot_token: String,
    pub chat_id: String,
    /// Bot API root, overridable for self-hosted Bot API servers
    pub api_base: String,
}

impl Default for TelegramChannel {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: TELEGRAM_TOKEN_PLACEHOLDER.to_string(),
            chat_id: TELEGRAM_CHAT_PLACEHOLDER.to_string(),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }
}

impl Channel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_configured(&self) -> bool {
        is_filled(&self.bot_token, TELEGRAM_TOKEN_PLACEHOLDER)
            && is_filled(&self.chat_id, TELEGRAM_CHAT_PLACEHOLDER)
            && !self.api_base.trim().is_empty()
    }

    fn style(&self) -> Style {
        Style::Telegram
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.bot_token.trim()
        )
    }

    fn payload(&self, message: &str) -> Value {
        json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        })
    }

    fn accepts(&self, status: u16) -> bool {
        status == 200
    }
}

/// Generic JSON webhook using the plain-text format
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookChannel {
    pub enabled: bool,
    pub url: String,
}

impl Channel for WebhookChannel {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn is_configured(&self) -> bool {
        is_filled(&self.url, "")
    }

    fn style(&self) -> Style {
        Style::Plain
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }

    fn payload(&self, message: &str) -> Value {
        json!({ "text": message })
    }

    fn accepts(&self, status: u16) -> bool {
        (200..300).contains(&status)
    }
}

/// The `[notifications]` configuration section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub discord: DiscordChannel,
    pub slack: SlackChannel,
    pub telegram: TelegramChannel,
    pub webhook: WebhookChannel,
}

impl NotificationsConfig {
    /// Every known channel, ready or not; the dispatcher filters
    pub fn channels(&self) -> Vec<Box<dyn Channel>> {
        vec![
            Box::new(self.discord.clone()),
            Box::new(self.slack.clone()),
            Box::new(self.telegram.clone()),
            Box::new(self.webhook.clone()),
        ]
    }
}
