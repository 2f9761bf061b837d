//! Change notifications for drivewatch
//!
//! This crate provides:
//! - Per-channel message formatting (Discord, Slack, Telegram, plain webhook)
//! - The `Channel` trait every destination implements
//! - `RetryingSender`: JSON POST with bounded exponential backoff
//! - `Dispatcher`: fan-out of one batch of changes to every ready channel

pub mod channel;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod sender;
pub mod transport;

// Re-exports
pub use channel::{
    Channel, DiscordChannel, NotificationsConfig, SlackChannel, TelegramChannel, WebhookChannel,
};
pub use dispatch::{ChannelReport, ChannelResult, DispatchReport, Dispatcher};
pub use error::DeliveryError;
pub use format::Style;
pub use sender::{DeliveryOutcome, RetryPolicy, RetryingSender};
pub use transport::{HttpTransport, Transport};

#[cfg(any(test, feature = "test-util"))]
pub use transport::RecordingTransport;
