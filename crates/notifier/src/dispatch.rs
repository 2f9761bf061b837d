//! Fan-out of one change batch to every ready channel

use crate::channel::Channel;
use crate::sender::{DeliveryOutcome, RetryingSender};
use dw_core::ChangeRecord;
use tracing::{debug, info};

/// What happened to one channel during a dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelResult {
    Disabled,
    /// Enabled but a credential is empty or still a placeholder
    NotConfigured,
    Sent(DeliveryOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelReport {
    pub channel: &'static str,
    pub result: ChannelResult,
}

/// Per-channel results of one dispatch, in channel order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub channels: Vec<ChannelReport>,
}

impl DispatchReport {
    /// Channels that received a send call
    pub fn attempted(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| matches!(c.result, ChannelResult::Sent(_)))
            .count()
    }

    pub fn delivered(&self) -> usize {
        self.channels
            .iter()
            .filter(|c| matches!(&c.result, ChannelResult::Sent(o) if o.is_delivered()))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.delivered()
    }

    pub fn result_for(&self, channel: &str) -> Option<&ChannelResult> {
        self.channels
            .iter()
            .find(|c| c.channel == channel)
            .map(|c| &c.result)
    }
}

pub struct Dispatcher {
    sender: RetryingSender,
}

impl Dispatcher {
    pub fn new(sender: RetryingSender) -> Self {
        Self { sender }
    }

    /// Send one consolidated message per ready channel
    ///
    /// Every channel is tried regardless of how earlier ones fared. An empty
    /// batch sends nothing.
    pub async fn dispatch(
        &self,
        changes: &[ChangeRecord],
        channels: &[Box<dyn Channel>],
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        if changes.is_empty() {
            return report;
        }

        for channel in channels {
            let result = if !channel.is_enabled() {
                debug!("{} disabled, skipping", channel.name());
                ChannelResult::Disabled
            } else if !channel.is_configured() {
                info!("{} enabled but not configured, skipping", channel.name());
                ChannelResult::NotConfigured
            } else {
                info!("Sending {} notification ({} changes)", channel.name(), changes.len());
                let message = channel.render(changes);
                let payload = channel.payload(&message);
                let outcome = self
                    .sender
                    .send(channel.name(), &channel.endpoint(), &payload, |status| {
                        channel.accepts(status)
                    })
                    .await;
                ChannelResult::Sent(outcome)
            };

            report.channels.push(ChannelReport {
                channel: channel.name(),
                result,
            });
        }

        report
    }
}
