//! JSON POST transports

use crate::error::DeliveryError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[cfg(any(test, feature = "test-util"))]
pub use recording::{RecordedRequest, RecordingTransport};

/// Posts a JSON body and reports the response status
///
/// Non-2xx responses are not errors here; callers decide what counts as
/// success. Only failures to get any response are `Err`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, DeliveryError>;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<u16, DeliveryError> {
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            // Strip the URL: webhook URLs and bot tokens are credentials
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;
        Ok(resp.status().as_u16())
    }
}

#[cfg(any(test, feature = "test-util"))]
mod recording {
    use super::Transport;
    use crate::error::DeliveryError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;
    use std::collections::VecDeque;

    /// One request seen by a `RecordingTransport`
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub url: String,
        pub body: Value,
    }

    /// In-memory transport that records requests and replays scripted statuses
    ///
    /// Responses are matched by URL substring; the first matching rule pops its
    /// next scripted result, and the last result of a rule repeats forever.
    /// Unmatched URLs answer 200.
    #[derive(Default)]
    pub struct RecordingTransport {
        requests: Mutex<Vec<RecordedRequest>>,
        rules: Mutex<Vec<(String, VecDeque<Result<u16, DeliveryError>>)>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the responses for URLs containing `pattern`
        pub fn respond(&self, pattern: &str, results: Vec<Result<u16, DeliveryError>>) {
            self.rules
                .lock()
                .push((pattern.to_string(), results.into_iter().collect()));
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().clone()
        }

        /// Requests whose URL contains `pattern`
        pub fn requests_to(&self, pattern: &str) -> Vec<RecordedRequest> {
            self.requests
                .lock()
                .iter()
                .filter(|r| r.url.contains(pattern))
                .cloned()
                .collect()
        }

        fn next_result(&self, url: &str) -> Result<u16, DeliveryError> {
            let mut rules = self.rules.lock();
            for (pattern, results) in rules.iter_mut() {
                if !url.contains(pattern.as_str()) {
                    continue;
                }
                return match results.len() {
                    0 => Ok(200),
                    1 => results[0].clone(),
                    _ => results.pop_front().unwrap_or(Ok(200)),
                };
            }
            Ok(200)
        }
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn post_json(&self, url: &str, body: &Value) -> Result<u16, DeliveryError> {
            self.requests.lock().push(RecordedRequest {
                url: url.to_string(),
                body: body.clone(),
            });
            self.next_result(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_recording_transport_scripts_and_records() {
        let transport = RecordingTransport::new();
        transport.respond("discord", vec![Ok(500), Ok(204)]);

        let body = json!({ "content": "hi" });
        assert_eq!(transport.post_json("https://discord/x", &body).await, Ok(500));
        assert_eq!(transport.post_json("https://discord/x", &body).await, Ok(204));
        assert_eq!(transport.post_json("https://discord/x", &body).await, Ok(204));
        assert_eq!(transport.post_json("https://slack/y", &body).await, Ok(200));

        assert_eq!(transport.requests().len(), 4);
        assert_eq!(transport.requests_to("discord").len(), 3);
        assert_eq!(transport.requests_to("slack")[0].body, body);
    }
}
