//! System configuration for drivewatch
//!
//! Read from `<config_dir>/drivewatch/config.toml` (or `--config`), then
//! layered with `DRIVEWATCH__SECTION__KEY` environment overrides. Every field
//! has a default, so a partial file is fine.

use anyhow::{Context, Result};
use dw_core::{FolderId, StorageBackend};
use journal::cache::DEFAULT_FOLDER_CACHE_TTL;
use journal::SledStore;
use notifier::channel::{
    is_filled, DISCORD_WEBHOOK_PLACEHOLDER, SLACK_WEBHOOK_PLACEHOLDER, TELEGRAM_TOKEN_PLACEHOLDER,
};
use notifier::{HttpTransport, NotificationsConfig, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use watcher::backend::drive::DEFAULT_API_BASE;
use watcher::backend::local::ROOT_ID;
use watcher::schedule::{DEFAULT_INTERVAL, DEFAULT_TICK_TIMEOUT};
use watcher::{DriveBackend, LocalBackend, Monitor, MonitorConfig};

/// Template value shipped for the monitored root
pub const ROOT_PLACEHOLDER: &str = "FOLDER_TO_MONITOR_ID";

const ENV_PREFIX: &str = "DRIVEWATCH";
const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Google Drive folder
    Drive,
    /// Directory on this machine
    Local,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveSource {
    /// OAuth bearer token with Drive read access
    pub access_token: String,
    pub api_base: String,
}

impl Default for DriveSource {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Drive folder id, or a directory path for `local`
    pub root: String,
    pub drive: DriveSource,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Drive,
            root: ROOT_PLACEHOLDER.to_string(),
            drive: DriveSource::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Holds the sled database and the lock file
    pub dir: PathBuf,
    pub folder_cache_ttl_secs: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: default_state_dir(),
            folder_cache_ttl_secs: DEFAULT_FOLDER_CACHE_TTL.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
    pub tick_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL.as_secs(),
            tick_timeout_secs: DEFAULT_TICK_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: retry.max_attempts,
            base_delay_ms: retry.base_delay.as_millis() as u64,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub source: SourceConfig,
    pub state: StateConfig,
    pub schedule: ScheduleConfig,
    pub delivery: DeliveryConfig,
    pub notifications: NotificationsConfig,
}

impl SystemConfig {
    /// Check every value against its allowed range
    pub fn validate(&self) -> Result<()> {
        let root = self.source.root.trim();
        if root.is_empty() || root == ROOT_PLACEHOLDER {
            anyhow::bail!("source.root is not set (still '{}')", self.source.root);
        }
        if !(10..=86_400).contains(&self.schedule.interval_secs) {
            anyhow::bail!(
                "schedule.interval_secs must be between 10 and 86400 (got {})",
                self.schedule.interval_secs
            );
        }
        if self.schedule.tick_timeout_secs == 0 {
            anyhow::bail!("schedule.tick_timeout_secs must be at least 1");
        }
        if !(1..=86_400).contains(&self.state.folder_cache_ttl_secs) {
            anyhow::bail!(
                "state.folder_cache_ttl_secs must be between 1 and 86400 (got {})",
                self.state.folder_cache_ttl_secs
            );
        }
        if !(1..=10).contains(&self.delivery.max_attempts) {
            anyhow::bail!(
                "delivery.max_attempts must be between 1 and 10 (got {})",
                self.delivery.max_attempts
            );
        }
        if self.delivery.request_timeout_secs == 0 {
            anyhow::bail!("delivery.request_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_secs(self.schedule.tick_timeout_secs)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery.request_timeout_secs)
    }

    /// Id of the monitored root as the backend sees it
    pub fn root_id(&self) -> FolderId {
        match self.source.kind {
            SourceKind::Drive => FolderId::new(self.source.root.trim()),
            SourceKind::Local => FolderId::new(ROOT_ID),
        }
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        let mut config = MonitorConfig::new(self.root_id());
        config.folder_cache_ttl = Duration::from_secs(self.state.folder_cache_ttl_secs);
        config.retry = RetryPolicy {
            max_attempts: self.delivery.max_attempts,
            base_delay: Duration::from_millis(self.delivery.base_delay_ms),
        };
        config.notifications = self.notifications.clone();
        config
    }

    pub fn build_backend(&self) -> Result<Arc<dyn StorageBackend>> {
        match self.source.kind {
            SourceKind::Drive => {
                if self.source.drive.access_token.trim().is_empty() {
                    anyhow::bail!("source.drive.access_token is required for the drive source");
                }
                let backend = DriveBackend::new(
                    &self.source.drive.api_base,
                    &self.source.drive.access_token,
                    self.request_timeout(),
                )
                .context("Failed to create Drive client")?;
                Ok(Arc::new(backend))
            }
            SourceKind::Local => {
                let root = PathBuf::from(self.source.root.trim());
                if !root.is_dir() {
                    anyhow::bail!("source.root '{}' is not a directory", root.display());
                }
                Ok(Arc::new(LocalBackend::new(root)))
            }
        }
    }

    pub fn open_store(&self) -> Result<Arc<SledStore>> {
        let store = SledStore::open(&self.state.dir).with_context(|| {
            format!("Failed to open state store in {}", self.state.dir.display())
        })?;

        match store.purge_expired() {
            Ok(0) => {}
            Ok(n) => debug!("Purged {} expired cache entries", n),
            Err(e) => warn!("Failed to purge expired cache entries: {}", e),
        }
        Ok(Arc::new(store))
    }

    /// Wire backend, store and transport into a monitor
    pub fn build_monitor(&self) -> Result<Monitor> {
        let backend = self.build_backend()?;
        let store = self.open_store()?;
        let transport = HttpTransport::new(self.request_timeout())
            .context("Failed to create HTTP client")?;

        Ok(Monitor::new(
            self.monitor_config(),
            backend,
            store,
            Arc::new(transport),
        ))
    }

    /// Copy with credentials masked, for display
    pub fn redacted(&self) -> SystemConfig {
        fn mask(value: &mut String, placeholder: &str) {
            if is_filled(value, placeholder) {
                *value = REDACTED.to_string();
            }
        }

        let mut config = self.clone();
        mask(&mut config.source.drive.access_token, "");
        let n = &mut config.notifications;
        mask(&mut n.discord.webhook_url, DISCORD_WEBHOOK_PLACEHOLDER);
        mask(&mut n.slack.webhook_url, SLACK_WEBHOOK_PLACEHOLDER);
        mask(&mut n.telegram.bot_token, TELEGRAM_TOKEN_PLACEHOLDER);
        mask(&mut n.webhook.url, "");
        config
    }
}

fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("drivewatch"))
        .unwrap_or_else(|| PathBuf::from(".drivewatch"))
}

/// Default location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("drivewatch").join("config.toml"))
}

/// Load and validate configuration
///
/// A missing file is not an error; defaults and environment overrides still
/// apply.
pub fn load(path: Option<&Path>) -> Result<SystemConfig> {
    let config = load_unchecked(path)?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load configuration without range checks
pub fn load_unchecked(path: Option<&Path>) -> Result<SystemConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_file_path().context("Could not determine config file path")?,
    };

    let settings = config::Config::builder()
        .add_source(
            config::File::from(path.as_path())
                .format(config::FileFormat::Toml)
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    settings
        .try_deserialize()
        .with_context(|| format!("Failed to parse config from {}", path.display()))
}

/// Write the example config to `path` unless a file is already there
///
/// Returns whether a file was created.
pub fn init_if_missing(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, example_config())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

pub fn example_config() -> &'static str {
    EXAMPLE_CONFIG
}

const EXAMPLE_CONFIG: &str = r#"# drivewatch configuration

[source]
# "drive" for a Google Drive folder, "local" for a directory on this machine
kind = "drive"
# Drive folder id (or directory path when kind = "local")
root = "FOLDER_TO_MONITOR_ID"

[source.drive]
access_token = ""
api_base = "https://www.googleapis.com/drive/v3"

[state]
# dir = "/var/lib/drivewatch"
folder_cache_ttl_secs = 300

[schedule]
interval_secs = 300
tick_timeout_secs = 240

[delivery]
max_attempts = 3
base_delay_ms = 1000
request_timeout_secs = 30

[notifications.discord]
enabled = false
webhook_url = "DISCORD_WEBHOOK"

[notifications.slack]
enabled = false
webhook_url = "SLACK_WEBHOOK"

[notifications.telegram]
enabled = false
bot_token = "1234567890:ABC-EXAMPLE-TOKEN"
chat_id = "123456789"

[notifications.webhook]
enabled = false
url = ""
"#;
