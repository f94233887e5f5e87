// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration exactly as deserialized from TOML.
///
/// ```toml
/// [service]
/// max_concurrent = 4
/// shell = "bash"
///
/// [timing]
/// poll_interval = "10s"
/// output_flush_interval = "3s"
///
/// [store]
/// mode = "file"
/// path = ".bashq/commands.json"
/// ```
///
/// Every section is optional. Convert into [`ConfigFile`] with `try_from`
/// to get validated, typed values.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub service: ServiceSection,

    #[serde(default)]
    pub timing: TimingSection,

    #[serde(default)]
    pub store: StoreSection,
}

/// `[service]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    /// Ceiling on concurrently running commands.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Interpreter used as `<shell> -c <script>`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Optional cap on captured output per command, in bytes.
    #[serde(default)]
    pub max_output_bytes: Option<u64>,
}

fn default_max_concurrent() -> usize {
    100
}

fn default_shell() -> String {
    "bash".to_string()
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            shell: default_shell(),
            max_output_bytes: None,
        }
    }
}

/// `[timing]` section. Durations are strings such as `"500ms"` or `"10s"`.
#[derive(Debug, Clone, Deserialize)]
pub struct TimingSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_output_flush_interval")]
    pub output_flush_interval: String,
}

fn default_poll_interval() -> String {
    "10s".to_string()
}

fn default_output_flush_interval() -> String {
    "3s".to_string()
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            output_flush_interval: default_output_flush_interval(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// `"memory"` or `"file"`.
    #[serde(default = "default_store_mode")]
    pub mode: String,

    /// Snapshot file used when `mode = "file"`.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_mode() -> String {
    "memory".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".bashq/commands.json")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            mode: default_store_mode(),
            path: default_store_path(),
        }
    }
}

/// Where command rows live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMode {
    /// Rows are lost when the process exits.
    Memory,
    /// Rows are mirrored into a JSON snapshot file after every write.
    File(PathBuf),
}

/// Settings injected into the admission controller, promoters and
/// executor. Built from a validated [`ConfigFile`].
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub max_concurrent: usize,
    pub shell: String,
    pub max_output_bytes: Option<usize>,
    pub poll_interval: Duration,
    pub output_flush_interval: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            shell: default_shell(),
            max_output_bytes: None,
            poll_interval: Duration::from_secs(10),
            output_flush_interval: Duration::from_secs(3),
        }
    }
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: ServiceSettings,
    pub store: StoreMode,
}
