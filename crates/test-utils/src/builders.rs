use std::path::PathBuf;
use std::time::Duration;

use bashq::config::{ConfigFile, RawConfigFile, ServiceSettings};

/// Builder for `ServiceSettings` with test-friendly defaults.
///
/// Defaults to `sh`, a ceiling of 100 and short timings so queue promotion
/// and output flushing happen well inside a test timeout.
pub struct SettingsBuilder {
    settings: ServiceSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: ServiceSettings {
                max_concurrent: 100,
                shell: "sh".to_string(),
                max_output_bytes: None,
                poll_interval: Duration::from_millis(50),
                output_flush_interval: Duration::from_millis(50),
            },
        }
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.settings.max_concurrent = max;
        self
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.settings.shell = shell.to_string();
        self
    }

    pub fn max_output_bytes(mut self, limit: usize) -> Self {
        self.settings.max_output_bytes = Some(limit);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.settings.poll_interval = interval;
        self
    }

    pub fn output_flush_interval(mut self, interval: Duration) -> Self {
        self.settings.output_flush_interval = interval;
        self
    }

    pub fn build(self) -> ServiceSettings {
        self.settings
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ConfigFile`, going through the same validation as a file.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn max_concurrent(mut self, max: usize) -> Self {
        self.config.service.max_concurrent = max;
        self
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.config.service.shell = shell.to_string();
        self
    }

    pub fn poll_interval(mut self, raw: &str) -> Self {
        self.config.timing.poll_interval = raw.to_string();
        self
    }

    pub fn output_flush_interval(mut self, raw: &str) -> Self {
        self.config.timing.output_flush_interval = raw.to_string();
        self
    }

    pub fn file_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store.mode = "file".to_string();
        self.config.store.path = path.into();
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
