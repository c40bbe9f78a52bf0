#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use tripline::config::{ConfigFile, RawActionConfig, RawConfigFile, RunSpec};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                action: BTreeMap::new(),
            },
        }
    }

    pub fn with_action(mut self, name: &str, action: RawActionConfig) -> Self {
        self.config.action.insert(name.to_string(), action);
        self
    }

    /// The raw config, for tests that exercise validation failures.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
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

/// Builder for `RawActionConfig`.
pub struct ActionConfigBuilder {
    action: RawActionConfig,
}

impl ActionConfigBuilder {
    pub fn new(run: RunSpec) -> Self {
        Self {
            action: RawActionConfig {
                after: None,
                at: None,
                every: None,
                run_for: None,
                until: None,
                signals: vec![],
                output: None,
                run,
            },
        }
    }

    pub fn message(text: &str) -> Self {
        Self::new(RunSpec::Message {
            text: text.to_string(),
        })
    }

    pub fn after(mut self, duration: &str) -> Self {
        self.action.after = Some(duration.to_string());
        self
    }

    pub fn every(mut self, duration: &str) -> Self {
        self.action.every = Some(duration.to_string());
        self
    }

    pub fn run_for(mut self, duration: &str) -> Self {
        self.action.run_for = Some(duration.to_string());
        self
    }

    pub fn at(mut self, at: chrono::DateTime<chrono::Utc>) -> Self {
        self.action.at = Some(at);
        self
    }

    pub fn until(mut self, until: chrono::DateTime<chrono::Utc>) -> Self {
        self.action.until = Some(until);
        self
    }

    pub fn signal(mut self, signal: &str) -> Self {
        self.action.signals.push(signal.to_string());
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.action.output = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> RawActionConfig {
        self.action
    }
}
