// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::trigger::Schedule;
use crate::types::SignalId;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [action.heartbeat]
/// after = "500ms"
/// every = "1s"
/// for = "10s"
/// output = "heartbeat.log"
/// run = { kind = "message", text = "alive" }
///
/// [action.status]
/// signals = ["SIGUSR1"]
/// run = { kind = "proc", name = "status" }
/// ```
///
/// This is the raw, unvalidated form. Convert it with
/// `ConfigFile::try_from(raw)` (see `validate.rs`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// All actions from `[action.<name>]`, keyed by name.
    #[serde(default)]
    pub action: BTreeMap<String, RawActionConfig>,
}

/// `[action.<name>]` section.
///
/// Durations use the compact `"250ms"`, `"3s"`, `"1m"`, `"2h"` form;
/// instants are quoted RFC 3339 strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawActionConfig {
    #[serde(default)]
    pub after: Option<String>,

    #[serde(default)]
    pub at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub every: Option<String>,

    #[serde(default, rename = "for")]
    pub run_for: Option<String>,

    #[serde(default)]
    pub until: Option<DateTime<Utc>>,

    /// Signal names or numbers, e.g. `["SIGUSR1", "hup", "12"]`.
    #[serde(default)]
    pub signals: Vec<String>,

    /// File to write to. Omitted means stdout.
    #[serde(default)]
    pub output: Option<PathBuf>,

    /// What to do when the action fires.
    pub run: RunSpec,
}

/// Built-in callback selected by `run = { kind = "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunSpec {
    /// Write a timestamped line.
    Message { text: String },
    /// Run a shell command and write its stdout.
    Command { cmd: String },
    /// Copy `/proc/self/<name>`.
    Proc { name: String },
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub action: BTreeMap<String, ActionConfig>,
}

impl ConfigFile {
    /// Build without validation. Used by `TryFrom<RawConfigFile>` once the
    /// raw form has been checked.
    pub(crate) fn new_unchecked(action: BTreeMap<String, ActionConfig>) -> Self {
        Self { action }
    }
}

/// One validated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionConfig {
    pub schedule: Schedule,
    pub signals: Vec<SignalId>,
    pub output: Option<PathBuf>,
    pub run: RunSpec,
}
