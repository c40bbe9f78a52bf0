// src/action/builtin.rs

//! Ready-made callbacks.
//!
//! The `dump_*` family writes a snapshot of the running process, taken from
//! `/proc/self`, to the action's output. Combined with a signal trigger this
//! gives "send SIGUSR1, get a status dump" without touching the host
//! program.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::{SecondsFormat, Utc};

use crate::action::target::Output;
use crate::action::triggered::Callback;
use crate::config::RunSpec;

/// Copy `/proc/self/<name>` to the output.
///
/// Fails at firing time if the entry does not exist (e.g. not on Linux).
pub fn dump_proc(name: &str) -> Callback {
    let name = name.to_string();
    let path = PathBuf::from("/proc/self").join(&name);

    Arc::new(move |out: &mut Output| -> anyhow::Result<()> {
        if name.is_empty() || name.contains('/') || name.contains("..") {
            bail!("invalid process entry '{name}'");
        }

        let bytes = std::fs::read(&path).with_context(|| format!("unknown process entry {path:?}"))?;
        out.write_all(&bytes)
            .with_context(|| format!("writing process entry '{name}'"))?;
        Ok(())
    })
}

/// Memory, thread and signal summary of the process.
pub fn dump_status() -> Callback {
    dump_proc("status")
}

/// Resource limits of the process.
pub fn dump_limits() -> Callback {
    dump_proc("limits")
}

/// I/O counters of the process.
pub fn dump_io() -> Callback {
    dump_proc("io")
}

/// Run a shell command and write its stdout.
///
/// A non-zero exit status is reported as a callback error after the output
/// has been written.
pub fn run_command(cmd: impl Into<String>) -> Callback {
    let cmd = cmd.into();

    Arc::new(move |out: &mut Output| -> anyhow::Result<()> {
        let mut command = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&cmd);
            c
        };

        let result = command
            .output()
            .with_context(|| format!("spawning command '{cmd}'"))?;

        out.write_all(&result.stdout)
            .with_context(|| format!("writing output of '{cmd}'"))?;

        if !result.status.success() {
            bail!(
                "command '{}' exited with code {}",
                cmd,
                result.status.code().unwrap_or(-1)
            );
        }
        Ok(())
    })
}

/// Write `text` on its own line, prefixed with an RFC 3339 timestamp.
pub fn message(text: impl Into<String>) -> Callback {
    let text = text.into();

    Arc::new(move |out: &mut Output| -> anyhow::Result<()> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        writeln!(out, "{now} {text}").context("writing message")?;
        Ok(())
    })
}

/// Callback described by a `run = { kind = ... }` config entry.
pub fn from_spec(spec: &RunSpec) -> Callback {
    match spec {
        RunSpec::Message { text } => message(text.clone()),
        RunSpec::Command { cmd } => run_command(cmd.clone()),
        RunSpec::Proc { name } => dump_proc(name),
    }
}
