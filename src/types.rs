// src/types.rs

use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a process notification a signal trigger can listen
/// for.
///
/// The named variants cover the usual POSIX signals; anything else can be
/// addressed by number with `Raw`. The trigger engine never interprets the
/// value, it only registers interest in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalId {
    Hangup,
    Interrupt,
    Quit,
    Alarm,
    Terminate,
    User1,
    User2,
    Child,
    Pipe,
    WindowChange,
    Raw(i32),
}

impl SignalId {
    /// Map to the Tokio signal kind used for registration.
    #[cfg(unix)]
    pub fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            SignalId::Hangup => SignalKind::hangup(),
            SignalId::Interrupt => SignalKind::interrupt(),
            SignalId::Quit => SignalKind::quit(),
            SignalId::Alarm => SignalKind::alarm(),
            SignalId::Terminate => SignalKind::terminate(),
            SignalId::User1 => SignalKind::user_defined1(),
            SignalId::User2 => SignalKind::user_defined2(),
            SignalId::Child => SignalKind::child(),
            SignalId::Pipe => SignalKind::pipe(),
            SignalId::WindowChange => SignalKind::window_change(),
            SignalId::Raw(n) => SignalKind::from_raw(n),
        }
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignalId::Hangup => "SIGHUP",
            SignalId::Interrupt => "SIGINT",
            SignalId::Quit => "SIGQUIT",
            SignalId::Alarm => "SIGALRM",
            SignalId::Terminate => "SIGTERM",
            SignalId::User1 => "SIGUSR1",
            SignalId::User2 => "SIGUSR2",
            SignalId::Child => "SIGCHLD",
            SignalId::Pipe => "SIGPIPE",
            SignalId::WindowChange => "SIGWINCH",
            SignalId::Raw(n) => return write!(f, "signal {n}"),
        };
        f.write_str(name)
    }
}

/// Accepts `"SIGUSR1"`, `"usr1"`, `"USR1"` or a bare signal number.
impl FromStr for SignalId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i32>() {
            if n <= 0 {
                return Err(format!("invalid signal number {n}"));
            }
            return Ok(SignalId::Raw(n));
        }

        let upper = trimmed.to_uppercase();
        let name = upper.strip_prefix("SIG").unwrap_or(&upper);
        match name {
            "HUP" => Ok(SignalId::Hangup),
            "INT" => Ok(SignalId::Interrupt),
            "QUIT" => Ok(SignalId::Quit),
            "ALRM" => Ok(SignalId::Alarm),
            "TERM" => Ok(SignalId::Terminate),
            "USR1" => Ok(SignalId::User1),
            "USR2" => Ok(SignalId::User2),
            "CHLD" => Ok(SignalId::Child),
            "PIPE" => Ok(SignalId::Pipe),
            "WINCH" => Ok(SignalId::WindowChange),
            _ => Err(format!(
                "unknown signal '{trimmed}' (expected e.g. \"SIGUSR1\", \"term\" or a number)"
            )),
        }
    }
}
