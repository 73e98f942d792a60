// svnop-rs: Subversion operation engine
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Console transparency channel.
//!
//! ```text
//! operation ---> ConsoleStream
//!                  |-- TracingConsole  target "svnop::console"
//!                  |-- ChannelConsole  flume -> CLI / tests
//!                  `-- NullConsole
//!
//! CommandLine::new("commit").path("trunk").message("fix").flags(opts)
//!   => svn commit "trunk" -m "fix" --no-unlock
//! ```
//!
//! Output here is write-only; nothing in execution depends on it.

use std::fmt;

use crate::connector::CommandOptions;

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsoleLevel {
    /// Command echo.
    Cmd,
    /// Informational result.
    Ok,
    /// Non-fatal problem.
    Warning,
    /// Failure.
    Error,
}

impl ConsoleLevel {
    /// Short tag used when printing.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Cmd => "cmd",
            Self::Ok => "ok",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// One line written to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    pub level: ConsoleLevel,
    pub text: String,
}

impl fmt::Display for ConsoleLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level.tag(), self.text)
    }
}

/// Sink for user-visible audit lines.
pub trait ConsoleStream: Send + Sync {
    /// Writes one line.
    fn write(&self, level: ConsoleLevel, text: &str);

    /// Marks the start of an operation.
    fn mark_start(&self, operation: &str) {
        self.write(ConsoleLevel::Ok, &format!("*** {operation} ***"));
    }

    /// Marks the end of an operation.
    fn mark_end(&self, operation: &str) {
        self.write(ConsoleLevel::Ok, &format!("*** {operation} finished ***"));
    }

    /// Marks that an operation was cancelled.
    fn mark_cancelled(&self, operation: &str) {
        self.write(ConsoleLevel::Warning, &format!("*** {operation} cancelled ***"));
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsole;

impl ConsoleStream for NullConsole {
    fn write(&self, _level: ConsoleLevel, _text: &str) {}
}

/// Emits every line as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsole;

impl ConsoleStream for TracingConsole {
    fn write(&self, level: ConsoleLevel, text: &str) {
        match level {
            ConsoleLevel::Cmd | ConsoleLevel::Ok => {
                tracing::info!(target: "svnop::console", kind = level.tag(), "{text}");
            }
            ConsoleLevel::Warning => tracing::warn!(target: "svnop::console", "{text}"),
            ConsoleLevel::Error => tracing::error!(target: "svnop::console", "{text}"),
        }
    }
}

/// Sends every line over a `flume` channel.
#[derive(Debug, Clone)]
pub struct ChannelConsole {
    tx: flume::Sender<ConsoleLine>,
}

impl ChannelConsole {
    /// Creates the console together with the receiving end.
    #[must_use]
    pub fn new() -> (Self, flume::Receiver<ConsoleLine>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }
}

impl ConsoleStream for ChannelConsole {
    fn write(&self, level: ConsoleLevel, text: &str) {
        // Receiver gone means nobody is watching; the line is not needed.
        let _ = self.tx.send(ConsoleLine {
            level,
            text: text.to_string(),
        });
    }
}

/// Builder for the command-line echo of a server command.
#[derive(Debug, Clone)]
pub struct CommandLine {
    line: String,
}

impl CommandLine {
    /// Starts `svn <verb>`.
    #[must_use]
    pub fn new(verb: &str) -> Self {
        Self {
            line: format!("svn {verb}"),
        }
    }

    /// Appends a quoted path or URL.
    #[must_use]
    pub fn path(mut self, path: impl AsRef<str>) -> Self {
        self.line.push_str(" \"");
        self.line.push_str(path.as_ref());
        self.line.push('"');
        self
    }

    /// Appends several quoted paths.
    #[must_use]
    pub fn paths<I, S>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        paths.into_iter().fold(self, Self::path)
    }

    /// Appends `-r <revision>`.
    #[must_use]
    pub fn revision(mut self, revision: i64) -> Self {
        self.line.push_str(&format!(" -r {revision}"));
        self
    }

    /// Appends `-m "<message>"`, escaping embedded quotes.
    #[must_use]
    pub fn message(mut self, message: &str) -> Self {
        self.line.push_str(" -m \"");
        self.line.push_str(&message.replace('"', "\\\""));
        self.line.push('"');
        self
    }

    /// Appends a bare argument.
    #[must_use]
    pub fn arg(mut self, arg: &str) -> Self {
        self.line.push(' ');
        self.line.push_str(arg);
        self
    }

    /// Appends the command-line form of `options`.
    #[must_use]
    pub fn flags(mut self, options: CommandOptions) -> Self {
        self.line.push_str(&options.as_command_line());
        self
    }

    /// Writes the line to `console` at [`ConsoleLevel::Cmd`].
    pub fn emit(self, console: &dyn ConsoleStream) {
        console.write(ConsoleLevel::Cmd, &self.line);
    }

    /// Returns the rendered line.
    #[must_use]
    pub fn into_string(self) -> String {
        self.line
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}
