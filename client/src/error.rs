//! Error model for the `qmpctl` crate.

use std::{io, time::Duration};

use thiserror::Error;

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The endpoint could not be reached or refused the connection.
    Connection,
    /// The channel closed early, went silent, or carried something unexpected.
    Protocol,
    /// A `key=value` token could not be turned into a command argument.
    Argument,
    /// The command is not one this entry point knows how to handle.
    UnsupportedCommand,
    /// A requested label was absent from a reply.
    Lookup,
}

/// A malformed `key=value` token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ArgumentError {
    #[error("expected key=value, got {token:?}")]
    MissingSeparator {
        token: String,
    },

    #[error("missing key in {token:?}")]
    EmptyKey {
        token: String,
    },

    #[error("argument {key:?} given more than once")]
    DuplicateKey {
        key: String,
    },

    /// The value starts with `0x` but is not a base-16 integer.
    #[error("invalid hex literal {value:?} for argument {key:?}")]
    InvalidHex {
        key: String,
        value: String,
    },

    /// Strict mode only.
    #[error("value {value:?} for argument {key:?} is not valid JSON")]
    InvalidLiteral {
        key: String,
        value: String,
    },
}

/// Everything that can end an invocation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The socket could not be opened.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Socket or output failure after the connection was established.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// The peer sent something that does not have the required shape.
    #[error("QMP protocol error: {message}")]
    Protocol {
        message: String,
    },

    /// The peer answered with an `error` object where a `return` was required.
    #[error("QMP command failed: {class}: {desc}")]
    Qmp {
        class: String,
        desc: String,
    },

    #[error("QMP connection closed before a complete line was received")]
    Disconnected,

    #[error("QMP peer did not respond within {timeout:?}")]
    Timeout {
        timeout: Duration,
    },

    #[error("invalid argument: {0}")]
    Argument(#[from] ArgumentError),

    /// The command has no handler in this entry point.
    #[error("unknown command: {command}")]
    UnsupportedCommand {
        command: String,
    },

    #[error("no character device labelled {label:?}")]
    Lookup {
        label: String,
    },
}

impl Error {
    /// Returns a coarse error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Connect { .. } => ErrorKind::Connection,
            Self::Io { .. }
            | Self::Json { .. }
            | Self::Protocol { .. }
            | Self::Qmp { .. }
            | Self::Disconnected
            | Self::Timeout { .. } => ErrorKind::Protocol,
            Self::Argument(..) => ErrorKind::Argument,
            Self::UnsupportedCommand { .. } => ErrorKind::UnsupportedCommand,
            Self::Lookup { .. } => ErrorKind::Lookup,
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Classifies an I/O failure on an established channel.
    pub(crate) fn from_channel(e: io::Error, timeout: Option<Duration>) -> Self {
        match (e.kind(), timeout) {
            (io::ErrorKind::WouldBlock, Some(timeout))
            | (io::ErrorKind::TimedOut, Some(timeout)) => Self::Timeout { timeout },
            (io::ErrorKind::UnexpectedEof, _)
            | (io::ErrorKind::ConnectionReset, _)
            | (io::ErrorKind::ConnectionAborted, _)
            | (io::ErrorKind::BrokenPipe, _) => Self::Disconnected,
            _ => Self::Io { source: e },
        }
    }
}

impl From<qmpctl_spec::Error> for Error {
    fn from(e: qmpctl_spec::Error) -> Self {
        Self::Qmp {
            class: e.class,
            desc: e.desc,
        }
    }
}
