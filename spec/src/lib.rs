#![doc(html_root_url = "https://docs.rs/qmpctl-spec/0.1.0")]

//! Documents exchanged over a QMP control channel.
//!
//! Every document travels as a single JSON value followed by
//! [`LINE_DELIMITER`]. Outgoing documents are rendered with a space after
//! each key and after each separating comma, matching what the monitor
//! documentation shows (`{"execute": "qmp_capabilities"}`).

use std::{error, fmt, io};
use serde::{Serialize, Deserialize};
use serde_json::ser::{Formatter, Serializer};

pub use serde_json::Value as Any;

/// Terminator appended to every outgoing document and expected after every
/// incoming line.
pub const LINE_DELIMITER: &[u8] = b"\r\n";

/// The command that must be executed before the monitor accepts any other.
pub const CAPABILITIES_COMMAND: &str = "qmp_capabilities";

/// The simple request form, a bare `execute` without arguments.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct Execute<'a> {
    pub execute: &'a str,
}

impl<'a> Execute<'a> {
    pub fn new(name: &'a str) -> Self {
        Execute {
            execute: name,
        }
    }

    pub fn capabilities() -> Execute<'static> {
        Execute::new(CAPABILITIES_COMMAND)
    }
}

/// Compact JSON with `": "` between keys and values and `", "` between
/// members.
#[derive(Debug, Default, Copy, Clone)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

/// Renders `value` as a single-line document using [`SpacedFormatter`].
///
/// The delimiter is not included.
pub fn to_document<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::with_capacity(64);
    {
        let mut ser = Serializer::with_formatter(&mut buf, SpacedFormatter);
        value.serialize(&mut ser)?;
    }

    String::from_utf8(buf).map_err(serde::ser::Error::custom)
}

mod error_serde {
    use serde::{Serialize, Serializer, Deserialize, Deserializer};
    use crate::Error;

    #[derive(Deserialize)]
    struct QapiError {
        error: Error,
    }

    #[derive(Serialize)]
    struct QapiErrorSer<'a> {
        error: &'a Error,
    }

    pub fn serialize<S: Serializer>(data: &Error, serializer: S) -> Result<S::Ok, S::Error> {
        QapiErrorSer {
            error: data,
        }.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Error, D::Error> {
        QapiError::deserialize(deserializer).map(|e| e.error)
    }
}

/// A command reply: either `{"return": ...}` or `{"error": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response<C> {
    Err(
        #[serde(with = "error_serde")]
        Error
    ),
    Ok {
        #[serde(rename = "return")]
        return_: C,
    },
}

impl<C> Response<C> {
    pub fn result(self) -> Result<C, Error> {
        match self {
            Response::Ok { return_ } => Ok(return_),
            Response::Err(e) => Err(e),
        }
    }
}

/// The error object carried by a failed reply.
///
/// The class is kept as text; monitors have grown new classes over time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Error {
    pub class: String,
    pub desc: String,
}

impl error::Error for Error { }

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.class, self.desc)
    }
}

/// One element of the `query-chardev` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChardevInfo {
    pub label: String,
    pub filename: String,
    #[serde(rename = "frontend-open", default, skip_serializing_if = "Option::is_none")]
    pub frontend_open: Option<bool>,
}

impl ChardevInfo {
    /// Prefix the monitor puts in front of pseudo-terminal paths.
    pub const PTY_PREFIX: &'static str = "pty:";

    /// The host-side path, with a leading [`PTY_PREFIX`](Self::PTY_PREFIX)
    /// removed.
    pub fn host_path(&self) -> &str {
        self.filename.strip_prefix(Self::PTY_PREFIX).unwrap_or(&self.filename)
    }
}
