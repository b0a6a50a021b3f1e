#![doc(html_root_url = "https://docs.rs/qmpctl/0.1.0")]

//! Single-shot client for a QEMU monitor control channel.
//!
//! A session is a fixed three-step exchange over a CRLF-delimited text
//! stream: read the greeting, negotiate capabilities, then send exactly one
//! command and read exactly one reply line. There is no pipelining, no event
//! handling and no reconnection.
//!
//! ```no_run
//! use qmpctl::{ConnectOptions, Endpoint, Qmp, Request};
//! # fn demo() -> qmpctl::Result<()> {
//! let mut qmp = Qmp::open(&Endpoint::tcp("localhost", 4444), &ConnectOptions::default())?;
//! let reply = qmp.execute(&Request::simple("query-status"))?;
//! println!("{}", reply.text());
//! # Ok(()) }
//! ```

mod args;
mod qmp;
mod reply;
mod request;
mod stream;

pub mod error;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use qmpctl_spec as spec;
pub use qmpctl_spec::{Any, ChardevInfo, LINE_DELIMITER};

pub use self::args::{Argument, ArgumentValue, Arguments};
pub use self::error::{ArgumentError, Error, ErrorKind, Result};
pub use self::qmp::{ConnectOptions, Endpoint, Qmp};
pub use self::reply::{ChardevMap, Reply};
pub use self::request::Request;
pub use self::stream::Stream;
