//! Scripted in-process peer for tests.
//!
//! Gated behind `cfg(test)` or the `mock` Cargo feature.
//!
//! A [`MockPeer`] listens on an ephemeral loopback port, accepts exactly one
//! connection, writes the greeting, and then walks its [`MockScript`]: each
//! step consumes one CRLF-delimited document from the client and answers it.
//! Every document received is recorded and handed back by
//! [`MockPeer::finish`].

use std::io::{self, BufReader, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::trace;
use serde::Serialize;
use qmpctl_spec::{to_document, LINE_DELIMITER};

use crate::qmp::{read_crlf_line, Endpoint};

/// What the peer does after reading one document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MockStep {
    /// Write this line (delimiter appended).
    Reply(String),
    /// Say nothing and wait for the client to go away.
    Silent,
    /// Close the connection.
    HangUp,
}

/// Greeting plus one step per expected client document.
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Raw greeting line.
    pub greeting: String,
    pub steps: Vec<MockStep>,
}

impl MockScript {
    /// Greeting line of a recent QEMU.
    pub const DEFAULT_GREETING: &'static str =
        r#"{"QMP": {"version": {"qemu": {"micro": 0, "minor": 2, "major": 8}, "package": "mock"}, "capabilities": ["oob"]}}"#;

    /// Default greeting, no steps.
    pub fn new() -> Self {
        MockScript {
            greeting: Self::DEFAULT_GREETING.into(),
            steps: Vec::new(),
        }
    }

    /// Default greeting with the capabilities negotiation answered.
    pub fn negotiated() -> Self {
        Self::new().reply(r#"{"return": {}}"#)
    }

    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn reply(mut self, line: impl Into<String>) -> Self {
        self.steps.push(MockStep::Reply(line.into()));
        self
    }

    /// Answer with `{"return": <value>}`.
    pub fn reply_return<T: Serialize>(self, value: &T) -> Self {
        #[derive(Serialize)]
        struct Return<'a, T> {
            #[serde(rename = "return")]
            return_: &'a T,
        }

        let line = to_document(&Return { return_: value })
            .unwrap_or_else(|e| panic!("unserializable mock reply: {}", e));
        self.reply(line)
    }

    /// Answer with `{"error": {"class": .., "desc": ..}}`.
    pub fn reply_error(self, class: &str, desc: &str) -> Self {
        let line = to_document(&serde_json::json!({ "error": { "class": class, "desc": desc } }))
            .unwrap_or_else(|e| panic!("unserializable mock reply: {}", e));
        self.reply(line)
    }

    pub fn silent(mut self) -> Self {
        self.steps.push(MockStep::Silent);
        self
    }

    pub fn hang_up(mut self) -> Self {
        self.steps.push(MockStep::HangUp);
        self
    }
}

impl Default for MockScript {
    fn default() -> Self {
        Self::new()
    }
}

/// A running mock peer.
pub struct MockPeer {
    endpoint: Endpoint,
    connections: Arc<AtomicUsize>,
    handle: JoinHandle<io::Result<Vec<String>>>,
}

impl MockPeer {
    /// Binds `127.0.0.1:0` and serves `script` to the first connection.
    pub fn start(script: MockScript) -> io::Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", 0))?;
        let port = listener.local_addr()?.port();
        let connections = Arc::new(AtomicUsize::new(0));

        let accepted = connections.clone();
        let handle = thread::spawn(move || {
            let (socket, _) = listener.accept()?;
            accepted.fetch_add(1, Ordering::SeqCst);
            serve(socket, script)
        });

        Ok(MockPeer {
            endpoint: Endpoint::tcp("127.0.0.1", port),
            connections,
            handle,
        })
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    /// Number of connections accepted so far; never more than one.
    ///
    /// Unlike [`finish`](Self::finish) this does not block, so it can show
    /// that nothing ever dialled the peer.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Waits for the session to end and returns every document received,
    /// delimiters stripped.
    ///
    /// Blocks until a client has connected and disconnected.
    pub fn finish(self) -> io::Result<Vec<String>> {
        self.handle.join()
            .unwrap_or_else(|_| Err(io::Error::new(io::ErrorKind::Other, "mock peer panicked")))
    }
}

fn serve(mut socket: TcpStream, script: MockScript) -> io::Result<Vec<String>> {
    let mut reader = BufReader::new(socket.try_clone()?);
    let mut received = Vec::new();

    write_line(&mut socket, &script.greeting)?;

    for step in script.steps {
        match read_document(&mut reader)? {
            Some(doc) => received.push(doc),
            None => return Ok(received),
        }

        match step {
            MockStep::Reply(line) => write_line(&mut socket, &line)?,
            MockStep::Silent => break,
            MockStep::HangUp => {
                let _ = socket.shutdown(Shutdown::Both);
                return Ok(received)
            },
        }
    }

    // Keep recording until the client closes; a silent peer ends up here too.
    while let Some(doc) = read_document(&mut reader)? {
        received.push(doc);
    }

    Ok(received)
}

fn read_document(reader: &mut BufReader<TcpStream>) -> io::Result<Option<String>> {
    let mut buf = Vec::new();
    match read_crlf_line(reader, &mut buf) {
        Ok(0) => Ok(None),
        Ok(..) => {
            buf.truncate(buf.len() - LINE_DELIMITER.len());
            let doc = String::from_utf8_lossy(&buf).into_owned();
            trace!("mock <- {}", doc);
            Ok(Some(doc))
        },
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof || e.kind() == io::ErrorKind::ConnectionReset => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_line(socket: &mut TcpStream, line: &str) -> io::Result<()> {
    trace!("mock -> {}", line);
    socket.write_all(line.as_bytes())?;
    socket.write_all(LINE_DELIMITER)?;
    socket.flush()
}
