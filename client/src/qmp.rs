use std::{fmt, time::Duration};
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

use log::{debug, trace};
use qmpctl_spec::LINE_DELIMITER;

use crate::{
    error::{Error, Result},
    reply::Reply,
    request::Request,
    stream::Stream,
};

/// Where the monitor listens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Endpoint {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Connection tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Read/write timeout on the socket. `None` (or zero) blocks forever.
    pub timeout: Option<Duration>,
}

impl ConnectOptions {
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        ConnectOptions {
            timeout: timeout.filter(|t| !t.is_zero()),
        }
    }
}

/// Reads one line terminated by `\r\n` into `buf`, delimiter included.
///
/// A lone `\n` does not end the line. Returns the number of bytes read,
/// which is zero only at EOF with nothing buffered; EOF after a partial line
/// is `UnexpectedEof`.
pub(crate) fn read_crlf_line<R: BufRead + ?Sized>(r: &mut R, buf: &mut Vec<u8>) -> io::Result<usize> {
    let start = buf.len();
    loop {
        if r.read_until(b'\n', buf)? == 0 {
            return if buf.len() == start {
                Ok(0)
            } else {
                Err(io::Error::new(io::ErrorKind::UnexpectedEof, "peer closed mid-line"))
            }
        }

        if buf[start..].ends_with(LINE_DELIMITER) {
            return Ok(buf.len() - start)
        }
    }
}

/// CRLF framing over a stream.
struct Qapi<S> {
    stream: S,
    buffer: Vec<u8>,
    timeout: Option<Duration>,
}

impl<S> Qapi<S> {
    fn new(stream: S) -> Self {
        Qapi {
            stream,
            buffer: Default::default(),
            timeout: None,
        }
    }
}

impl<S: BufRead> Qapi<S> {
    fn read_line(&mut self) -> Result<Reply> {
        self.buffer.clear();
        match read_crlf_line(&mut self.stream, &mut self.buffer) {
            Ok(0) => return Err(Error::Disconnected),
            Ok(..) => (),
            Err(e) => return Err(Error::from_channel(e, self.timeout)),
        }

        let line = &self.buffer[..self.buffer.len() - LINE_DELIMITER.len()];
        trace!("<- {}", String::from_utf8_lossy(line));

        Ok(Reply::new(line.to_vec()))
    }
}

impl<S: Write> Qapi<S> {
    fn write_line(&mut self, document: &str) -> Result<()> {
        trace!("-> {}", document);

        let timeout = self.timeout;
        self.stream.write_all(document.as_bytes())
            .and_then(|()| self.stream.write_all(LINE_DELIMITER))
            .and_then(|()| self.stream.flush())
            .map_err(|e| Error::from_channel(e, timeout))
    }
}

/// A control channel session.
///
/// Drives the fixed exchange: read the greeting, negotiate capabilities,
/// then send one command and read its reply.
pub struct Qmp<S> {
    inner: Qapi<S>,
}

impl Qmp<Stream<BufReader<TcpStream>, TcpStream>> {
    /// Opens a socket to `endpoint`. No I/O happens beyond the TCP connect.
    ///
    /// Only the connect itself fails with [`Error::Connect`]; a zero timeout
    /// is treated as none.
    pub fn connect(endpoint: &Endpoint, options: &ConnectOptions) -> Result<Self> {
        debug!("connecting to {}", endpoint);
        let socket = TcpStream::connect((endpoint.host.as_str(), endpoint.port))
            .map_err(|source| Error::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let timeout = options.timeout.filter(|t| !t.is_zero());
        // Best effort: disable Nagle for request/response latency.
        let _ = socket.set_nodelay(true);
        socket.set_read_timeout(timeout)?;
        socket.set_write_timeout(timeout)?;

        let mut qmp = Self::new(Stream::from_tcp(socket)?);
        qmp.inner.timeout = timeout;
        Ok(qmp)
    }

    /// [`connect`](Self::connect) followed by [`handshake`](Qmp::handshake).
    pub fn open(endpoint: &Endpoint, options: &ConnectOptions) -> Result<Self> {
        let mut qmp = Self::connect(endpoint, options)?;
        qmp.handshake()?;
        Ok(qmp)
    }
}

impl<S> Qmp<S> {
    pub fn new(stream: S) -> Self {
        Qmp {
            inner: Qapi::new(stream),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner.stream
    }
}

impl<S: BufRead> Qmp<S> {
    pub fn read_reply(&mut self) -> Result<Reply> {
        self.inner.read_line()
    }
}

impl<S: BufRead + Write> Qmp<S> {
    pub fn write_request(&mut self, request: &Request) -> Result<()> {
        let document = request.render()?;
        self.inner.write_line(&document)
    }

    /// Reads the greeting, sends `qmp_capabilities` and reads its reply.
    ///
    /// Neither line is inspected; the greeting is returned for logging.
    pub fn handshake(&mut self) -> Result<Reply> {
        let greeting = self.read_reply()?;
        debug!("greeting: {}", greeting.text());

        self.write_request(&Request::simple(qmpctl_spec::CAPABILITIES_COMMAND))?;
        let negotiated = self.read_reply()?;
        debug!("capabilities: {}", negotiated.text());

        Ok(greeting)
    }

    /// Sends one command and reads one reply line.
    ///
    /// When `echo` is given, the request document is written to it before
    /// it goes on the wire and the reply line after it has been read, each
    /// followed by a newline.
    pub fn send_command(&mut self, request: &Request, mut echo: Option<&mut dyn Write>) -> Result<Reply> {
        let document = request.render()?;

        if let Some(echo) = echo.as_mut() {
            writeln!(echo, "{}", document)?;
            echo.flush()?;
        }

        self.inner.write_line(&document)?;
        let reply = self.read_reply()?;

        if let Some(echo) = echo.as_mut() {
            echo.write_all(reply.as_bytes())?;
            echo.write_all(b"\n")?;
            echo.flush()?;
        }

        Ok(reply)
    }

    /// [`send_command`](Self::send_command) without echo.
    pub fn execute(&mut self, request: &Request) -> Result<Reply> {
        self.send_command(request, None)
    }
}
