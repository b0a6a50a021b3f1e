use std::io::{self, Read, Write, BufRead, BufReader};
use std::net::TcpStream;

/// A buffered read half paired with a write half.
///
/// Lets the client run over anything that can be split that way: a TCP
/// socket and its clone, or a byte slice and a `Vec<u8>` in tests.
pub struct Stream<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Stream<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Stream {
            reader,
            writer,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl Stream<BufReader<TcpStream>, TcpStream> {
    /// Splits a socket into a buffered reader over a clone of the handle and
    /// the original handle for writing.
    pub fn from_tcp(socket: TcpStream) -> io::Result<Self> {
        let reader = BufReader::new(socket.try_clone()?);
        Ok(Stream::new(reader, socket))
    }
}

impl<R: Read, W> Read for Stream<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl<R: BufRead, W> BufRead for Stream<R, W> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.reader.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        self.reader.consume(amt)
    }
}

impl<R, W: Write> Write for Stream<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
