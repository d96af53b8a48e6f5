//! Blocking line-oriented client for end-to-end tests.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A connected automation client.
pub struct TestClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TestClient {
    /// Connects to `addr` with a bounded read timeout.
    pub fn connect(addr: SocketAddr) -> Self {
        let writer = TcpStream::connect(addr).expect("connect to server");
        writer
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        let reader = BufReader::new(writer.try_clone().expect("clone stream"));
        Self { writer, reader }
    }

    /// Writes raw bytes without adding a terminator.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write to server");
        self.writer.flush().expect("flush to server");
    }

    /// Writes one `\n`-terminated line.
    pub fn send_line(&mut self, line: &str) {
        self.send_raw(format!("{line}\n").as_bytes());
    }

    /// Reads one reply line and decodes it.
    pub fn read_response(&mut self) -> Value {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read reply");
        assert!(read > 0, "server closed the connection before replying");
        assert!(line.ends_with('\n'), "reply was not newline terminated");
        serde_json::from_str(&line).expect("reply is JSON")
    }

    /// Sends `line` and waits for its reply.
    pub fn call(&mut self, line: &str) -> Value {
        self.send_line(line);
        self.read_response()
    }

    /// Shuts down the sending half so the server observes end of stream.
    pub fn finish_sending(&self) {
        self.writer
            .shutdown(std::net::Shutdown::Write)
            .expect("shutdown write half");
    }

    /// Asserts that the server has closed this connection.
    pub fn expect_closed(&mut self) {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {}
            Ok(_) => panic!("expected the connection to be closed, read {line:?}"),
            Err(error) if error.kind() == io::ErrorKind::ConnectionReset => {}
            Err(error) => panic!("expected the connection to be closed: {error}"),
        }
    }
}
