//! Dashboard endpoint on a host TCP port

use std::io::{self, Read as _, Write as _};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::time::Duration;

use aqua_core::http::{Acceptor, Connection};
use log::{debug, warn};

/// Give up on a client that stalls for this long.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a host socket error for the `embedded-io` traits.
#[derive(Debug)]
pub struct IoError(io::Error);

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for IoError {}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;
        match self.0.kind() {
            io::ErrorKind::ConnectionReset => ErrorKind::ConnectionReset,
            io::ErrorKind::ConnectionAborted => ErrorKind::ConnectionAborted,
            io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ErrorKind::TimedOut,
            io::ErrorKind::Interrupted => ErrorKind::Interrupted,
            _ => ErrorKind::Other,
        }
    }
}

/// Non-blocking listener handing out one waiting client at a time.
pub struct StdAcceptor {
    listener: TcpListener,
}

impl StdAcceptor {
    pub fn bind(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        Ok(Self { listener })
    }

    pub fn local_port(&self) -> Option<u16> {
        self.listener.local_addr().ok().map(|addr| addr.port())
    }
}

impl Acceptor for StdAcceptor {
    type Connection<'a> = StdConnection;

    fn accept_pending(&mut self) -> Option<Self::Connection<'_>> {
        let (stream, peer) = match self.listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return None,
            Err(e) => {
                warn!("Accept failed: {}", e);
                return None;
            }
        };

        // The client itself is served with blocking I/O and timeouts
        let configured = stream
            .set_nonblocking(false)
            .and_then(|_| stream.set_read_timeout(Some(CLIENT_TIMEOUT)))
            .and_then(|_| stream.set_write_timeout(Some(CLIENT_TIMEOUT)));
        if let Err(e) = configured {
            warn!("Dropping client {}: {}", peer, e);
            return None;
        }

        debug!("Client connected from {}", peer);
        Some(StdConnection { stream })
    }
}

pub struct StdConnection {
    stream: TcpStream,
}

impl embedded_io::ErrorType for StdConnection {
    type Error = IoError;
}

impl embedded_io_async::Read for StdConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.stream.read(buf).map_err(IoError)
    }
}

impl embedded_io_async::Write for StdConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.stream.write(buf).map_err(IoError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.stream.flush().map_err(IoError)
    }
}

impl Connection for StdConnection {
    async fn close(mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Write) {
            debug!("Shutdown failed: {}", e);
        }
        // Unread request bytes would turn the close into a reset
        let mut sink = [0u8; 256];
        if self.stream.set_nonblocking(true).is_ok() {
            while matches!(self.stream.read(&mut sink), Ok(n) if n > 0) {}
        }
    }
}
