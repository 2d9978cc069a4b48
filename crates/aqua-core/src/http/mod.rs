//! Single-endpoint HTTP publisher
//!
//! Every connection gets the same dashboard page: the request line is read
//! and discarded, headers and body are ignored, there is no routing and no
//! error page. One connection is served per cycle and then closed.

pub mod page;
pub mod request;

use alloc::string::String;
use embedded_hal_async::delay::DelayNs;
use embedded_io_async::{Read, Write};
use log::{debug, warn};
use thiserror_no_std::Error;

use crate::config::MonitorConfig;
use crate::snapshot::SensorSnapshot;

pub use page::{bar_fill_percent, render_card, render_page};
pub use request::read_request_line;

/// Status line and headers of the only response this server sends.
pub const RESPONSE_HEAD: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n";

/// Pause between the last byte written and closing the connection.
const RESPONSE_SETTLE_MS: u32 = 1;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    #[error("client closed the connection")]
    Closed,
    #[error("connection I/O failed: {0:?}")]
    Io(embedded_io::ErrorKind),
}

impl PublishError {
    pub fn from_io<E: embedded_io::Error>(error: E) -> Self {
        Self::Io(error.kind())
    }
}

/// An accepted client connection.
pub trait Connection: Read + Write {
    /// Shut the connection down. Errors are swallowed; the peer is gone either way.
    fn close(self) -> impl Future<Output = ()>;
}

/// Listening endpoint that hands out waiting clients without blocking.
pub trait Acceptor {
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Return a client that is already waiting, or `None` right away.
    fn accept_pending(&mut self) -> Option<Self::Connection<'_>>;
}

/// What happened on the HTTP side during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeOutcome {
    /// No client was waiting
    Idle,
    /// A full response was written
    Served,
    /// The response was abandoned after a connection fault
    Abandoned(PublishError),
}

async fn write_all<W: Write>(writer: &mut W, mut bytes: &[u8]) -> Result<(), PublishError> {
    while !bytes.is_empty() {
        let n = writer.write(bytes).await.map_err(PublishError::from_io)?;
        if n == 0 {
            return Err(PublishError::Closed);
        }
        bytes = &bytes[n..];
    }
    Ok(())
}

/// Discard the request and write the response head followed by `page`.
pub async fn respond<C: Connection>(connection: &mut C, page: &str) -> Result<(), PublishError> {
    let request_line = read_request_line(connection).await?;
    debug!(
        "HTTP request: {}",
        core::str::from_utf8(&request_line).unwrap_or("<non-utf8>")
    );

    write_all(connection, RESPONSE_HEAD.as_bytes()).await?;
    write_all(connection, page.as_bytes()).await?;
    connection.flush().await.map_err(PublishError::from_io)
}

/// Serves the dashboard to at most one client per call.
pub struct HttpPublisher {
    page: String,
}

impl Default for HttpPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpPublisher {
    pub fn new() -> Self {
        Self {
            page: String::new(),
        }
    }

    /// The page served by the most recent [`publish`](Self::publish), if any.
    pub fn last_page(&self) -> &str {
        &self.page
    }

    /// Render the dashboard for `snapshot` into the reusable page buffer.
    pub fn render(&mut self, snapshot: &SensorSnapshot, config: &MonitorConfig) -> &str {
        self.page.clear();
        // Writing into a String cannot fail
        let _ = render_page(&mut self.page, &snapshot.readouts(config));
        &self.page
    }

    /// Serve one waiting client, if there is one.
    ///
    /// Connection faults are logged and reported in the outcome; they never
    /// propagate further. The connection is closed in every case.
    pub async fn publish<L, D>(
        &mut self,
        acceptor: &mut L,
        delay: &mut D,
        snapshot: &SensorSnapshot,
        config: &MonitorConfig,
    ) -> ServeOutcome
    where
        L: Acceptor,
        D: DelayNs,
    {
        let Some(mut connection) = acceptor.accept_pending() else {
            return ServeOutcome::Idle;
        };

        self.render(snapshot, config);
        let outcome = match respond(&mut connection, &self.page).await {
            Ok(()) => {
                delay.delay_ms(RESPONSE_SETTLE_MS).await;
                debug!("Served dashboard ({} bytes)", self.page.len());
                ServeOutcome::Served
            }
            Err(e) => {
                warn!("Abandoning HTTP response: {}", e);
                ServeOutcome::Abandoned(e)
            }
        };

        connection.close().await;
        outcome
    }
}
