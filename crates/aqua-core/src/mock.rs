//! In-memory stand-ins for the hardware capabilities, used by the unit tests.

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use embedded_hal_async::delay::DelayNs;
use embedded_io::ErrorKind;
use embedded_io_async::{Read, Write};

use crate::display::{FontScale, TextDisplay};
use crate::http::{Acceptor, Connection};
use crate::sensors::{AnalogChannel, AnalogInputs, SensorError, TemperatureBus};

/// Analog inputs that return fixed codes per channel.
pub struct MockAnalog {
    pub dissolved_solids: u16,
    pub turbidity: u16,
    pub water_level: u16,
}

impl MockAnalog {
    pub fn new(dissolved_solids: u16, turbidity: u16, water_level: u16) -> Self {
        Self {
            dissolved_solids,
            turbidity,
            water_level,
        }
    }
}

impl AnalogInputs for MockAnalog {
    async fn read_raw(&mut self, channel: AnalogChannel) -> u16 {
        match channel {
            AnalogChannel::DissolvedSolids => self.dissolved_solids,
            AnalogChannel::Turbidity => self.turbidity,
            AnalogChannel::WaterLevel => self.water_level,
        }
    }
}

/// Temperature bus with a single canned answer.
pub struct MockTemperatureBus {
    reading: Option<f32>,
    pub last_probe: Option<usize>,
    pub conversions: usize,
}

impl MockTemperatureBus {
    pub fn reading(celsius: f32) -> Self {
        Self {
            reading: Some(celsius),
            last_probe: None,
            conversions: 0,
        }
    }

    /// A bus on which every transaction fails.
    pub fn failing() -> Self {
        Self {
            reading: None,
            last_probe: None,
            conversions: 0,
        }
    }
}

impl TemperatureBus for MockTemperatureBus {
    async fn request_conversion(&mut self) -> Result<(), SensorError> {
        self.conversions += 1;
        match self.reading {
            Some(_) => Ok(()),
            None => Err(SensorError::NotFound {
                sensor: "mock probe",
            }),
        }
    }

    async fn read_celsius(&mut self, probe: usize) -> Result<f32, SensorError> {
        self.last_probe = Some(probe);
        self.reading.ok_or(SensorError::ReadFailed {
            sensor: "mock probe",
            operation: "read scratchpad",
        })
    }
}

struct PendingClient {
    request: Vec<u8>,
    write_limit: Option<usize>,
}

/// Acceptor over a queue of scripted clients.
#[derive(Default)]
pub struct MockAcceptor {
    queue: VecDeque<PendingClient>,
    /// Number of `accept_pending` calls
    pub polls: usize,
    /// Bytes written to each closed connection, in close order
    pub responses: Vec<Vec<u8>>,
    pub closed: usize,
}

impl MockAcceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_request(&mut self, request: &[u8]) {
        self.queue.push_back(PendingClient {
            request: Vec::from(request),
            write_limit: None,
        });
    }

    /// Queue a client whose connection resets after `write_limit` bytes.
    pub fn push_flaky(&mut self, request: &[u8], write_limit: usize) {
        self.queue.push_back(PendingClient {
            request: Vec::from(request),
            write_limit: Some(write_limit),
        });
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Acceptor for MockAcceptor {
    type Connection<'a> = MockConnection<'a>;

    fn accept_pending(&mut self) -> Option<Self::Connection<'_>> {
        self.polls += 1;
        let client = self.queue.pop_front()?;
        Some(MockConnection {
            request: client.request,
            read_pos: 0,
            written: Vec::new(),
            write_limit: client.write_limit,
            acceptor: self,
        })
    }
}

pub struct MockConnection<'a> {
    request: Vec<u8>,
    read_pos: usize,
    written: Vec<u8>,
    write_limit: Option<usize>,
    acceptor: &'a mut MockAcceptor,
}

impl embedded_io::ErrorType for MockConnection<'_> {
    type Error = ErrorKind;
}

impl Read for MockConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.request[self.read_pos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl Write for MockConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let n = match self.write_limit {
            Some(limit) => {
                let room = limit.saturating_sub(self.written.len());
                if room == 0 {
                    return Err(ErrorKind::ConnectionReset);
                }
                room.min(buf.len())
            }
            None => buf.len(),
        };
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for MockConnection<'_> {
    async fn close(self) {
        self.acceptor.responses.push(self.written);
        self.acceptor.closed += 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayOp {
    Clear,
    Text {
        x: i32,
        y: i32,
        scale: FontScale,
        text: String,
    },
    Present,
}

/// Display that records every call, optionally failing on `present`.
#[derive(Default)]
pub struct RecordingDisplay {
    pub ops: Vec<DisplayOp>,
    pub fail_present: bool,
}

impl TextDisplay for RecordingDisplay {
    type Error = &'static str;

    fn clear(&mut self) -> Result<(), Self::Error> {
        self.ops.push(DisplayOp::Clear);
        Ok(())
    }

    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        scale: FontScale,
        text: &str,
    ) -> Result<(), Self::Error> {
        self.ops.push(DisplayOp::Text {
            x,
            y,
            scale,
            text: String::from(text),
        });
        Ok(())
    }

    fn present(&mut self) -> Result<(), Self::Error> {
        if self.fail_present {
            return Err("panel not responding");
        }
        self.ops.push(DisplayOp::Present);
        Ok(())
    }
}

/// Delay that returns immediately and remembers what was asked for.
#[derive(Default)]
pub struct RecordingDelay {
    pub calls_ms: Vec<u32>,
}

impl DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.calls_ms.push(ns / 1_000_000);
    }

    async fn delay_us(&mut self, us: u32) {
        self.calls_ms.push(us / 1_000);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.calls_ms.push(ms);
    }
}
