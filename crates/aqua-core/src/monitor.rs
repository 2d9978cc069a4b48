//! The monitoring cycle
//!
//! One cycle samples every sensor, serves at most one waiting HTTP client,
//! redraws the display summary and then idles for the sample interval.
//! Nothing in a cycle can stop the next one from running.

use embedded_hal_async::delay::DelayNs;
use log::{debug, warn};

use crate::app_state::CyclePhase;
use crate::config::MonitorConfig;
use crate::display::{TextDisplay, render_summary};
use crate::http::{Acceptor, HttpPublisher, ServeOutcome};
use crate::sampling::Sampler;
use crate::sensors::{AnalogInputs, TemperatureBus};
use crate::snapshot::SensorSnapshot;

/// Result of one cycle, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub served: ServeOutcome,
    /// `false` if the display rejected the frame
    pub display_ok: bool,
}

/// Owns every capability and the snapshot they share.
pub struct Monitor<A, T, L, V, D> {
    config: MonitorConfig,
    sampler: Sampler<A, T>,
    acceptor: L,
    display: V,
    delay: D,
    snapshot: SensorSnapshot,
    publisher: HttpPublisher,
    phase: CyclePhase,
    cycles: u32,
}

impl<A, T, L, V, D> Monitor<A, T, L, V, D>
where
    A: AnalogInputs,
    T: TemperatureBus,
    L: Acceptor,
    V: TextDisplay,
    D: DelayNs,
{
    pub fn new(
        config: MonitorConfig,
        sampler: Sampler<A, T>,
        acceptor: L,
        display: V,
        delay: D,
    ) -> Self {
        Self {
            config,
            sampler,
            acceptor,
            display,
            delay,
            snapshot: SensorSnapshot::default(),
            publisher: HttpPublisher::new(),
            phase: CyclePhase::Sample,
            cycles: 0,
        }
    }

    pub fn snapshot(&self) -> &SensorSnapshot {
        &self.snapshot
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn publisher(&self) -> &HttpPublisher {
        &self.publisher
    }

    pub fn display(&self) -> &V {
        &self.display
    }

    pub fn acceptor(&self) -> &L {
        &self.acceptor
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    fn advance(&mut self) {
        self.phase = self.phase.next();
    }

    /// Sample, serve and redraw, without the trailing idle.
    pub async fn step(&mut self) -> CycleReport {
        self.phase = CyclePhase::Sample;
        self.sampler.sample_into(&mut self.snapshot).await;
        debug!("Sampled {:?}", self.snapshot);
        self.advance();

        let served = self
            .publisher
            .publish(
                &mut self.acceptor,
                &mut self.delay,
                &self.snapshot,
                &self.config,
            )
            .await;
        self.advance();

        let readouts = self.snapshot.readouts(&self.config);
        let display_ok = match render_summary(&mut self.display, &readouts) {
            Ok(()) => true,
            Err(e) => {
                warn!("Display update failed: {:?}", e);
                false
            }
        };
        self.advance();

        CycleReport { served, display_ok }
    }

    /// Run one full cycle including the idle interval.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let report = self.step().await;

        self.delay.delay_ms(self.config.sample_interval_ms).await;
        self.advance();
        self.cycles = self.cycles.wrapping_add(1);

        report
    }

    /// Cycle forever.
    pub async fn run(&mut self) -> ! {
        loop {
            let report = self.run_cycle().await;
            if report.served == ServeOutcome::Served {
                debug!("Cycle {}: dashboard served", self.cycles);
            }
        }
    }
}
