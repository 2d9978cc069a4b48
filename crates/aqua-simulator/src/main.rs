//! Desktop simulator for the aqua water-quality monitor.
//!
//! Runs the real monitoring cycle from `aqua-core` against synthetic
//! probes, a host TCP listener and an `embedded-graphics-simulator`
//! display. Point a browser at `http://localhost:8080/` to see the
//! dashboard.
//!
//! # Environment
//!
//! | Variable            | Meaning                                        |
//! |---------------------|------------------------------------------------|
//! | `AQUA_SIM_CONFIG`   | JSON file with a `MonitorConfig`               |
//! | `AQUA_SIM_PORT`     | Dashboard port (default 8080)                  |
//! | `AQUA_SIM_NO_PROBE` | Any value unplugs the temperature probe        |
//! | `RUST_LOG`          | `env_logger` filter                            |
//!
//! Build with `--features window` to watch the display in an SDL2 window.

mod net;
mod panel;
mod sensors;

#[cfg(not(feature = "window"))]
use std::time::Duration;

use aqua_core::config::MonitorConfig;
use aqua_core::display::BufferedDisplay;
use aqua_core::monitor::Monitor;
use aqua_core::sampling::Sampler;
use embassy_futures::block_on;
use log::{error, info};

use crate::net::StdAcceptor;
use crate::panel::SharedPanel;
use crate::sensors::{SyntheticAnalog, SyntheticProbe};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const DEFAULT_PORT: u16 = 8080;

/// Read the monitor configuration from `AQUA_SIM_CONFIG`, if set.
fn load_config() -> Result<MonitorConfig, String> {
    let mut config = match std::env::var("AQUA_SIM_CONFIG") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
            serde_json::from_str::<MonitorConfig>(&text).map_err(|e| format!("{path}: {e}"))?
        }
        Err(_) => MonitorConfig::default(),
    };

    config.http_port = match std::env::var("AQUA_SIM_PORT") {
        Ok(port) => port
            .parse()
            .map_err(|e| format!("AQUA_SIM_PORT={port}: {e}"))?,
        Err(_) => DEFAULT_PORT,
    };

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

type SimSampler = Sampler<SyntheticAnalog, SyntheticProbe>;

fn main() {
    env_logger::init();
    info!("Starting aqua simulator");

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let probe_connected = std::env::var_os("AQUA_SIM_NO_PROBE").is_none();
    if !probe_connected {
        info!("Temperature probe unplugged");
    }

    let sampler = match Sampler::new(
        SyntheticAnalog::new(),
        SyntheticProbe::new(probe_connected),
        &config,
    ) {
        Ok(sampler) => sampler,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    let acceptor = match StdAcceptor::bind(config.http_port) {
        Ok(acceptor) => acceptor,
        Err(e) => {
            error!("Cannot listen on port {}: {}", config.http_port, e);
            std::process::exit(1);
        }
    };
    info!("Dashboard at http://localhost:{}/", config.http_port);

    info!("Water Quality Monitoring System Initialized");
    run(config, sampler, acceptor);
}

// ---------------------------------------------------------------------------
// Headless
// ---------------------------------------------------------------------------

/// Delay backed by the host thread sleep.
#[cfg(not(feature = "window"))]
struct StdDelay;

#[cfg(not(feature = "window"))]
impl embedded_hal_async::delay::DelayNs for StdDelay {
    async fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(ns as u64));
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

#[cfg(not(feature = "window"))]
fn run(config: MonitorConfig, sampler: SimSampler, acceptor: StdAcceptor) -> ! {
    let (panel, _handle) = SharedPanel::new();
    let mut monitor = Monitor::new(
        config,
        sampler,
        acceptor,
        BufferedDisplay::new(panel),
        StdDelay,
    );
    block_on(monitor.run())
}

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

#[cfg(feature = "window")]
mod window {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::{Duration, Instant};

    use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorEvent, Window};

    use crate::panel::PanelHandle;

    const WINDOW_SCALE: u32 = 2;
    const FRAME_DURATION: Duration = Duration::from_millis(33);

    /// Delay that keeps redrawing the window and handling its events.
    ///
    /// Closing the window cuts the current pause short and raises `quit`.
    pub struct WindowDelay {
        window: Window,
        panel: PanelHandle,
        quit: Rc<Cell<bool>>,
    }

    impl WindowDelay {
        pub fn open(panel: PanelHandle, quit: Rc<Cell<bool>>) -> Self {
            let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
            Self {
                window: Window::new("Aqua Simulator", &output_settings),
                panel,
                quit,
            }
        }
    }

    impl embedded_hal_async::delay::DelayNs for WindowDelay {
        async fn delay_ns(&mut self, ns: u32) {
            std::thread::sleep(Duration::from_nanos(ns as u64));
        }

        async fn delay_ms(&mut self, ms: u32) {
            let deadline = Instant::now() + Duration::from_millis(ms as u64);
            loop {
                self.window.update(&self.panel.borrow());
                if self
                    .window
                    .events()
                    .any(|event| matches!(event, SimulatorEvent::Quit))
                {
                    self.quit.set(true);
                }

                let now = Instant::now();
                if self.quit.get() || now >= deadline {
                    break;
                }
                std::thread::sleep(FRAME_DURATION.min(deadline - now));
            }
        }
    }
}

/// Same cycle as the device; the idle pause doubles as the window's event loop.
#[cfg(feature = "window")]
fn run(config: MonitorConfig, sampler: SimSampler, acceptor: StdAcceptor) {
    use std::cell::Cell;
    use std::rc::Rc;

    let (panel, handle) = SharedPanel::new();
    let quit = Rc::new(Cell::new(false));
    let delay = window::WindowDelay::open(handle, Rc::clone(&quit));
    let mut monitor = Monitor::new(
        config,
        sampler,
        acceptor,
        BufferedDisplay::new(panel),
        delay,
    );

    while !quit.get() {
        block_on(monitor.run_cycle());
    }

    info!("Simulator exiting after {} cycles", monitor.cycles());
}
