#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
#![deny(clippy::large_stack_frames)]

use aqua_core::app_state::{AppError, describe};
use aqua_core::config::{Config, InternetConfig, MonitorConfig};
use aqua_core::display::{BufferedDisplay, DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
use aqua_core::monitor::Monitor;
use aqua_core::sampling::Sampler;
use aqua_firmware::analog::AdcBank;
use aqua_firmware::board;
use aqua_firmware::ds18b20_bus::{Ds18b20Bus, OneWirePin};
use aqua_firmware::net::{self, TcpAcceptor};
use aqua_firmware::wifi_secrets::{WIFI_PASSWORD, WIFI_SSID};
use embassy_executor::Spawner;
use embassy_time::{Delay, Timer};
use esp_hal::clock::CpuClock;
use esp_hal::gpio::{Level, Output, OutputConfig};
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn};

// Display-LCD panel specific imports
use embedded_hal_bus::spi::ExclusiveDevice;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use mipidsi::interface::SpiInterface;
use mipidsi::{Builder as MipidsiBuilder, models::ILI9342CRgb565};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    rtt_target::rprintln!("PANIC: {}", info);
    loop {}
}

extern crate alloc;

// This creates a default app-descriptor required by the esp-idf bootloader.
esp_bootloader_esp_idf::esp_app_desc!();

/// Park the firmware after an unrecoverable startup failure.
async fn halt_forever() -> ! {
    loop {
        Timer::after_secs(60).await;
    }
}

#[allow(
    clippy::large_stack_frames,
    reason = "it's not unusual to allocate larger buffers etc. in main"
)]
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    rtt_target::rtt_init_log!();

    let hal_config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(hal_config);

    esp_alloc::heap_allocator!(#[esp_hal::ram(reclaimed)] size: 73744);
    // The display framebuffer lives in PSRAM
    esp_alloc::psram_allocator!(peripherals.PSRAM, esp_hal::psram);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let config = Config {
        internet: InternetConfig {
            ssid: WIFI_SSID,
            password: WIFI_PASSWORD,
        },
        monitor: MonitorConfig::default(),
    };

    // Power rails first: the panel and the probes are dead without them
    let i2c = match board::create_i2c_bus(peripherals.I2C0, peripherals.GPIO12, peripherals.GPIO11)
    {
        Ok(i2c) => i2c,
        Err(e) => {
            error!("{}", e);
            halt_forever().await
        }
    };
    let _pmic = match board::power_up(i2c).await {
        Ok(pmic) => Some(pmic),
        Err(e) => {
            warn!("Continuing without power management: {}", e);
            None
        }
    };

    // Network
    let (mut wifi_controller, stack) = match net::start_network(&spawner, peripherals.WIFI) {
        Ok(network) => network,
        Err(e) => {
            error!("{}", e);
            halt_forever().await
        }
    };
    if let Err(e) = net::connect(&mut wifi_controller, stack, &config.internet).await {
        error!("{}", e);
        halt_forever().await
    }

    // Display
    let spi_bus = match Spi::new(peripherals.SPI2, SpiConfig::default()) {
        Ok(spi) => spi
            .with_sck(peripherals.GPIO36)
            .with_mosi(peripherals.GPIO37),
        Err(e) => {
            error!("{}", AppError::Display(describe("panel SPI", e)));
            halt_forever().await
        }
    };
    let cs = Output::new(peripherals.GPIO35, Level::High, OutputConfig::default());
    let Ok(spi_device) = ExclusiveDevice::new_no_delay(spi_bus, cs);
    let dc = Output::new(peripherals.GPIO34, Level::Low, OutputConfig::default());
    let mut spi_buffer = [0u8; 512];
    let di = SpiInterface::new(spi_device, dc, &mut spi_buffer);

    let panel = match MipidsiBuilder::new(ILI9342CRgb565, di)
        .display_size(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX)
        .init(&mut Delay)
    {
        Ok(panel) => panel,
        Err(e) => {
            error!("{}", AppError::Display(describe("panel init", e)));
            halt_forever().await
        }
    };
    info!("Display initialized");

    // Sensors
    let analog = AdcBank::new(
        peripherals.ADC1,
        peripherals.GPIO8,
        peripherals.GPIO9,
        peripherals.GPIO10,
    );
    // A dead 1-Wire line only costs the temperature reading
    let mut bus = Ds18b20Bus::new(OneWirePin::new(peripherals.GPIO17));
    bus.scan();

    let sampler = match Sampler::new(analog, bus, &config.monitor) {
        Ok(sampler) => sampler,
        Err(e) => {
            error!("{}", AppError::from(e));
            halt_forever().await
        }
    };

    let acceptor = TcpAcceptor::new(stack, config.monitor.http_port);
    let mut monitor = Monitor::new(
        config.monitor,
        sampler,
        acceptor,
        BufferedDisplay::new(panel),
        Delay,
    );

    info!("Water Quality Monitoring System Initialized");
    monitor.run().await
}
