//! Periodic acquisition of all sensors into a [`SensorSnapshot`]

use log::{debug, warn};

use crate::config::{
    AdcConfig, ConfigError, DISSOLVED_SOLIDS_PPM_PER_VOLT, LinearMapping, MonitorConfig,
};
use crate::sensors::{AnalogChannel, AnalogInputs, TEMPERATURE_DISCONNECTED_C, TemperatureBus};
use crate::snapshot::SensorSnapshot;

/// Conversion from raw ADC codes to physical units for the analog channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conversion {
    adc: AdcConfig,
    dissolved_solids: LinearMapping,
    turbidity: LinearMapping,
    water_level: LinearMapping,
}

impl Conversion {
    pub fn new(config: &MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            adc: config.adc,
            dissolved_solids: LinearMapping::scaled(DISSOLVED_SOLIDS_PPM_PER_VOLT),
            turbidity: LinearMapping::IDENTITY,
            water_level: config.water_level.mapping(),
        })
    }

    pub fn voltage(&self, raw: u16) -> f32 {
        self.adc.to_voltage(raw)
    }

    pub fn dissolved_solids_ppm(&self, raw: u16) -> f32 {
        self.dissolved_solids.apply(self.voltage(raw))
    }

    pub fn turbidity_ntu(&self, raw: u16) -> f32 {
        self.turbidity.apply(self.voltage(raw))
    }

    pub fn water_level(&self, raw: u16) -> f32 {
        self.water_level.apply(self.voltage(raw))
    }
}

/// Reads every sensor once per call.
pub struct Sampler<A, T> {
    analog: A,
    bus: T,
    conversion: Conversion,
    probe: usize,
}

impl<A, T> Sampler<A, T>
where
    A: AnalogInputs,
    T: TemperatureBus,
{
    pub fn new(analog: A, bus: T, config: &MonitorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            analog,
            bus,
            conversion: Conversion::new(config)?,
            probe: config.temperature_probe,
        })
    }

    pub fn analog_mut(&mut self) -> &mut A {
        &mut self.analog
    }

    /// Take one complete sample.
    ///
    /// A bus failure is reported as the disconnected sentinel so the caller
    /// always gets a full snapshot.
    pub async fn sample(&mut self) -> SensorSnapshot {
        let tds_raw = self.analog.read_raw(AnalogChannel::DissolvedSolids).await;
        let turbidity_raw = self.analog.read_raw(AnalogChannel::Turbidity).await;
        let level_raw = self.analog.read_raw(AnalogChannel::WaterLevel).await;
        debug!(
            "Raw codes: tds={} turbidity={} level={}",
            tds_raw, turbidity_raw, level_raw
        );

        let temperature = self.read_temperature().await;

        SensorSnapshot {
            dissolved_solids: self.conversion.dissolved_solids_ppm(tds_raw),
            turbidity: self.conversion.turbidity_ntu(turbidity_raw),
            water_level: self.conversion.water_level(level_raw),
            temperature,
        }
    }

    /// Sample and replace `snapshot` as a whole.
    pub async fn sample_into(&mut self, snapshot: &mut SensorSnapshot) {
        *snapshot = self.sample().await;
    }

    async fn read_temperature(&mut self) -> f32 {
        if let Err(e) = self.bus.request_conversion().await {
            warn!("Temperature conversion failed: {}", e);
            return TEMPERATURE_DISCONNECTED_C;
        }

        match self.bus.read_celsius(self.probe).await {
            Ok(celsius) => celsius,
            Err(e) => {
                warn!("Temperature probe {} read failed: {}", self.probe, e);
                TEMPERATURE_DISCONNECTED_C
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ADC_MAX, WATER_LEVEL_EMPTY_V, WATER_LEVEL_FULL_V, WaterLevelMode};
    use crate::mock::{MockAnalog, MockTemperatureBus};
    use embassy_futures::block_on;

    /// Smallest raw code whose voltage reaches `volts`.
    fn code_for(volts: f32) -> u16 {
        let adc = AdcConfig::default();
        (0..=ADC_MAX)
            .find(|&raw| adc.to_voltage(raw) >= volts)
            .unwrap_or(ADC_MAX)
    }

    fn calibrated() -> Conversion {
        Conversion::new(&MonitorConfig::default()).unwrap()
    }

    #[test]
    fn test_dissolved_solids_full_scale() {
        let ppm = calibrated().dissolved_solids_ppm(4095);
        assert!((ppm - 3300.0).abs() < 0.01, "got {ppm}");
    }

    #[test]
    fn test_dissolved_solids_matches_formula() {
        let conversion = calibrated();
        for raw in [0u16, 1, 1024, 2048, 4000] {
            let expected = raw as f32 * (3.3 / 4095.0) * 1000.0;
            assert!((conversion.dissolved_solids_ppm(raw) - expected).abs() < 0.01);
        }
    }

    #[test]
    fn test_turbidity_is_voltage() {
        let conversion = calibrated();
        assert_eq!(conversion.turbidity_ntu(0), 0.0);
        assert!((conversion.turbidity_ntu(ADC_MAX) - 3.3).abs() < 1e-5);
    }

    #[test]
    fn test_water_level_always_in_percent_range() {
        let conversion = calibrated();
        for raw in 0..=ADC_MAX {
            let level = conversion.water_level(raw);
            assert!((0.0..=100.0).contains(&level), "raw {raw} gave {level}");
        }
        assert_eq!(conversion.water_level(u16::MAX), 100.0);
    }

    #[test]
    fn test_water_level_empty_reads_zero() {
        let conversion = calibrated();
        let below = code_for(WATER_LEVEL_EMPTY_V) - 1;
        assert_eq!(conversion.water_level(below), 0.0);
        assert_eq!(conversion.water_level(0), 0.0);

        // Exactly at the empty offset
        let level = LinearMapping::calibrated_percent(WATER_LEVEL_EMPTY_V, WATER_LEVEL_FULL_V)
            .apply(WATER_LEVEL_EMPTY_V);
        assert_eq!(level, 0.0);
    }

    #[test]
    fn test_water_level_full_reads_hundred() {
        let conversion = calibrated();
        assert_eq!(conversion.water_level(code_for(WATER_LEVEL_FULL_V)), 100.0);
        assert_eq!(conversion.water_level(ADC_MAX), 100.0);

        let level = LinearMapping::calibrated_percent(WATER_LEVEL_EMPTY_V, WATER_LEVEL_FULL_V)
            .apply(WATER_LEVEL_FULL_V);
        assert_eq!(level, 100.0);
    }

    #[test]
    fn test_water_level_midpoint() {
        let midpoint = (WATER_LEVEL_EMPTY_V + WATER_LEVEL_FULL_V) / 2.0;
        let level = LinearMapping::calibrated_percent(WATER_LEVEL_EMPTY_V, WATER_LEVEL_FULL_V)
            .apply(midpoint);
        assert!((level - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_uncalibrated_water_level_is_voltage() {
        let config = MonitorConfig {
            water_level: WaterLevelMode::Voltage,
            ..MonitorConfig::default()
        };
        let conversion = Conversion::new(&config).unwrap();
        assert!((conversion.water_level(ADC_MAX) - 3.3).abs() < 1e-5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = MonitorConfig {
            sample_interval_ms: 0,
            ..MonitorConfig::default()
        };
        assert!(Conversion::new(&config).is_err());
    }

    #[test]
    fn test_sample_converts_all_channels() {
        let analog = MockAnalog::new(4095, 2048, 0);
        let bus = MockTemperatureBus::reading(21.5);
        let mut sampler = Sampler::new(analog, bus, &MonitorConfig::default()).unwrap();

        let snapshot = block_on(sampler.sample());

        assert!((snapshot.dissolved_solids - 3300.0).abs() < 0.01);
        assert!((snapshot.turbidity - 2048.0 * 3.3 / 4095.0).abs() < 1e-4);
        assert_eq!(snapshot.water_level, 0.0);
        assert_eq!(snapshot.temperature, 21.5);
    }

    #[test]
    fn test_sample_passes_sentinel_through() {
        let analog = MockAnalog::new(0, 0, 0);
        let bus = MockTemperatureBus::reading(TEMPERATURE_DISCONNECTED_C);
        let mut sampler = Sampler::new(analog, bus, &MonitorConfig::default()).unwrap();

        let snapshot = block_on(sampler.sample());
        assert_eq!(snapshot.temperature, TEMPERATURE_DISCONNECTED_C);
    }

    #[test]
    fn test_bus_failure_becomes_sentinel() {
        let analog = MockAnalog::new(100, 100, 100);
        let mut sampler =
            Sampler::new(analog, MockTemperatureBus::failing(), &MonitorConfig::default())
                .unwrap();

        let snapshot = block_on(sampler.sample());
        assert_eq!(snapshot.temperature, TEMPERATURE_DISCONNECTED_C);
        assert!(snapshot.dissolved_solids > 0.0);
    }

    #[test]
    fn test_sample_into_replaces_whole_snapshot() {
        let analog = MockAnalog::new(1000, 1000, 4095);
        let bus = MockTemperatureBus::reading(18.0);
        let mut sampler = Sampler::new(analog, bus, &MonitorConfig::default()).unwrap();

        let mut snapshot = SensorSnapshot {
            dissolved_solids: 1.0,
            turbidity: 2.0,
            water_level: 3.0,
            temperature: 4.0,
        };
        let expected = block_on(sampler.sample());
        block_on(sampler.sample_into(&mut snapshot));
        assert_eq!(snapshot, expected);
    }

    #[test]
    fn test_sampler_reads_configured_probe() {
        let config = MonitorConfig {
            temperature_probe: 2,
            ..MonitorConfig::default()
        };
        let bus = MockTemperatureBus::reading(12.0);
        let mut sampler = Sampler::new(MockAnalog::new(0, 0, 0), bus, &config).unwrap();

        block_on(sampler.sample());
        assert_eq!(sampler.bus.last_probe, Some(2));
        assert_eq!(sampler.bus.conversions, 1);
    }
}
