//! The three analog probes on ADC1

use aqua_core::sensors::{AnalogChannel, AnalogInputs};
use esp_hal::analog::adc::{Adc, AdcConfig, AdcPin, Attenuation};
use esp_hal::peripherals::ADC1;

use crate::board::{TdsPin, TurbidityPin, WaterLevelPin};

type Adc1 = Adc<'static, ADC1<'static>, esp_hal::Blocking>;

/// ADC1 with the dissolved-solids, turbidity and water-level pins enabled.
///
/// 11 dB attenuation gives the widest input range the ADC supports.
pub struct AdcBank {
    adc: Adc1,
    tds: AdcPin<TdsPin, ADC1<'static>>,
    turbidity: AdcPin<TurbidityPin, ADC1<'static>>,
    water_level: AdcPin<WaterLevelPin, ADC1<'static>>,
}

impl AdcBank {
    pub fn new(
        adc1: ADC1<'static>,
        tds: TdsPin,
        turbidity: TurbidityPin,
        water_level: WaterLevelPin,
    ) -> Self {
        let mut config = AdcConfig::new();
        let tds = config.enable_pin(tds, Attenuation::_11dB);
        let turbidity = config.enable_pin(turbidity, Attenuation::_11dB);
        let water_level = config.enable_pin(water_level, Attenuation::_11dB);

        Self {
            adc: Adc::new(adc1, config),
            tds,
            turbidity,
            water_level,
        }
    }
}

/// Spin on a oneshot conversion, yielding to the executor while it is busy.
macro_rules! read_oneshot {
    ($adc:expr, $pin:expr) => {
        loop {
            if let Ok(raw) = $adc.read_oneshot($pin) {
                break raw;
            }
            embassy_futures::yield_now().await;
        }
    };
}

impl AnalogInputs for AdcBank {
    async fn read_raw(&mut self, channel: AnalogChannel) -> u16 {
        match channel {
            AnalogChannel::DissolvedSolids => read_oneshot!(self.adc, &mut self.tds),
            AnalogChannel::Turbidity => read_oneshot!(self.adc, &mut self.turbidity),
            AnalogChannel::WaterLevel => read_oneshot!(self.adc, &mut self.water_level),
        }
    }
}
