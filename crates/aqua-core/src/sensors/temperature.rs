/// Value the DS18B20 family reports when no probe answers.
pub const TEMPERATURE_DISCONNECTED_C: f32 = -127.0;

/// Upper end of the temperature bar on the dashboard.
pub const TEMPERATURE_SCALE_MAX_C: f32 = 50.0;

/// Whether a temperature reading is the "no probe" sentinel.
pub fn is_probe_disconnected(celsius: f32) -> bool {
    celsius == TEMPERATURE_DISCONNECTED_C
}
