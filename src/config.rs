use serde::Deserialize;

use crate::dimming::DimmingTable;
use crate::error::ConfigError;

// The AOD wake sensor never reports a lift, so illumination is forced off after this.
pub const AOD_INTERRUPT_TIMEOUT_MS: u64 = 1_000;
pub const MIN_TOUCH_LOG_INTERVAL_MS: u64 = 50;
// Faster pointers are swipes crossing the sensor, not presses.
pub const VELOCITY_THRESHOLD: f32 = 750.0;
pub const VELOCITY_HORIZON_MS: u64 = 100;
pub const MOVEMENT_HISTORY_CAPACITY: usize = 20;

pub const HARDWARE_INBOX_DEPTH: usize = 16;
pub const DRIVER_CHANNEL_DEPTH: usize = 16;
pub const UI_INBOX_DEPTH: usize = 32;
pub const UI_TIMER_SLOTS: usize = 4;
pub const SESSION_ACTIONS_MAX: usize = 4;
pub const DEBUG_MESSAGE_MAX: usize = 96;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct UdfpsConfig {
    pub sensor_id: i32,
    pub aod_interrupt_timeout_ms: u64,
    pub velocity_threshold: f32,
    pub velocity_horizon_ms: u64,
    pub min_touch_log_interval_ms: u64,
    pub udfps_vendor_code: i32,
    pub pulse_on_finger_down: bool,
    pub supports_screen_off_udfps: bool,
    pub framework_dimming: bool,
    pub dimming_brightness_alpha: Vec<String>,
}

impl Default for UdfpsConfig {
    fn default() -> Self {
        Self {
            sensor_id: 0,
            aod_interrupt_timeout_ms: AOD_INTERRUPT_TIMEOUT_MS,
            velocity_threshold: VELOCITY_THRESHOLD,
            velocity_horizon_ms: VELOCITY_HORIZON_MS,
            min_touch_log_interval_ms: MIN_TOUCH_LOG_INTERVAL_MS,
            udfps_vendor_code: 0,
            pulse_on_finger_down: false,
            supports_screen_off_udfps: false,
            framework_dimming: false,
            dimming_brightness_alpha: Vec::new(),
        }
    }
}

impl UdfpsConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.aod_interrupt_timeout_ms == 0 {
            return Err(ConfigError::Invalid("aod_interrupt_timeout_ms must be non-zero"));
        }
        if !(self.velocity_threshold.is_finite() && self.velocity_threshold > 0.0) {
            return Err(ConfigError::Invalid("velocity_threshold must be positive"));
        }
        if self.velocity_horizon_ms == 0 {
            return Err(ConfigError::Invalid("velocity_horizon_ms must be non-zero"));
        }
        self.dimming_table().map(|_| ())
    }

    /// Parsed brightness/alpha table, `None` when framework dimming is off.
    pub fn dimming_table(&self) -> Result<Option<DimmingTable>, ConfigError> {
        if !self.framework_dimming {
            return Ok(None);
        }
        DimmingTable::parse(&self.dimming_brightness_alpha).map(Some)
    }
}
