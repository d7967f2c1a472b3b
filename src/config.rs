// Timing, network port, servo calibration and potentiometer constants
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::motor::Calibration;

// Control loop tick (50 ms -> 20 Hz)
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

// UDP port the control messages arrive on (bound on all interfaces)
pub const UDP_PORT: u16 = 8080;

// Manual mode animation: one phase every 3 s, smoothing over the whole phase
pub const PHASE_DURATION: Duration = Duration::from_millis(3000);
pub const TRANSITION_TIME: Duration = Duration::from_millis(3000);

// Speeds at or below this snap to the stop duty (avoids jitter near zero)
pub const DEAD_ZONE: f32 = 0.05;

// Two targets at or below this count as "both idle"
pub const IDLE_THRESHOLD: f32 = 0.1;

// When both targets are idle, one is kicked into [KICK_MIN, 1.0]
pub const KICK_MIN: f32 = 0.3;

// FS90R duty values at 50 Hz (1.5 ms = stop)
pub const DEFAULT_STOP_DUTY: u16 = 76;
pub const DEFAULT_FULL_FORWARD_DUTY: u16 = 81;

// Potentiometer on a 10-bit ADC
pub const ADC_MAX: u16 = 1023;
pub const POT_CENTER: u16 = 512;
pub const POT_TOLERANCE: u16 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Potentiometer steering parameters
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PotConfig {
    pub center: u16,
    pub tolerance: u16,
}

impl Default for PotConfig {
    fn default() -> Self {
        Self {
            center: POT_CENTER,
            tolerance: POT_TOLERANCE,
        }
    }
}

/// Runtime configuration, every field optional in the TOML file
///
/// ```toml
/// udp_port = 8080
/// tick_interval_ms = 50
/// phase_duration_ms = 3000
/// transition_time_ms = 3000
///
/// [left]
/// stop = 76
/// full_forward = 80
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub udp_port: u16,
    pub tick_interval_ms: u64,
    pub phase_duration_ms: u64,
    pub transition_time_ms: u64,
    pub left: Calibration,
    pub right: Calibration,
    pub pot: PotConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            udp_port: UDP_PORT,
            tick_interval_ms: TICK_INTERVAL.as_millis() as u64,
            phase_duration_ms: PHASE_DURATION.as_millis() as u64,
            transition_time_ms: TRANSITION_TIME.as_millis() as u64,
            left: Calibration::default(),
            right: Calibration::default(),
            pot: PotConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Load from a TOML file and validate
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be > 0".into()));
        }
        if self.phase_duration_ms == 0 {
            return Err(ConfigError::Invalid("phase_duration_ms must be > 0".into()));
        }
        if self.transition_time_ms > self.phase_duration_ms {
            return Err(ConfigError::Invalid(format!(
                "transition_time_ms ({}) exceeds phase_duration_ms ({})",
                self.transition_time_ms, self.phase_duration_ms
            )));
        }
        for (name, cal) in [("left", &self.left), ("right", &self.right)] {
            if cal.full_forward < cal.stop {
                return Err(ConfigError::Invalid(format!(
                    "{} calibration: full_forward ({}) below stop ({})",
                    name, cal.full_forward, cal.stop
                )));
            }
        }
        if self.pot.tolerance >= self.pot.center
            || self.pot.center.saturating_add(self.pot.tolerance) >= ADC_MAX
        {
            return Err(ConfigError::Invalid(format!(
                "pot center {} / tolerance {} leave no steering range",
                self.pot.center, self.pot.tolerance
            )));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn phase_duration(&self) -> Duration {
        Duration::from_millis(self.phase_duration_ms)
    }

    pub fn transition_time(&self) -> Duration {
        Duration::from_millis(self.transition_time_ms)
    }
}
