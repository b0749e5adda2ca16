//! Tone engine configuration and constants.

use crate::error::{Error, Result};

/// Tone engine configuration with gain smoothing constants
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Audio sample rate (Hz), used for offline rendering
    /// The live stream uses whatever rate the device reports
    pub sample_rate_hz: u32,

    /// Initial master gain (linear, 0..=1)
    pub master_gain: f64,

    /// Time constant of a partial's gain approaching its target (seconds)
    pub partial_time_constant_s: f64,

    /// Time constant of the master gain approaching its target (seconds)
    pub master_time_constant_s: f64,

    /// Time constant of the play/pause output gate (seconds)
    pub gate_time_constant_s: f64,

    /// Safety limiter: output is hard clipped to ±this value
    pub output_limit: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 44100,
            master_gain: 0.3,
            partial_time_constant_s: 0.03,
            master_time_constant_s: 0.02,
            gate_time_constant_s: 0.02,
            output_limit: 0.8,
        }
    }
}

impl AudioConfig {
    /// Validate configuration (positive rate, gain within 0..=1, etc.)
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate_hz == 0 {
            return Err(Error::InvalidConfig(
                "Sample rate must be > 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.master_gain) {
            return Err(Error::InvalidConfig(format!(
                "Master gain must be within 0..=1, got {}",
                self.master_gain
            )));
        }
        let constants = [
            self.partial_time_constant_s,
            self.master_time_constant_s,
            self.gate_time_constant_s,
        ];
        if constants.iter().any(|tc| !tc.is_finite() || *tc < 0.0) {
            return Err(Error::InvalidConfig(
                "Time constants must be non-negative seconds".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AudioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_loud_master() {
        let config = AudioConfig {
            master_gain: 1.5,
            ..AudioConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
