//! Harmonic bank and waveform resolution.

use crate::error::{Error, Result};

/// Shape of the partial bank and of the sampled display period
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Fundamental frequency (Hz), harmonic `h` plays at `h` times this
    pub base_frequency_hz: f64,

    /// Number of partials in the bank, fixed for the session
    pub total_partials: usize,

    /// Samples per displayed period of the composite waveform
    pub sample_points: usize,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            base_frequency_hz: 220.0,
            total_partials: 64,
            sample_points: 1024,
        }
    }
}

impl SynthConfig {
    /// Frequency of the highest partial (Hz)
    pub fn highest_frequency_hz(&self) -> f64 {
        self.base_frequency_hz * self.total_partials as f64
    }

    /// Largest number of odd harmonics the bank can hold, `ceil(total / 2)`
    pub fn max_odd_count(&self) -> usize {
        self.total_partials.div_ceil(2)
    }

    /// Validate against the audio sample rate the bank will be played at
    pub fn validate(&self, sample_rate_hz: u32) -> Result<()> {
        if self.total_partials == 0 {
            return Err(Error::InvalidConfig(
                "Partial bank must hold at least one partial".to_string(),
            ));
        }
        if self.sample_points == 0 {
            return Err(Error::InvalidConfig(
                "Sample points must be > 0".to_string(),
            ));
        }
        if !self.base_frequency_hz.is_finite() || self.base_frequency_hz <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "Base frequency must be a positive number of Hz, got {}",
                self.base_frequency_hz
            )));
        }
        let nyquist = sample_rate_hz as f64 / 2.0;
        if self.highest_frequency_hz() >= nyquist {
            return Err(Error::InvalidConfig(format!(
                "Harmonic {} at {:.0} Hz is above the Nyquist limit of {:.0} Hz",
                self.total_partials,
                self.highest_frequency_hz(),
                nyquist
            )));
        }
        Ok(())
    }
}
