//! Tone engine adapter and the additive oscillator bank behind it.

use std::f64::consts::TAU;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::harmonics::Partial;
use crate::params::AudioConfig;

/// Receiver of audio-graph parameter updates.
///
/// The core pushes every state change here and never reads audio state back.
pub trait ToneEngine: Send {
    /// Retarget one partial's gain (`harmonic_index` = harmonic - 1)
    fn set_partial_target(&mut self, harmonic_index: usize, amplitude: f64, enabled: bool);

    /// Retarget the master gain
    fn set_master_gain(&mut self, value: f64);

    /// Ramp the play/pause gate toward `value` with time constant `ramp_s`
    fn set_output_gate(&mut self, value: f64, ramp_s: f64);

    /// Resume a suspended engine
    fn resume(&mut self);
}

/// A gain that approaches its target exponentially, like `setTargetAtTime`
#[derive(Debug, Clone, Copy)]
struct SmoothedGain {
    current: f64,
    target: f64,
    /// Per-sample approach coefficient, `1 - exp(-1 / (tc * sr))`
    coeff: f64,
}

impl SmoothedGain {
    fn new(value: f64) -> Self {
        Self {
            current: value,
            target: value,
            coeff: 1.0,
        }
    }

    fn retarget(&mut self, target: f64, time_constant_s: f64, sample_rate_hz: f64) {
        self.target = target;
        self.coeff = smoothing_coeff(time_constant_s, sample_rate_hz);
    }

    #[inline]
    fn next(&mut self) -> f64 {
        self.current += (self.target - self.current) * self.coeff;
        self.current
    }
}

fn smoothing_coeff(time_constant_s: f64, sample_rate_hz: f64) -> f64 {
    let samples = time_constant_s * sample_rate_hz;
    if samples <= 0.0 {
        1.0
    } else {
        1.0 - (-1.0 / samples).exp()
    }
}

/// One sine oscillator with its gain stage
#[derive(Debug, Clone)]
struct Voice {
    frequency_hz: f64,
    phase: f64,
    gain: SmoothedGain,
}

/// Additive oscillator bank: one sine per partial, summed through master gain and output gate.
///
/// Starts suspended; a suspended bank emits silence and does not advance.
#[derive(Debug, Clone)]
pub struct ToneBank {
    voices: Vec<Voice>,
    master: SmoothedGain,
    gate: SmoothedGain,
    sample_rate_hz: f64,
    partial_time_constant_s: f64,
    master_time_constant_s: f64,
    output_limit: f32,
    suspended: bool,
}

impl ToneBank {
    /// Build one voice per partial with gains already at the partial's current level
    pub fn from_partials(partials: &[Partial], config: &AudioConfig) -> Self {
        let voices = partials
            .iter()
            .map(|partial| Voice {
                frequency_hz: partial.frequency_hz(),
                phase: 0.0,
                gain: SmoothedGain::new(partial.effective_amplitude()),
            })
            .collect();

        Self {
            voices,
            master: SmoothedGain::new(config.master_gain),
            gate: SmoothedGain::new(0.0),
            sample_rate_hz: config.sample_rate_hz as f64,
            partial_time_constant_s: config.partial_time_constant_s,
            master_time_constant_s: config.master_time_constant_s,
            output_limit: config.output_limit,
            suspended: true,
        }
    }

    /// Switch to the rate of the device that will pull samples
    pub fn set_sample_rate(&mut self, sample_rate_hz: f64) {
        self.sample_rate_hz = sample_rate_hz;
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Current (smoothed) gain of the output gate
    pub fn gate_level(&self) -> f64 {
        self.gate.current
    }

    /// Target gain of one voice, if the index exists
    pub fn voice_target(&self, harmonic_index: usize) -> Option<f64> {
        self.voices.get(harmonic_index).map(|v| v.gain.target)
    }

    /// Produce the next mono sample
    pub fn next_sample(&mut self) -> f32 {
        if self.suspended {
            return 0.0;
        }

        let mut sum = 0.0;
        for voice in &mut self.voices {
            let gain = voice.gain.next();
            if gain != 0.0 {
                sum += gain * voice.phase.sin();
            }
            voice.phase += TAU * voice.frequency_hz / self.sample_rate_hz;
            if voice.phase >= TAU {
                voice.phase -= TAU;
            }
        }

        let out = sum * self.master.next() * self.gate.next();
        let limit = self.output_limit;
        (out as f32).clamp(-limit, limit)
    }

    /// Fill `buffer` with consecutive mono samples
    pub fn fill(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    fn set_partial_target(&mut self, harmonic_index: usize, amplitude: f64, enabled: bool) {
        let target = if enabled { amplitude } else { 0.0 };
        let (tc, sr) = (self.partial_time_constant_s, self.sample_rate_hz);
        if let Some(voice) = self.voices.get_mut(harmonic_index) {
            voice.gain.retarget(target, tc, sr);
        } else {
            log::warn!("Tone bank has no voice for harmonic index {}", harmonic_index);
        }
    }
}

/// Thread-safe handle to a tone bank shared with an output stream or recorder
pub type SharedToneBank = Arc<Mutex<ToneBank>>;

/// `ToneEngine` adapter that writes parameter changes into a shared `ToneBank`
pub struct BankToneEngine {
    bank: SharedToneBank,
}

impl BankToneEngine {
    pub fn new(bank: SharedToneBank) -> Self {
        Self { bank }
    }
}

impl ToneEngine for BankToneEngine {
    fn set_partial_target(&mut self, harmonic_index: usize, amplitude: f64, enabled: bool) {
        self.bank
            .lock()
            .set_partial_target(harmonic_index, amplitude, enabled);
    }

    fn set_master_gain(&mut self, value: f64) {
        let mut bank = self.bank.lock();
        let (tc, sr) = (bank.master_time_constant_s, bank.sample_rate_hz);
        bank.master.retarget(value, tc, sr);
    }

    fn set_output_gate(&mut self, value: f64, ramp_s: f64) {
        let mut bank = self.bank.lock();
        let sr = bank.sample_rate_hz;
        bank.gate.retarget(value, ramp_s, sr);
    }

    fn resume(&mut self) {
        let mut bank = self.bank.lock();
        if bank.suspended {
            log::info!("Tone engine resumed");
        }
        bank.suspended = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmonics::HarmonicModel;
    use approx::assert_abs_diff_eq;

    fn shared_bank(count: usize) -> SharedToneBank {
        let model = HarmonicModel::create_bank(count, 220.0);
        Arc::new(Mutex::new(ToneBank::from_partials(
            model.partials(),
            &AudioConfig::default(),
        )))
    }

    #[test]
    fn test_suspended_bank_is_silent() {
        let bank = shared_bank(4);
        let mut buffer = [1.0f32; 64];
        bank.lock().fill(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_closed_gate_is_silent_after_resume() {
        let bank = shared_bank(4);
        let mut engine = BankToneEngine::new(Arc::clone(&bank));
        engine.resume();

        let mut buffer = [1.0f32; 256];
        bank.lock().fill(&mut buffer);
        assert!(buffer.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn test_gate_ramps_toward_target() {
        let bank = shared_bank(4);
        let mut engine = BankToneEngine::new(Arc::clone(&bank));
        engine.resume();
        engine.set_output_gate(1.0, 0.02);

        // Five time constants at 44.1 kHz
        let mut buffer = vec![0.0f32; 4410];
        bank.lock().fill(&mut buffer);

        assert_abs_diff_eq!(bank.lock().gate_level(), 1.0, epsilon = 0.01);
        assert!(buffer.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn test_disabled_partial_targets_zero() {
        let bank = shared_bank(4);
        let mut engine = BankToneEngine::new(Arc::clone(&bank));

        engine.set_partial_target(2, 0.7, false);
        assert_eq!(bank.lock().voice_target(2), Some(0.0));

        engine.set_partial_target(2, 0.7, true);
        assert_eq!(bank.lock().voice_target(2), Some(0.7));
    }

    #[test]
    fn test_output_is_limited() {
        let bank = shared_bank(4);
        let mut engine = BankToneEngine::new(Arc::clone(&bank));
        engine.resume();
        for index in 0..4 {
            engine.set_partial_target(index, 1.5, true);
        }
        engine.set_master_gain(1.0);
        engine.set_output_gate(1.0, 0.0);

        let mut buffer = vec![0.0f32; 8192];
        bank.lock().fill(&mut buffer);
        let limit = AudioConfig::default().output_limit;
        assert!(buffer.iter().all(|s| s.abs() <= limit));
    }
}
