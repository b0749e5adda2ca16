//! Harmonic model: the bank of partials and its single mutation path.
//!
//! Every writer (manual edits, presets, the build animation) goes through
//! [`HarmonicModel::set_partial_state`], which also notifies the attached tone
//! engine. Stored, displayed and audible values therefore never diverge.

use std::f64::consts::PI;

use crate::audio::ToneEngine;

/// Ideal square-wave Fourier coefficient of `harmonic`: `4 / (π·h)` for odd `h`, else 0
pub fn square_coefficient(harmonic: u32) -> f64 {
    if harmonic % 2 == 1 {
        4.0 / (PI * harmonic as f64)
    } else {
        0.0
    }
}

/// One harmonic oscillator's parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Partial {
    harmonic: u32,
    frequency_hz: f64,
    default_amplitude: f64,
    amplitude: f64,
    enabled: bool,
}

impl Partial {
    /// Create a partial in its square-wave default state
    fn new(harmonic: u32, base_frequency_hz: f64) -> Self {
        let default_amplitude = square_coefficient(harmonic);
        Self {
            harmonic,
            frequency_hz: base_frequency_hz * harmonic as f64,
            default_amplitude,
            amplitude: default_amplitude,
            enabled: default_amplitude > 0.0,
        }
    }

    /// Harmonic number, 1-based
    pub fn harmonic(&self) -> u32 {
        self.harmonic
    }

    /// Position in the bank, `harmonic - 1`
    pub fn index(&self) -> usize {
        self.harmonic as usize - 1
    }

    pub fn frequency_hz(&self) -> f64 {
        self.frequency_hz
    }

    pub fn default_amplitude(&self) -> f64 {
        self.default_amplitude
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Whether this partial contributes to the composite
    pub fn is_audible(&self) -> bool {
        self.enabled && self.amplitude != 0.0
    }

    /// Amplitude if enabled, otherwise 0
    pub fn effective_amplitude(&self) -> f64 {
        if self.enabled {
            self.amplitude
        } else {
            0.0
        }
    }
}

/// Ordered bank of partials, fixed in size for the session
pub struct HarmonicModel {
    partials: Vec<Partial>,
    tone: Option<Box<dyn ToneEngine>>,
}

impl HarmonicModel {
    /// Build `count` partials at multiples of `base_frequency_hz`, in square-wave default state
    pub fn create_bank(count: usize, base_frequency_hz: f64) -> Self {
        assert!(count > 0, "harmonic bank needs at least one partial");
        let partials = (1..=count as u32)
            .map(|harmonic| Partial::new(harmonic, base_frequency_hz))
            .collect();
        Self {
            partials,
            tone: None,
        }
    }

    pub fn partials(&self) -> &[Partial] {
        &self.partials
    }

    /// Partial by harmonic number (1-based)
    pub fn partial(&self, harmonic: u32) -> Option<&Partial> {
        (harmonic as usize)
            .checked_sub(1)
            .and_then(|index| self.partials.get(index))
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }

    /// Attach a tone engine and bring it up to date with the current bank
    pub fn attach_tone_engine(&mut self, mut engine: Box<dyn ToneEngine>) {
        for partial in &self.partials {
            engine.set_partial_target(partial.index(), partial.amplitude, partial.enabled);
        }
        self.tone = Some(engine);
    }

    pub fn has_tone_engine(&self) -> bool {
        self.tone.is_some()
    }

    /// The attached tone engine, for non-partial parameters (gate, master gain)
    pub fn tone_engine_mut(&mut self) -> Option<&mut dyn ToneEngine> {
        match &mut self.tone {
            Some(tone) => Some(&mut **tone),
            None => None,
        }
    }

    /// Overwrite one partial's amplitude and enable flag and notify the tone engine.
    ///
    /// Amplitude is stored as given, the UI range of 0..=1.5 is not enforced here.
    ///
    /// # Panics
    /// If `index` is outside the bank.
    pub fn set_partial_state(&mut self, index: usize, amplitude: f64, enabled: bool) {
        assert!(
            index < self.partials.len(),
            "partial index {} outside bank of {}",
            index,
            self.partials.len()
        );
        let partial = &mut self.partials[index];
        partial.amplitude = amplitude;
        partial.enabled = enabled;

        if let Some(tone) = self.tone.as_mut() {
            tone.set_partial_target(index, amplitude, enabled);
        }
    }

    /// Odd harmonics at their ideal coefficient, even harmonics silenced
    pub fn apply_square_defaults(&mut self) {
        for index in 0..self.partials.len() {
            let partial = &self.partials[index];
            let odd = partial.harmonic % 2 == 1;
            let amplitude = if odd { partial.default_amplitude } else { 0.0 };
            self.set_partial_state(index, amplitude, odd);
        }
    }

    /// Fundamental at full amplitude, everything else silenced
    pub fn reset_to_fundamental(&mut self) {
        for index in 0..self.partials.len() {
            if index == 0 {
                self.set_partial_state(index, 1.0, true);
            } else {
                self.set_partial_state(index, 0.0, false);
            }
        }
    }

    /// Every partial at `(0, disabled)`
    pub fn silence(&mut self) {
        for index in 0..self.partials.len() {
            self.set_partial_state(index, 0.0, false);
        }
    }

    /// Number of partials currently contributing to the composite
    pub fn audible_count(&self) -> usize {
        self.partials.iter().filter(|p| p.is_audible()).count()
    }
}
