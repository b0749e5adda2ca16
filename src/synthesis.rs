//! Sample-domain additive synthesis of the composite waveform.
//!
//! Output is a pure function of the `(harmonic, amplitude, enabled)` tuples and
//! the sample count, so identical banks produce bit-identical samples.

use std::f64::consts::TAU;

use crate::harmonics::Partial;

/// One period of the composite waveform plus its peak, for display scaling
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    pub samples: Vec<f32>,
    pub max_magnitude: f32,
}

/// One period of an ideal square wave: +1 while `sin(2πt) >= 0`, else -1
pub fn ideal_square_reference(sample_count: usize) -> Vec<f32> {
    (0..sample_count)
        .map(|i| {
            let t = i as f64 / sample_count as f64;
            if (TAU * t).sin() >= 0.0 {
                1.0
            } else {
                -1.0
            }
        })
        .collect()
}

/// Sum every audible partial's sinusoid over one period
pub fn composite_wave(partials: &[Partial], sample_count: usize) -> Composite {
    let audible: Vec<(f64, f64)> = partials
        .iter()
        .filter(|p| p.is_audible())
        .map(|p| (p.harmonic() as f64, p.amplitude()))
        .collect();

    let mut samples = Vec::with_capacity(sample_count);
    let mut max_magnitude = 0.0f64;

    for i in 0..sample_count {
        let t = i as f64 / sample_count as f64;
        let value: f64 = audible
            .iter()
            .map(|(harmonic, amplitude)| amplitude * (TAU * harmonic * t).sin())
            .sum();
        max_magnitude = max_magnitude.max(value.abs());
        samples.push(value as f32);
    }

    Composite {
        samples,
        max_magnitude: max_magnitude as f32,
    }
}

/// One partial on its own, using its amplitude if enabled and 0 otherwise
pub fn partial_wave(partial: &Partial, sample_count: usize) -> Vec<f32> {
    let amplitude = partial.effective_amplitude();
    let harmonic = partial.harmonic() as f64;
    (0..sample_count)
        .map(|i| {
            if amplitude == 0.0 {
                return 0.0;
            }
            let t = i as f64 / sample_count as f64;
            (amplitude * (TAU * harmonic * t).sin()) as f32
        })
        .collect()
}

/// Root-mean-square distance between two equally long waveforms
pub fn rms_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum();
    (sum / len as f64).sqrt() as f32
}

/// Composite synthesizer with its fixed sample count and precomputed square reference
#[derive(Debug, Clone)]
pub struct CompositeSynthesizer {
    sample_count: usize,
    reference: Vec<f32>,
}

impl CompositeSynthesizer {
    pub fn new(sample_count: usize) -> Self {
        Self {
            sample_count,
            reference: ideal_square_reference(sample_count),
        }
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// The ideal square computed at construction
    pub fn reference(&self) -> &[f32] {
        &self.reference
    }

    pub fn composite(&self, partials: &[Partial]) -> Composite {
        composite_wave(partials, self.sample_count)
    }

    pub fn partial_wave(&self, partial: &Partial) -> Vec<f32> {
        partial_wave(partial, self.sample_count)
    }

    /// How far a composite is from the ideal square (RMS)
    pub fn distance_from_square(&self, composite: &Composite) -> f32 {
        rms_distance(&composite.samples, &self.reference)
    }
}
