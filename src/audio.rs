//! Tone engine: additive oscillator bank, live output and WAV recording.
//!
//! The core only sees the [`ToneEngine`] trait. Behind it a [`ToneBank`] is
//! shared between the adapter, the cpal output stream and the offline
//! recorder, so live and recorded audio come from the same DSP.

mod recorder;
mod system;
mod tone;

// Re-export public types
pub use recorder::WavRecorder;
pub use system::AudioSystem;
pub use tone::{BankToneEngine, SharedToneBank, ToneBank, ToneEngine};
