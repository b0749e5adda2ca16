//! Parameter definitions with physical units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Physical units (Hz, seconds, pixels, etc.)
//! - Documented ranges and meanings
//! - Boundary validation, so the core never has to reject input

mod audio;
mod build;
mod render;
mod synth;

// Re-export all types
pub use audio::AudioConfig;
pub use build::{BuildSettings, DEFAULT_ODD_COUNT, DEFAULT_STEP_S, MIN_STEP_S};
pub use render::{RecordingConfig, RenderConfig};
pub use synth::SynthConfig;
