//! Renderer adapters for the composite waveform and per-partial previews.

mod console;
mod png;

pub use console::ConsoleRenderer;
pub use png::PngFrameRenderer;

use crate::error::Result;

/// Receiver of sampled waveforms, called once per animation tick.
///
/// A tick is one `render_composite`, one `render_partial_preview` per partial,
/// then `present`.
pub trait Renderer {
    /// One period of the composite and its peak magnitude
    fn render_composite(&mut self, samples: &[f32], max_magnitude: f32);

    /// One period of a single partial (all zeros when disabled)
    fn render_partial_preview(&mut self, harmonic_index: usize, samples: &[f32], enabled: bool);

    /// End of tick
    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Renderer that draws nothing
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render_composite(&mut self, _samples: &[f32], _max_magnitude: f32) {}

    fn render_partial_preview(&mut self, _harmonic_index: usize, _samples: &[f32], _enabled: bool) {
    }
}
