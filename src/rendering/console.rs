//! Log-based renderer for the live terminal mode.

use super::Renderer;
use crate::error::Result;
use crate::synthesis::rms_distance;

/// Reports the composite's peak and its distance from the ideal square whenever they change
pub struct ConsoleRenderer {
    reference: Vec<f32>,
    audible: usize,
    peak: f32,
    distance: f32,
    last_reported: Option<(usize, f32, f32)>,
}

impl ConsoleRenderer {
    pub fn new(reference: &[f32]) -> Self {
        Self {
            reference: reference.to_vec(),
            audible: 0,
            peak: 0.0,
            distance: 0.0,
            last_reported: None,
        }
    }

    /// Latest `(audible partials, peak, RMS distance from square)`
    pub fn summary(&self) -> (usize, f32, f32) {
        (self.audible, self.peak, self.distance)
    }
}

impl Renderer for ConsoleRenderer {
    fn render_composite(&mut self, samples: &[f32], max_magnitude: f32) {
        self.audible = 0;
        self.peak = max_magnitude;
        self.distance = rms_distance(samples, &self.reference);
    }

    fn render_partial_preview(&mut self, _harmonic_index: usize, samples: &[f32], enabled: bool) {
        if enabled && samples.iter().any(|s| *s != 0.0) {
            self.audible += 1;
        }
    }

    fn present(&mut self) -> Result<()> {
        let current = self.summary();
        let changed = match self.last_reported {
            Some((audible, peak, distance)) => {
                audible != current.0
                    || (peak - current.1).abs() > 1e-4
                    || (distance - current.2).abs() > 1e-4
            }
            None => true,
        };
        if changed {
            log::info!(
                "{} partials audible | peak {:.3} | distance from square {:.4}",
                current.0,
                current.1,
                current.2
            );
            self.last_reported = Some(current);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_tracks_last_tick() {
        let reference = vec![1.0, 1.0, -1.0, -1.0];
        let mut renderer = ConsoleRenderer::new(&reference);

        renderer.render_composite(&reference, 1.0);
        renderer.render_partial_preview(0, &[0.0, 1.0, 0.0, -1.0], true);
        renderer.render_partial_preview(1, &[0.0; 4], false);
        renderer.present().unwrap();
        assert_eq!(renderer.summary(), (1, 1.0, 0.0));

        renderer.render_composite(&[0.0; 4], 0.0);
        renderer.present().unwrap();
        assert_eq!(renderer.summary(), (0, 0.0, 1.0));
    }
}
