//! Rendering and recording configuration.

use std::path::PathBuf;

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Frame width (pixels)
    pub width: u32,

    /// Frame height (pixels)
    pub height: u32,

    /// Share of the frame height given to the composite plot (0..1)
    /// The remainder holds the per-partial preview grid
    pub composite_fraction: f32,

    /// Partial previews per row in the preview grid
    pub preview_columns: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            composite_fraction: 0.5,
            preview_columns: 8,
        }
    }
}

impl RenderConfig {
    /// Height of the composite plot (pixels)
    pub fn composite_height(&self) -> u32 {
        ((self.height as f32 * self.composite_fraction) as u32).clamp(1, self.height.max(1))
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames and audio
    pub output_dir: PathBuf,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: PathBuf::from("recording"),
            fps: 30,
        }
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Seconds between frames
    pub fn frame_interval_s(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Audio file path
    pub fn audio_path(&self) -> PathBuf {
        self.output_dir.join("audio.wav")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_layout() {
        let config = RecordingConfig::new(2.5);
        assert_eq!(config.total_frames(), 75);
        assert_eq!(config.frames_dir(), PathBuf::from("recording/frames"));
        assert_eq!(config.audio_path(), PathBuf::from("recording/audio.wav"));
    }

    #[test]
    fn test_composite_height_split() {
        let config = RenderConfig::default();
        assert_eq!(config.composite_height(), 360);

        let empty = RenderConfig {
            height: 0,
            ..RenderConfig::default()
        };
        assert_eq!(empty.composite_height(), 1);
    }
}
