//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::params::{AudioConfig, RecordingConfig, SynthConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "squarewave")]
#[command(about = "Additive synthesis of a square wave from its harmonics", long_about = None)]
pub struct Args {
    /// Render the session offline to PNG frames and a WAV file (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,

    /// Output directory for recording mode
    #[arg(long, value_name = "DIR", default_value = "recording")]
    pub output_dir: PathBuf,

    /// Frame rate for redraws and recorded frames
    #[arg(long, value_name = "FPS", default_value_t = 30)]
    pub fps: u32,

    /// Fundamental frequency (Hz)
    #[arg(long, value_name = "HZ", default_value_t = 220.0)]
    pub base_frequency: f64,

    /// Master gain (0..1)
    #[arg(long, value_name = "GAIN", default_value_t = 0.3)]
    pub master_gain: f64,

    /// Seconds per square build step (minimum 0.1)
    #[arg(long, value_name = "SECONDS", default_value = "1")]
    pub step: String,

    /// Odd harmonics to enable in the square build (1..=32)
    #[arg(long, value_name = "N", default_value = "32")]
    pub odd_count: String,

    /// Start the square build animation at launch
    #[arg(long)]
    pub build: bool,

    /// Open the output gate at launch
    #[arg(long)]
    pub play: bool,

    /// Run without an audio device
    #[arg(long)]
    pub no_audio: bool,

    /// Also write the live output to this WAV file
    #[arg(long, value_name = "FILE", conflicts_with_all = ["record", "no_audio"])]
    pub record_live: Option<PathBuf>,
}

impl Args {
    /// Synthesis configuration from the command line
    pub fn synth_config(&self) -> SynthConfig {
        SynthConfig {
            base_frequency_hz: self.base_frequency,
            ..SynthConfig::default()
        }
    }

    /// Audio configuration from the command line
    pub fn audio_config(&self) -> AudioConfig {
        AudioConfig {
            master_gain: self.master_gain,
            ..AudioConfig::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn recording_config(&self) -> Option<RecordingConfig> {
        self.record.map(|duration| RecordingConfig {
            output_dir: self.output_dir.clone(),
            fps: self.fps,
            ..RecordingConfig::new(duration)
        })
    }

    /// Seconds between redraws
    pub fn frame_interval_s(&self) -> f64 {
        1.0 / self.fps.max(1) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["squarewave"]);
        assert!(args.record.is_none());
        assert!(args.recording_config().is_none());
        assert_eq!(args.synth_config().base_frequency_hz, 220.0);
        assert_eq!(args.step, "1");
        assert_eq!(args.odd_count, "32");
        assert!(args.record_live.is_none());
    }

    #[test]
    fn test_record_live_flag() {
        let args = Args::parse_from(["squarewave", "--record-live", "take.wav", "--play"]);
        assert_eq!(args.record_live, Some(PathBuf::from("take.wav")));
        assert!(args.recording_config().is_none());

        let clash = Args::try_parse_from(["squarewave", "--record-live", "a.wav", "--no-audio"]);
        assert!(clash.is_err());
    }

    #[test]
    fn test_recording_flags() {
        let args = Args::parse_from([
            "squarewave",
            "--record",
            "4",
            "--fps",
            "24",
            "--output-dir",
            "out",
            "--build",
            "--step",
            "0.25",
        ]);
        let config = args.recording_config().unwrap();
        assert_eq!(config.total_frames(), 96);
        assert_eq!(config.audio_path(), PathBuf::from("out/audio.wav"));
        assert!(args.build);
        assert_eq!(args.step, "0.25");
    }
}
