//! Offline rendering of the tone bank into a WAV file.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use super::tone::SharedToneBank;
use crate::error::Result;

/// Pulls samples from a shared tone bank on demand and writes them as 32-bit float mono WAV
pub struct WavRecorder {
    bank: SharedToneBank,
    writer: hound::WavWriter<BufWriter<File>>,
    sample_rate_hz: u32,
    samples_written: u64,
}

impl WavRecorder {
    /// Create the WAV file at `path` at the bank's sample rate
    pub fn create(path: impl AsRef<Path>, bank: SharedToneBank) -> Result<Self> {
        let sample_rate_hz = bank.lock().sample_rate_hz().round() as u32;
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: sample_rate_hz,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path.as_ref(), spec)?;
        log::info!("Recording audio to {}", path.as_ref().display());

        Ok(Self {
            bank,
            writer,
            sample_rate_hz,
            samples_written: 0,
        })
    }

    /// Render and write samples until the file covers `time_s` seconds
    pub fn render_until(&mut self, time_s: f64) -> Result<()> {
        let target = (time_s.max(0.0) * self.sample_rate_hz as f64).round() as u64;
        if target <= self.samples_written {
            return Ok(());
        }

        let mut block = vec![0.0f32; (target - self.samples_written) as usize];
        self.bank.lock().fill(&mut block);
        for sample in block {
            self.writer.write_sample(sample)?;
        }
        self.samples_written = target;
        Ok(())
    }

    /// Seconds of audio written so far
    pub fn duration_s(&self) -> f64 {
        self.samples_written as f64 / self.sample_rate_hz as f64
    }

    /// Flush the header and close the file
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{BankToneEngine, ToneBank, ToneEngine};
    use crate::harmonics::HarmonicModel;
    use crate::params::AudioConfig;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_writes_requested_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.wav");

        let model = HarmonicModel::create_bank(8, 220.0);
        let bank = Arc::new(Mutex::new(ToneBank::from_partials(
            model.partials(),
            &AudioConfig::default(),
        )));
        let mut engine = BankToneEngine::new(Arc::clone(&bank));
        engine.resume();
        engine.set_output_gate(1.0, 0.02);

        let mut recorder = WavRecorder::create(&path, Arc::clone(&bank)).unwrap();
        recorder.render_until(0.5).unwrap();
        recorder.render_until(0.25).unwrap();
        assert_eq!(recorder.duration_s(), 0.5);
        recorder.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.len(), 22050);
        let peak = reader
            .into_samples::<f32>()
            .map(|s| s.unwrap().abs())
            .fold(0.0f32, f32::max);
        assert!(peak > 0.05);
    }
}
