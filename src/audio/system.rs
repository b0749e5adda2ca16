//! Live audio output through the default cpal device.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use super::tone::{SharedToneBank, ToneBank};
use crate::error::{Error, Result};

/// WAV writer fed from the audio callback; `None` once finalized
type LiveWavWriter = Arc<Mutex<Option<hound::WavWriter<BufWriter<File>>>>>;

/// Audio system pulling samples from a shared tone bank into the default output device
pub struct AudioSystem {
    /// Device sample rate (Hz)
    sample_rate_hz: u32,

    /// Copy of everything played, if live recording is enabled
    wav_writer: Option<LiveWavWriter>,

    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl AudioSystem {
    /// Open the default output device and start streaming the bank.
    ///
    /// The bank is switched to the device's sample rate. It stays silent until resumed.
    /// With `record_path` every played sample is also written to a mono WAV there.
    pub fn new(bank: SharedToneBank, record_path: Option<&Path>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioDevice("No audio output device found".to_string()))?;

        let config = device.default_output_config()?;
        let sample_rate_hz = config.sample_rate().0;
        let channels = config.channels() as usize;

        log::info!(
            "Audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate_hz,
            channels
        );

        let wav_writer = match record_path {
            Some(path) => {
                let writer = create_mono_writer(path, sample_rate_hz)?;
                log::info!("Recording live audio to {}", path.display());
                Some(Arc::new(Mutex::new(Some(writer))))
            }
            None => None,
        };

        bank.lock().set_sample_rate(sample_rate_hz as f64);
        let bank_stream = Arc::clone(&bank);
        let wav_writer_stream = wav_writer.clone();

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut bank = bank_stream.lock();
                match &wav_writer_stream {
                    Some(writer) => {
                        let mut writer = writer.lock();
                        fill_frames(&mut bank, data, channels, |sample| {
                            if let Some(w) = writer.as_mut() {
                                let _ = w.write_sample(sample);
                            }
                        });
                    }
                    None => fill_frames(&mut bank, data, channels, |_| {}),
                }
            },
            |err| log::error!("Audio stream error: {}", err),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            sample_rate_hz,
            wav_writer,
            _stream: stream,
        })
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Stop the stream and close the live recording, if any
    pub fn finalize(self) -> Result<()> {
        let Self {
            wav_writer,
            _stream: stream,
            ..
        } = self;
        drop(stream);

        let Some(shared) = wav_writer else {
            return Ok(());
        };
        let writer = shared.lock().take();
        if let Some(writer) = writer {
            writer.finalize()?;
            log::info!("Live recording saved");
        }
        Ok(())
    }
}

/// 32-bit float mono WAV writer
fn create_mono_writer(
    path: &Path,
    sample_rate_hz: u32,
) -> Result<hound::WavWriter<BufWriter<File>>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    Ok(hound::WavWriter::create(path, spec)?)
}

/// Fill an interleaved buffer with the bank's mono signal on every channel.
///
/// `tap` sees each mono sample once, not once per channel.
fn fill_frames(
    bank: &mut ToneBank,
    data: &mut [f32],
    channels: usize,
    mut tap: impl FnMut(f32),
) {
    for frame in data.chunks_mut(channels.max(1)) {
        let sample = bank.next_sample();
        frame.fill(sample);
        tap(sample);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{BankToneEngine, ToneEngine};
    use crate::harmonics::HarmonicModel;
    use crate::params::AudioConfig;

    fn playing_bank() -> SharedToneBank {
        let model = HarmonicModel::create_bank(8, 220.0);
        let bank = Arc::new(Mutex::new(ToneBank::from_partials(
            model.partials(),
            &AudioConfig::default(),
        )));
        let mut engine = BankToneEngine::new(Arc::clone(&bank));
        engine.resume();
        engine.set_output_gate(1.0, 0.0);
        bank
    }

    #[test]
    fn test_fill_frames_duplicates_channels() {
        let bank = playing_bank();
        let mut data = vec![0.0f32; 64];
        let mut tapped = Vec::new();
        fill_frames(&mut bank.lock(), &mut data, 2, |s| tapped.push(s));

        assert_eq!(tapped.len(), 32);
        for (frame, sample) in data.chunks(2).zip(&tapped) {
            assert_eq!(frame[0], *sample);
            assert_eq!(frame[1], *sample);
        }
        assert!(tapped.iter().any(|s| *s != 0.0));
    }

    #[test]
    fn test_tap_writes_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.wav");
        let bank = playing_bank();

        let mut writer = create_mono_writer(&path, 44100).unwrap();
        let mut data = vec![0.0f32; 200];
        fill_frames(&mut bank.lock(), &mut data, 2, |s| {
            writer.write_sample(s).unwrap();
        });
        writer.finalize().unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.len(), 100);
    }
}
