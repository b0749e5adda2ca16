//! Error types for squarewave

use std::io;
use thiserror::Error;

/// Errors raised at the crate's I/O boundaries (devices, files, configuration).
///
/// The synthesis core itself never fails: it normalizes its input instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Audio device or stream failure
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    /// WAV encoding error
    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),

    /// Frame encoding error
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration rejected at the boundary
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unrecognised or malformed console command
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

/// Result type for squarewave operations
pub type Result<T> = std::result::Result<T, Error>;

// cpal reports each failure stage with its own type; collapse them at the API boundary
impl From<cpal::BuildStreamError> for Error {
    fn from(e: cpal::BuildStreamError) -> Self {
        Error::AudioDevice(format!("Failed to build audio stream: {}", e))
    }
}

impl From<cpal::PlayStreamError> for Error {
    fn from(e: cpal::PlayStreamError) -> Self {
        Error::AudioDevice(format!("Failed to start audio stream: {}", e))
    }
}

impl From<cpal::DefaultStreamConfigError> for Error {
    fn from(e: cpal::DefaultStreamConfigError) -> Self {
        Error::AudioDevice(format!("Failed to get audio config: {}", e))
    }
}
