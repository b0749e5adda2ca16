//! Squarewave library - additive synthesis of a square wave from its harmonics

pub mod audio;
pub mod cli;
pub mod console;
pub mod error;
pub mod harmonics;
pub mod params;
pub mod playback;
pub mod rendering;
pub mod sequencer;
pub mod session;
pub mod synthesis;
pub mod timer;

pub use error::{Error, Result};
