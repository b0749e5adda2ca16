//! Play/pause gate in front of the tone engine output.

use crate::audio::ToneEngine;

/// Default time constant of the gate ramp on play/pause (seconds)
pub const DEFAULT_GATE_RAMP_S: f64 = 0.02;

/// Two-state playback toggle driving the tone engine's output gate
#[derive(Debug, Clone)]
pub struct PlaybackGate {
    playing: bool,
    gate_target: f64,
    ramp_s: f64,
}

impl Default for PlaybackGate {
    fn default() -> Self {
        Self::new(DEFAULT_GATE_RAMP_S)
    }
}

impl PlaybackGate {
    /// Paused gate ramping with time constant `ramp_s` (negative values become 0)
    pub fn new(ramp_s: f64) -> Self {
        Self {
            playing: false,
            gate_target: 0.0,
            ramp_s: ramp_s.max(0.0),
        }
    }

    pub fn ramp_s(&self) -> f64 {
        self.ramp_s
    }

    /// Change the ramp used by the next toggle
    pub fn set_ramp_s(&mut self, ramp_s: f64) {
        self.ramp_s = ramp_s.max(0.0);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Gate value last requested from the tone engine
    pub fn gate_target(&self) -> f64 {
        self.gate_target
    }

    /// Flip between playing and paused, returning the new state.
    ///
    /// Starting playback resumes the engine before opening the gate.
    /// Without an engine only the state flips.
    pub fn toggle(&mut self, tone: Option<&mut dyn ToneEngine>) -> bool {
        self.playing = !self.playing;
        self.gate_target = if self.playing { 1.0 } else { 0.0 };

        if let Some(tone) = tone {
            if self.playing {
                tone.resume();
            }
            tone.set_output_gate(self.gate_target, self.ramp_s);
        }

        log::info!("Playback {}", if self.playing { "started" } else { "paused" });
        self.playing
    }
}
