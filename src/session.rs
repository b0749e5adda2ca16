//! Session: the one owner of the harmonic bank and everything that mutates it.
//!
//! All handlers run to completion on the caller's thread. Timer releases,
//! user commands and frame ticks are applied in the order the event loop
//! delivers them, so no locking is needed around the bank.

use crate::audio::ToneEngine;
use crate::console::{Command, HELP};
use crate::error::Result;
use crate::harmonics::HarmonicModel;
use crate::params::{AudioConfig, BuildSettings, SynthConfig};
use crate::playback::{PlaybackGate, DEFAULT_GATE_RAMP_S};
use crate::rendering::Renderer;
use crate::sequencer::{BuildSequencer, BuildStep};
use crate::synthesis::CompositeSynthesizer;
use crate::timer::{FrameTicker, TimerQueue};

/// What the event loop should do after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Continue,
    /// Text the user asked for (status, help)
    Reply(String),
    Quit,
}

/// Owns the bank, synthesizer, build sequencer, playback gate, timers and renderer
pub struct Session {
    model: HarmonicModel,
    synth: CompositeSynthesizer,
    sequencer: BuildSequencer,
    gate: PlaybackGate,
    timers: TimerQueue<BuildStep>,
    ticker: FrameTicker,
    renderer: Box<dyn Renderer>,
    build_inputs: BuildSettings,
    master_gain: f64,
}

impl Session {
    /// Create the bank in its square-wave default state.
    ///
    /// Frames are rendered every `frame_interval_s` once [`Session::start_rendering`] is called.
    pub fn new(config: &SynthConfig, frame_interval_s: f64, renderer: Box<dyn Renderer>) -> Self {
        let model = HarmonicModel::create_bank(config.total_partials, config.base_frequency_hz);
        let build_inputs = BuildSettings::from_raw("", "", config.total_partials);

        Self {
            model,
            synth: CompositeSynthesizer::new(config.sample_points),
            sequencer: BuildSequencer::new(),
            gate: PlaybackGate::new(DEFAULT_GATE_RAMP_S),
            timers: TimerQueue::new(),
            ticker: FrameTicker::new(frame_interval_s),
            renderer,
            build_inputs,
            master_gain: 0.0,
        }
    }

    pub fn model(&self) -> &HarmonicModel {
        &self.model
    }

    pub fn synthesizer(&self) -> &CompositeSynthesizer {
        &self.synth
    }

    pub fn sequencer(&self) -> &BuildSequencer {
        &self.sequencer
    }

    pub fn gate(&self) -> &PlaybackGate {
        &self.gate
    }

    /// Inputs the next build will start with
    pub fn build_inputs(&self) -> BuildSettings {
        self.build_inputs
    }

    /// Attach the tone engine and push the bank and the configured master gain to it.
    ///
    /// Later play/pause toggles ramp with the configured gate time constant.
    pub fn attach_tone_engine(&mut self, mut engine: Box<dyn ToneEngine>, config: &AudioConfig) {
        self.master_gain = config.master_gain.clamp(0.0, 1.0);
        engine.set_master_gain(self.master_gain);
        self.gate.set_ramp_s(config.gate_time_constant_s);
        self.model.attach_tone_engine(engine);
    }

    // --- manual edits -------------------------------------------------------

    /// Manual edit of one partial (index = harmonic - 1). Cancels a running build.
    pub fn set_partial_state(&mut self, index: usize, amplitude: f64, enabled: bool) {
        self.stop_build();
        self.model.set_partial_state(index, amplitude, enabled);
    }

    /// Manual amplitude change, keeping the enable flag
    pub fn set_partial_amplitude(&mut self, index: usize, amplitude: f64) {
        let enabled = self.model.partials()[index].enabled();
        self.set_partial_state(index, amplitude, enabled);
    }

    /// Manual include/exclude, keeping the amplitude
    pub fn set_partial_enabled(&mut self, index: usize, enabled: bool) {
        let amplitude = self.model.partials()[index].amplitude();
        self.set_partial_state(index, amplitude, enabled);
    }

    pub fn apply_square_defaults(&mut self) {
        self.stop_build();
        self.model.apply_square_defaults();
    }

    pub fn reset_to_fundamental(&mut self) {
        self.stop_build();
        self.model.reset_to_fundamental();
    }

    // --- square build -------------------------------------------------------

    /// Start (or restart) the build with the current inputs
    pub fn start_build(&mut self) {
        let inputs = self.build_inputs;
        self.sequencer.start(
            inputs.target_odd_count,
            inputs.step_s,
            &mut self.model,
            &mut self.timers,
        );
    }

    pub fn stop_build(&mut self) {
        if self.sequencer.is_running() {
            self.sequencer.stop(&mut self.timers);
        }
    }

    /// Build button: start when idle, stop when running
    pub fn toggle_build(&mut self) {
        if self.sequencer.is_running() {
            self.stop_build();
        } else {
            self.start_build();
        }
    }

    /// Replace the build inputs from raw text, keeping whichever is `None`.
    ///
    /// A running build restarts with the new inputs.
    pub fn set_build_inputs(&mut self, step_text: Option<&str>, count_text: Option<&str>) {
        let current_step = self.build_inputs.step_s.to_string();
        let current_count = self.build_inputs.target_odd_count.to_string();
        self.build_inputs = BuildSettings::from_raw(
            step_text.unwrap_or(&current_step),
            count_text.unwrap_or(&current_count),
            self.model.len(),
        );
        if self.sequencer.is_running() {
            self.start_build();
        }
    }

    // --- playback -----------------------------------------------------------

    pub fn toggle_playback(&mut self) -> bool {
        self.gate.toggle(self.model.tone_engine_mut())
    }

    pub fn master_gain(&self) -> f64 {
        self.master_gain
    }

    /// Set the master gain, clamped to 0..=1
    pub fn set_master_gain(&mut self, value: f64) {
        self.master_gain = value.clamp(0.0, 1.0);
        if let Some(tone) = self.model.tone_engine_mut() {
            tone.set_master_gain(self.master_gain);
        }
    }

    // --- clock --------------------------------------------------------------

    /// Begin the repeating redraw at `now_s`
    pub fn start_rendering(&mut self, now_s: f64) {
        self.ticker.start(now_s);
    }

    pub fn stop_rendering(&mut self) {
        self.ticker.stop();
    }

    /// Release due build steps, then draw a frame if one is due
    pub fn tick(&mut self, now_s: f64) -> Result<()> {
        self.advance_timers(now_s);
        if self.ticker.poll(now_s) {
            self.render_frame()?;
        }
        Ok(())
    }

    /// Release every build step due at or before `now_s`
    pub fn advance_timers(&mut self, now_s: f64) {
        while let Some((_, step)) = self.timers.pop_due(now_s) {
            self.sequencer
                .on_timer(step, &mut self.model, &mut self.timers);
        }
        self.timers.set_now(now_s);
    }

    /// Earliest time anything needs to happen
    pub fn next_deadline(&self) -> Option<f64> {
        match (self.timers.next_deadline(), self.ticker.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Compute the composite and every partial preview and hand them to the renderer
    pub fn render_frame(&mut self) -> Result<()> {
        let composite = self.synth.composite(self.model.partials());
        self.renderer
            .render_composite(&composite.samples, composite.max_magnitude);
        for partial in self.model.partials() {
            let samples = self.synth.partial_wave(partial);
            self.renderer
                .render_partial_preview(partial.index(), &samples, partial.enabled());
        }
        self.renderer.present()
    }

    // --- commands -----------------------------------------------------------

    /// Apply one user command at `now_s`
    pub fn handle(&mut self, command: Command, now_s: f64) -> Control {
        self.advance_timers(now_s);

        match command {
            Command::TogglePlayback => {
                let playing = self.toggle_playback();
                if playing && !self.model.has_tone_engine() {
                    log::warn!("No audio output attached, playback is silent");
                }
            }
            Command::ApplySquareDefaults => self.apply_square_defaults(),
            Command::ResetToFundamental => self.reset_to_fundamental(),
            Command::Build { count, step } => {
                if count.is_none() && step.is_none() {
                    self.toggle_build();
                } else {
                    // A running build is restarted by the input change itself
                    let was_running = self.sequencer.is_running();
                    self.set_build_inputs(step.as_deref(), count.as_deref());
                    if !was_running {
                        self.start_build();
                    }
                }
            }
            Command::StopBuild => self.stop_build(),
            Command::SetBuildStep(step) => self.set_build_inputs(Some(step.as_str()), None),
            Command::SetBuildCount(count) => self.set_build_inputs(None, Some(count.as_str())),
            Command::SetAmplitude {
                harmonic,
                amplitude,
            } => {
                if let Some(index) = self.checked_index(harmonic) {
                    self.set_partial_amplitude(index, amplitude);
                }
            }
            Command::SetEnabled { harmonic, enabled } => {
                if let Some(index) = self.checked_index(harmonic) {
                    self.set_partial_enabled(index, enabled);
                }
            }
            Command::SetMasterGain(gain) => self.set_master_gain(gain),
            Command::Status => return Control::Reply(self.status()),
            Command::Help => return Control::Reply(HELP.to_string()),
            Command::Quit => return Control::Quit,
        }
        Control::Continue
    }

    fn checked_index(&self, harmonic: u32) -> Option<usize> {
        let index = self.model.partial(harmonic).map(|p| p.index());
        if index.is_none() {
            log::warn!(
                "Harmonic {} is outside the bank (1..={})",
                harmonic,
                self.model.len()
            );
        }
        index
    }

    /// One-paragraph description of the current state
    pub fn status(&self) -> String {
        let composite = self.synth.composite(self.model.partials());
        let build = match self.sequencer.settings() {
            Some(settings) => format!(
                "running {}/{} ({:.2}s per step)",
                self.sequencer.cursor(),
                self.sequencer.sequence().len(),
                settings.step_s
            ),
            None => "idle".to_string(),
        };
        let audible: Vec<String> = self
            .model
            .partials()
            .iter()
            .filter(|p| p.is_audible())
            .map(|p| format!("{}:{:.3}", p.harmonic(), p.amplitude()))
            .collect();

        format!(
            "playing: {} | master gain: {:.2} | build: {} | next build: {} odd, {:.2}s\n\
             peak: {:.3} | distance from square: {:.4}\n\
             audible partials ({}): {}",
            self.gate.is_playing(),
            self.master_gain,
            build,
            self.build_inputs.target_odd_count,
            self.build_inputs.step_s,
            composite.max_magnitude,
            self.synth.distance_from_square(&composite),
            audible.len(),
            audible.join(" ")
        )
    }
}
