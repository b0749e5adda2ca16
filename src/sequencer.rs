//! Square build animation: enables odd harmonics one at a time at their ideal
//! amplitudes, so the composite visibly converges toward a square wave.
//!
//! State machine:
//!
//! ```text
//! Idle --start--> Running --last step / stop--> Idle
//!                    |  ^
//!                    +--+ step (one-shot timer)
//! ```
//!
//! At most one timer is outstanding. Every start and stop bumps a generation
//! counter carried in the timer payload, so a callback armed by an earlier run
//! is recognised and dropped even if it slips past cancellation.

use crate::harmonics::HarmonicModel;
use crate::params::BuildSettings;
use crate::timer::{TimerService, TimerToken};

/// Timer payload of one pending build step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStep {
    generation: u64,
}

/// Odd harmonics 1, 3, 5, ... limited to `target_odd_count` entries and to the bank size
pub fn odd_harmonic_sequence(target_odd_count: usize, total_partials: usize) -> Vec<u32> {
    (1..=total_partials as u32)
        .step_by(2)
        .take(target_odd_count)
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
enum BuildState {
    Idle,
    Running {
        settings: BuildSettings,
        sequence: Vec<u32>,
        cursor: usize,
        pending: Option<TimerToken>,
    },
}

/// Cancellable, restartable timed build of a square wave from its odd harmonics
#[derive(Debug)]
pub struct BuildSequencer {
    state: BuildState,
    generation: u64,
}

impl Default for BuildSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildSequencer {
    pub fn new() -> Self {
        Self {
            state: BuildState::Idle,
            generation: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, BuildState::Running { .. })
    }

    /// Settings of the active run
    pub fn settings(&self) -> Option<BuildSettings> {
        match &self.state {
            BuildState::Running { settings, .. } => Some(*settings),
            BuildState::Idle => None,
        }
    }

    /// Harmonics of the active run, in enable order
    pub fn sequence(&self) -> &[u32] {
        match &self.state {
            BuildState::Running { sequence, .. } => sequence,
            BuildState::Idle => &[],
        }
    }

    /// Steps already applied in the active run
    pub fn cursor(&self) -> usize {
        match &self.state {
            BuildState::Running { cursor, .. } => *cursor,
            BuildState::Idle => 0,
        }
    }

    /// Token of the armed step timer, if any
    pub fn pending_timer(&self) -> Option<TimerToken> {
        match &self.state {
            BuildState::Running { pending, .. } => *pending,
            BuildState::Idle => None,
        }
    }

    /// Silence the bank and begin a new run, cancelling any run in progress.
    ///
    /// Inputs are clamped to a step of at least 0.1s and to `[1, ceil(N/2)]`
    /// harmonics. The first harmonic is enabled before this returns.
    pub fn start(
        &mut self,
        target_odd_count: usize,
        step_s: f64,
        model: &mut HarmonicModel,
        timers: &mut dyn TimerService<BuildStep>,
    ) {
        self.stop(timers);

        let settings = BuildSettings::clamped(target_odd_count, step_s, model.len());
        let sequence = odd_harmonic_sequence(settings.target_odd_count, model.len());
        log::info!(
            "Square build: {} odd harmonics, {:.2}s per step",
            sequence.len(),
            settings.step_s
        );

        model.silence();
        self.state = BuildState::Running {
            settings,
            sequence,
            cursor: 0,
            pending: None,
        };
        self.advance(model, timers);
    }

    /// Handle a fired step timer. Steps from a cancelled or replaced run are ignored.
    pub fn on_timer(
        &mut self,
        step: BuildStep,
        model: &mut HarmonicModel,
        timers: &mut dyn TimerService<BuildStep>,
    ) {
        if step.generation != self.generation {
            log::trace!(
                "Dropping stale build step (generation {}, current {})",
                step.generation,
                self.generation
            );
            return;
        }
        if let BuildState::Running { pending, .. } = &mut self.state {
            *pending = None;
        }
        self.advance(model, timers);
    }

    /// Cancel the run and any pending timer. Safe to call in any state.
    pub fn stop(&mut self, timers: &mut dyn TimerService<BuildStep>) {
        if let BuildState::Running { pending, .. } = &self.state {
            if let Some(token) = pending {
                timers.cancel(*token);
            }
            log::debug!("Square build stopped at step {}", self.cursor());
        }
        self.state = BuildState::Idle;
        self.generation += 1;
    }

    fn advance(&mut self, model: &mut HarmonicModel, timers: &mut dyn TimerService<BuildStep>) {
        let BuildState::Running {
            settings,
            sequence,
            cursor,
            pending,
        } = &mut self.state
        else {
            return;
        };

        let Some(&harmonic) = sequence.get(*cursor) else {
            self.finish();
            return;
        };

        let index = harmonic as usize - 1;
        let amplitude = model.partials()[index].default_amplitude();
        model.set_partial_state(index, amplitude, true);
        *cursor += 1;
        log::debug!(
            "Square build step {}/{}: harmonic {} at {:.4}",
            cursor,
            sequence.len(),
            harmonic,
            amplitude
        );

        if *cursor >= sequence.len() {
            self.finish();
            return;
        }

        let step = BuildStep {
            generation: self.generation,
        };
        *pending = Some(timers.schedule_once(settings.step_s, step));
    }

    fn finish(&mut self) {
        log::info!("Square build complete");
        self.state = BuildState::Idle;
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerQueue;

    fn enabled_harmonics(model: &HarmonicModel) -> Vec<u32> {
        model
            .partials()
            .iter()
            .filter(|p| p.enabled())
            .map(|p| p.harmonic())
            .collect()
    }

    /// Release every due step up to `now_s`, like the session loop does
    fn run_until(
        sequencer: &mut BuildSequencer,
        model: &mut HarmonicModel,
        timers: &mut TimerQueue<BuildStep>,
        now_s: f64,
    ) {
        while let Some((_, step)) = timers.pop_due(now_s) {
            sequencer.on_timer(step, model, timers);
        }
        timers.set_now(now_s);
    }

    #[test]
    fn test_odd_sequence() {
        assert_eq!(odd_harmonic_sequence(5, 64), vec![1, 3, 5, 7, 9]);
        assert_eq!(odd_harmonic_sequence(32, 64).len(), 32);
        assert_eq!(odd_harmonic_sequence(10, 6), vec![1, 3, 5]);
    }

    #[test]
    fn test_first_step_is_synchronous() {
        let mut model = HarmonicModel::create_bank(64, 220.0);
        let mut timers = TimerQueue::new();
        let mut sequencer = BuildSequencer::new();

        sequencer.start(5, 0.1, &mut model, &mut timers);

        assert!(sequencer.is_running());
        assert_eq!(enabled_harmonics(&model), vec![1]);
        assert_eq!(
            model.partials()[0].amplitude(),
            model.partials()[0].default_amplitude()
        );
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_runs_to_completion() {
        let mut model = HarmonicModel::create_bank(64, 220.0);
        let mut timers = TimerQueue::new();
        let mut sequencer = BuildSequencer::new();

        sequencer.start(5, 0.1, &mut model, &mut timers);
        assert_eq!(sequencer.sequence(), &[1, 3, 5, 7, 9]);

        run_until(&mut sequencer, &mut model, &mut timers, 0.25);
        assert_eq!(enabled_harmonics(&model), vec![1, 3, 5]);

        run_until(&mut sequencer, &mut model, &mut timers, 10.0);
        assert_eq!(enabled_harmonics(&model), vec![1, 3, 5, 7, 9]);
        assert!(!sequencer.is_running());
        assert!(timers.is_empty());
        assert!(sequencer.pending_timer().is_none());
        for harmonic in [1, 3, 5, 7, 9] {
            let partial = model.partial(harmonic).unwrap();
            assert_eq!(partial.amplitude(), partial.default_amplitude());
        }
    }

    #[test]
    fn test_single_step_arms_no_timer() {
        let mut model = HarmonicModel::create_bank(64, 220.0);
        let mut timers = TimerQueue::new();
        let mut sequencer = BuildSequencer::new();

        sequencer.start(1, 0.5, &mut model, &mut timers);
        assert!(!sequencer.is_running());
        assert!(timers.is_empty());
        assert_eq!(enabled_harmonics(&model), vec![1]);
    }

    #[test]
    fn test_clamps_inputs() {
        let mut model = HarmonicModel::create_bank(64, 220.0);
        let mut timers = TimerQueue::new();
        let mut sequencer = BuildSequencer::new();

        sequencer.start(1000, 0.0001, &mut model, &mut timers);
        let settings = sequencer.settings().unwrap();
        assert_eq!(settings.target_odd_count, 32);
        assert_eq!(settings.step_s, 0.1);
        assert_eq!(sequencer.sequence().len(), 32);
        assert_eq!(timers.next_deadline(), Some(0.1));
    }

    #[test]
    fn test_stop_discards_stale_step() {
        let mut model = HarmonicModel::create_bank(64, 220.0);
        let mut timers = TimerQueue::new();
        let mut sequencer = BuildSequencer::new();

        sequencer.start(5, 0.1, &mut model, &mut timers);
        let stale = BuildStep {
            generation: sequencer.generation,
        };
        sequencer.stop(&mut timers);
        assert!(timers.is_empty());
        assert_eq!(sequencer.cursor(), 0);
        assert!(sequencer.sequence().is_empty());

        // A callback that fired before the cancel landed must not touch the bank
        let before = model.partials().to_vec();
        sequencer.on_timer(stale, &mut model, &mut timers);
        assert_eq!(model.partials(), &before[..]);
        assert!(!sequencer.is_running());

        sequencer.stop(&mut timers);
        assert!(!sequencer.is_running());
    }

    #[test]
    fn test_restart_replaces_pending_timer() {
        let mut model = HarmonicModel::create_bank(64, 220.0);
        let mut timers = TimerQueue::new();
        let mut sequencer = BuildSequencer::new();

        sequencer.start(5, 0.1, &mut model, &mut timers);
        run_until(&mut sequencer, &mut model, &mut timers, 0.15);
        let first_run = BuildStep {
            generation: sequencer.generation,
        };

        sequencer.start(3, 1.0, &mut model, &mut timers);
        assert_eq!(timers.len(), 1);
        assert_eq!(enabled_harmonics(&model), vec![1]);

        sequencer.on_timer(first_run, &mut model, &mut timers);
        assert_eq!(enabled_harmonics(&model), vec![1]);

        run_until(&mut sequencer, &mut model, &mut timers, 1.2);
        assert_eq!(enabled_harmonics(&model), vec![1, 3]);
    }
}
