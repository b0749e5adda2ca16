//! Squarewave - hear and watch a square wave assemble itself from odd harmonics
//!
//! Live mode plays the partial bank through the default audio device and takes
//! commands on stdin. Recording mode renders the same session offline to PNG
//! frames and a WAV file.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;

use squarewave::audio::{AudioSystem, BankToneEngine, SharedToneBank, ToneBank, WavRecorder};
use squarewave::cli::Args;
use squarewave::console::{spawn_stdin_reader, HELP};
use squarewave::params::{AudioConfig, RecordingConfig, RenderConfig};
use squarewave::rendering::{ConsoleRenderer, PngFrameRenderer};
use squarewave::session::{Control, Session};
use squarewave::synthesis::ideal_square_reference;
use squarewave::Result;

/// Idle wake-up when nothing is scheduled (seconds)
const IDLE_POLL_S: f64 = 0.25;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let result = match args.recording_config() {
        Some(recording) => record(&args, recording),
        None => run_live(&args),
    };

    if let Err(e) = result {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

/// Tone bank mirroring the session's current partials
fn shared_bank(session: &Session, audio_config: &AudioConfig) -> SharedToneBank {
    Arc::new(Mutex::new(ToneBank::from_partials(
        session.model().partials(),
        audio_config,
    )))
}

/// Interactive session: real-time audio, stdin commands, console rendering
fn run_live(args: &Args) -> Result<()> {
    let synth_config = args.synth_config();
    let audio_config = args.audio_config();
    audio_config.validate()?;
    synth_config.validate(audio_config.sample_rate_hz)?;

    let reference = ideal_square_reference(synth_config.sample_points);
    let renderer = ConsoleRenderer::new(&reference);
    let mut session = Session::new(&synth_config, args.frame_interval_s(), Box::new(renderer));
    session.set_build_inputs(Some(args.step.as_str()), Some(args.odd_count.as_str()));

    // Stream stays open until the session ends
    let audio = if args.no_audio {
        log::info!("Audio disabled");
        None
    } else {
        let bank = shared_bank(&session, &audio_config);
        match AudioSystem::new(Arc::clone(&bank), args.record_live.as_deref()) {
            Ok(audio) => {
                session.attach_tone_engine(Box::new(BankToneEngine::new(bank)), &audio_config);
                Some(audio)
            }
            Err(e) => {
                log::warn!("{}; continuing without audio", e);
                None
            }
        }
    };

    println!("\nSquarewave is running! Type commands and press enter.");
    println!("{}\n", HELP);

    let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
    let _stdin_thread = spawn_stdin_reader(commands_tx);

    let start = Instant::now();
    let now = || start.elapsed().as_secs_f64();

    session.start_rendering(now());
    if args.play {
        session.toggle_playback();
    }
    if args.build {
        session.start_build();
    }

    loop {
        if let Err(e) = session.tick(now()) {
            log::error!("Render error: {}", e);
        }

        let wait_s = session
            .next_deadline()
            .map(|deadline| deadline - now())
            .unwrap_or(IDLE_POLL_S)
            .clamp(0.0, IDLE_POLL_S);

        match commands_rx.recv_timeout(Duration::from_secs_f64(wait_s)) {
            Ok(command) => match session.handle(command, now()) {
                Control::Continue => {}
                Control::Reply(text) => println!("{}", text),
                Control::Quit => break,
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    session.stop_rendering();
    if let Some(audio) = audio {
        audio.finalize()?;
    }
    log::info!("Session ended");
    Ok(())
}

/// Offline session on a virtual clock: one PNG per frame plus the matching audio.
///
/// Recording always plays, so the WAV is never silent.
fn record(args: &Args, recording: RecordingConfig) -> Result<()> {
    let synth_config = args.synth_config();
    let audio_config = args.audio_config();
    audio_config.validate()?;
    synth_config.validate(audio_config.sample_rate_hz)?;
    fs::create_dir_all(&recording.output_dir)?;

    let reference = ideal_square_reference(synth_config.sample_points);
    let renderer = PngFrameRenderer::new(
        &RenderConfig::default(),
        &reference,
        synth_config.total_partials,
        recording.frames_dir(),
    )?;
    let frame_interval_s = recording.frame_interval_s();
    let mut session = Session::new(&synth_config, frame_interval_s, Box::new(renderer));
    session.set_build_inputs(Some(args.step.as_str()), Some(args.odd_count.as_str()));

    let bank = shared_bank(&session, &audio_config);
    session.attach_tone_engine(
        Box::new(BankToneEngine::new(Arc::clone(&bank))),
        &audio_config,
    );
    let mut recorder = WavRecorder::create(recording.audio_path(), bank)?;

    session.toggle_playback();
    if args.build {
        session.start_build();
    }

    let total_frames = recording.total_frames();
    log::info!(
        "Recording {} frames at {} FPS to {}",
        total_frames,
        recording.fps,
        recording.output_dir.display()
    );

    // Frames are driven directly rather than through the ticker so none are dropped
    for frame in 0..total_frames {
        let time_s = frame as f64 * frame_interval_s;
        session.advance_timers(time_s);
        session.render_frame()?;
        recorder.render_until(time_s + frame_interval_s)?;

        if frame > 0 && frame % recording.fps.max(1) as usize == 0 {
            log::info!("Recorded {:.0}s / {:.0}s", time_s, recording.duration_secs);
        }
    }

    recorder.finalize()?;
    log::info!(
        "Recording complete: {} frames in {}, audio in {}",
        total_frames,
        recording.frames_dir().display(),
        recording.audio_path().display()
    );
    Ok(())
}
