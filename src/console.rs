//! Text commands for the live terminal mode.
//!
//! Each line typed on stdin becomes one [`Command`]; a reader thread forwards
//! them over a channel so the session itself stays single-threaded.

use std::io::BufRead;
use std::thread;

use crossbeam_channel::Sender;

use crate::error::{Error, Result};

/// Help text printed by `help`
pub const HELP: &str = "\
Commands:
  play            toggle playback (play/pause)
  defaults        ideal square coefficients on odd harmonics
  reset           fundamental only
  build [n] [s]   start/stop the square build (n odd harmonics, s seconds per step)
  stop            stop the square build
  step <s>        set seconds per build step
  count <n>       set number of odd harmonics to build
  amp <h> <a>     set amplitude of harmonic h
  on <h> / off <h>  include or exclude harmonic h
  gain <g>        master gain (0..1)
  status          print the current state
  quit            exit";

/// One user action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    TogglePlayback,
    ApplySquareDefaults,
    ResetToFundamental,
    /// Toggle the build, or restart it with new inputs when any are given
    Build {
        count: Option<String>,
        step: Option<String>,
    },
    StopBuild,
    SetBuildStep(String),
    SetBuildCount(String),
    SetAmplitude { harmonic: u32, amplitude: f64 },
    SetEnabled { harmonic: u32, enabled: bool },
    SetMasterGain(f64),
    Status,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match (verb.to_lowercase().as_str(), args.as_slice()) {
            ("play" | "pause" | "p", []) => Command::TogglePlayback,
            ("defaults" | "square", []) => Command::ApplySquareDefaults,
            ("reset", []) => Command::ResetToFundamental,
            ("build" | "b", rest) if rest.len() <= 2 => Command::Build {
                count: rest.first().map(|s| s.to_string()),
                step: rest.get(1).map(|s| s.to_string()),
            },
            ("stop", []) => Command::StopBuild,
            ("step", [seconds]) => Command::SetBuildStep(seconds.to_string()),
            ("count", [count]) => Command::SetBuildCount(count.to_string()),
            ("amp", [harmonic, amplitude]) => Command::SetAmplitude {
                harmonic: parse_harmonic(harmonic)?,
                amplitude: parse_number(amplitude)?,
            },
            ("on", [harmonic]) => Command::SetEnabled {
                harmonic: parse_harmonic(harmonic)?,
                enabled: true,
            },
            ("off", [harmonic]) => Command::SetEnabled {
                harmonic: parse_harmonic(harmonic)?,
                enabled: false,
            },
            ("gain", [gain]) => Command::SetMasterGain(parse_number(gain)?),
            ("status" | "s", []) => Command::Status,
            ("help" | "h" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            _ => {
                return Err(Error::InvalidCommand(format!(
                    "'{}' (type 'help' for the list)",
                    line.trim()
                )))
            }
        };
        Ok(Some(command))
    }
}

fn parse_harmonic(text: &str) -> Result<u32> {
    text.parse::<u32>()
        .ok()
        .filter(|h| *h > 0)
        .ok_or_else(|| Error::InvalidCommand(format!("'{}' is not a harmonic number", text)))
}

fn parse_number(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::InvalidCommand(format!("'{}' is not a number", text)))
}

/// Spawn a thread that parses stdin lines and forwards them as commands.
///
/// Sends `Quit` when stdin closes. Parse errors are reported and skipped.
pub fn spawn_stdin_reader(commands: Sender<Command>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            };
            match Command::parse(&line) {
                Ok(Some(command)) => {
                    if commands.send(command).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => log::warn!("{}", e),
            }
        }
        let _ = commands.send(Command::Quit);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_simple_verbs() {
        assert_eq!(Command::parse("play").unwrap(), Some(Command::TogglePlayback));
        assert_eq!(Command::parse("  RESET ").unwrap(), Some(Command::ResetToFundamental));
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("q").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parses_build_arguments() {
        assert_eq!(
            Command::parse("build").unwrap(),
            Some(Command::Build {
                count: None,
                step: None
            })
        );
        assert_eq!(
            Command::parse("build 5 0.25").unwrap(),
            Some(Command::Build {
                count: Some("5".to_string()),
                step: Some("0.25".to_string())
            })
        );
        // Build inputs are coerced later, not rejected here
        assert_eq!(
            Command::parse("step fast").unwrap(),
            Some(Command::SetBuildStep("fast".to_string()))
        );
    }

    #[test]
    fn test_parses_partial_edits() {
        assert_eq!(
            Command::parse("amp 3 0.42").unwrap(),
            Some(Command::SetAmplitude {
                harmonic: 3,
                amplitude: 0.42
            })
        );
        assert_eq!(
            Command::parse("off 2").unwrap(),
            Some(Command::SetEnabled {
                harmonic: 2,
                enabled: false
            })
        );
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert!(Command::parse("amp 0 1.0").is_err());
        assert!(Command::parse("amp 3 loud").is_err());
        assert!(Command::parse("gain").is_err());
        assert!(Command::parse("dance").is_err());
        assert!(Command::parse("build 1 2 3").is_err());
    }
}
