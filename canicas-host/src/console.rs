//! Operator console
//!
//! Reads one command per line from stdin on a dedicated thread and forwards
//! the parsed requests to the controller. Screen admission is checked by the
//! controller, not here.

use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tracing::{info, warn};

use canicas_core::motion::{Direction, Zone};
use canicas_core::scheduler::Shift;
use canicas_core::state::Screen;
use canicas_protocol::{Axis, TrimMotor};

use crate::channels::{latest_snapshot, REQUESTS};
use crate::controller::Request;
use crate::error::HostError;

const HELP: &str = "\
screens:      menu | back | manual | programmed | calibration
manual:       left | right | down | goto S1|S2|S3
programmed:   origin S1|S2|S3 | add <zone> | undo | clear | save
              remove <n> | earlier <n> | later <n> | run
calibration:  jog h|v +|- [fine] | trim l|r +|- | open | close | home
anywhere:     reset | stop | confirm | status | help";

/// Parsed console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Request(Request),
    Status,
    Help,
}

/// Console parse errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{0}' needs {1}")]
    MissingArgument(&'static str, &'static str),

    #[error("invalid argument '{0}'")]
    InvalidArgument(String),
}

/// Parse one console line
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(CommandError::Unknown(String::new()));
    };
    let verb = verb.to_ascii_lowercase();
    let mut arg = |name: &'static str, what: &'static str| {
        words
            .next()
            .ok_or(CommandError::MissingArgument(name, what))
    };

    let request = match verb.as_str() {
        "menu" => Request::Open(Screen::MainMenu),
        "back" => Request::Back,
        "manual" => Request::Open(Screen::Manual),
        "programmed" => Request::Open(Screen::Programmed),
        "calibration" => Request::Open(Screen::Calibration),

        "left" => Request::Step(Direction::Left),
        "right" => Request::Step(Direction::Right),
        "down" => Request::Step(Direction::Down),
        "goto" => Request::GoTo(zone(arg("goto", "a start slot")?)?),

        "origin" => Request::Origin(zone(arg("origin", "a start slot")?)?),
        "add" => Request::Append(zone(arg("add", "a zone")?)?),
        "undo" => Request::Undo,
        "clear" => Request::ClearPath,
        "save" => Request::Save,
        "remove" => Request::Remove(index(arg("remove", "a route number")?)?),
        "earlier" => Request::Reorder(index(arg("earlier", "a route number")?)?, Shift::Earlier),
        "later" => Request::Reorder(index(arg("later", "a route number")?)?, Shift::Later),
        "run" => Request::Run,

        "jog" => {
            let axis = match arg("jog", "an axis")?.to_ascii_lowercase().as_str() {
                "h" => Axis::Horizontal,
                "v" => Axis::Vertical,
                other => return Err(CommandError::InvalidArgument(other.into())),
            };
            let forward = sign(arg("jog", "a direction")?)?;
            let fine = match words.next() {
                None => false,
                Some(word) if word.eq_ignore_ascii_case("fine") => true,
                Some(other) => return Err(CommandError::InvalidArgument(other.into())),
            };
            Request::Jog { axis, fine, forward }
        }
        "trim" => {
            let motor = match arg("trim", "a motor")?.to_ascii_lowercase().as_str() {
                "l" => TrimMotor::Left,
                "r" => TrimMotor::Right,
                other => return Err(CommandError::InvalidArgument(other.into())),
            };
            let forward = sign(arg("trim", "a direction")?)?;
            Request::Trim { motor, forward }
        }
        "open" => Request::Servo { open: true },
        "close" => Request::Servo { open: false },
        "home" => Request::HomeHere,

        "reset" => Request::Reset,
        "stop" => Request::EmergencyStop,
        "confirm" | "ok" => Request::Confirm,
        "status" => return Ok(Command::Status),
        "help" => return Ok(Command::Help),
        _ => return Err(CommandError::Unknown(verb)),
    };
    Ok(Command::Request(request))
}

fn zone(word: &str) -> Result<Zone, CommandError> {
    Zone::from_label(word).ok_or_else(|| CommandError::InvalidArgument(word.into()))
}

/// 1-based route number to queue index
fn index(word: &str) -> Result<usize, CommandError> {
    match word.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::InvalidArgument(word.into())),
    }
}

fn sign(word: &str) -> Result<bool, CommandError> {
    match word {
        "+" => Ok(true),
        "-" => Ok(false),
        other => Err(CommandError::InvalidArgument(other.into())),
    }
}

/// Start the console thread
pub fn spawn_console() -> Result<JoinHandle<()>, HostError> {
    thread::Builder::new()
        .name("console".into())
        .spawn(run_console)
        .map_err(|source| HostError::Thread {
            name: "console",
            source,
        })
}

fn run_console() {
    println!("{}", HELP);
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Console read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(Command::Request(request)) => {
                if REQUESTS.try_send(request).is_err() {
                    warn!("Request queue full, '{}' dropped", line.trim());
                }
            }
            Ok(Command::Status) => match latest_snapshot() {
                Some(snapshot) => println!("{}", snapshot),
                None => println!("controller not started"),
            },
            Ok(Command::Help) => println!("{}", HELP),
            Err(e) => println!("{}", e),
        }
    }
    info!("Console closed");
}
