//! Job execution sequencer
//!
//! Turns an operator job (manual step, go-to, route run, full reset) into a
//! sequence of operations: tracked transits, actuator moves, confirmation
//! gates and counter updates. The sequencer never waits itself. The owner
//! executes each [`Op`], waits for it to finish, then asks for the next one
//! with the updated position. Dropping the sequencer abandons the job.

use heapless::Vec;

use super::builder::Route;
use super::queue::{RouteQueue, MAX_ROUTES};
use crate::config::Calibration;
use crate::motion::compiler::plan_transit;
use crate::motion::position::{Motion, MotionError, Position, Prompt};
use crate::motion::safe_return::next_transit;
use crate::motion::validator::{validate, MoveError};
use crate::motion::zone::Zone;

/// Busy-gated operator job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Job {
    /// Single loaded step into a zone; reaching the Destination dumps and
    /// returns to S1
    Step(Zone),
    /// Safe-return to a start slot
    Return(Zone),
    /// Execute every queued route
    Run,
    /// Descend to the Destination, wait for the bin to be emptied, return
    /// to S1 and clear the queue; from the top row only the return is made
    Reset,
    /// One calibration move that leaves the tracked position alone
    Jog(Motion),
}

/// Sequencer execution phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionPhase {
    /// Calibration move pending
    Jogging(Motion),
    /// Manual step into a zone pending
    Stepping(Zone),
    /// Reset burst descent pending
    Descending,
    /// Safe-return toward a start slot in progress
    Returning(Zone),
    /// Waiting for the operator to load a marble
    AwaitingLoad,
    /// Following the current route's path
    Traversing,
    /// Dump actuator opening
    DumpOpen,
    /// Dump actuator closing
    DumpClose,
    /// Dump finished, counter update pending
    Tally,
    /// Waiting for the operator to empty the bin
    AwaitingEmpty,
    /// Queue clear pending
    ClearQueue,
    /// Job finished
    Complete,
}

/// Next thing the owner has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Op {
    /// Transmit and wait for a transit
    Motion(Motion),
    /// Wait for operator confirmation
    Confirm(Prompt),
    /// A marble was dumped
    Tally,
    /// Clear the route queue
    ClearQueue,
    /// Job finished
    Done,
}

/// Sequencer errors; the job cannot continue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    /// Run requested with nothing queued
    EmptyQueue,
    /// A step failed validation from the current position
    Move(MoveError),
    /// A step could not be planned
    Motion(MotionError),
}

impl From<MoveError> for SequenceError {
    fn from(err: MoveError) -> Self {
        SequenceError::Move(err)
    }
}

impl From<MotionError> for SequenceError {
    fn from(err: MotionError) -> Self {
        SequenceError::Motion(err)
    }
}

impl core::fmt::Display for SequenceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SequenceError::EmptyQueue => f.write_str("no routes queued"),
            SequenceError::Move(err) => write!(f, "{}", err),
            SequenceError::Motion(err) => write!(f, "{}", err),
        }
    }
}

impl core::error::Error for SequenceError {}

/// Job sequencer
#[derive(Debug, Clone)]
pub struct Sequencer {
    job: Job,
    phase: ExecutionPhase,
    /// Phase entered once a safe-return arrives
    resume: ExecutionPhase,
    /// Routes copied out of the queue when the run starts
    routes: Vec<Route, MAX_ROUTES>,
    route_index: usize,
    step_index: usize,
}

impl Sequencer {
    /// Prepare a job
    pub fn new(job: Job, queue: &RouteQueue) -> Result<Self, SequenceError> {
        let mut sequencer = Self {
            job,
            phase: ExecutionPhase::Complete,
            resume: ExecutionPhase::Complete,
            routes: Vec::new(),
            route_index: 0,
            step_index: 0,
        };

        match job {
            Job::Step(zone) => sequencer.phase = ExecutionPhase::Stepping(zone),
            Job::Return(zone) => {
                if !zone.is_start() {
                    return Err(SequenceError::Motion(MotionError::InvalidTarget));
                }
                sequencer.phase = ExecutionPhase::Returning(zone);
            }
            Job::Run => {
                let first = queue.get(0).ok_or(SequenceError::EmptyQueue)?;
                sequencer.phase = ExecutionPhase::Returning(first.origin);
                sequencer.resume = ExecutionPhase::AwaitingLoad;
                for route in queue.routes() {
                    let _ = sequencer.routes.push(route.clone());
                }
            }
            Job::Reset => sequencer.phase = ExecutionPhase::Descending,
            Job::Jog(motion) => sequencer.phase = ExecutionPhase::Jogging(motion),
        }
        Ok(sequencer)
    }

    pub fn job(&self) -> Job {
        self.job
    }

    pub fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// Route currently executing, for runs
    pub fn current_route(&self) -> Option<&Route> {
        match self.job {
            Job::Run => self.routes.get(self.route_index),
            _ => None,
        }
    }

    /// Advance to the next operation from the carrier's current position
    pub fn next_op(
        &mut self,
        position: &Position,
        calibration: &Calibration,
    ) -> Result<Op, SequenceError> {
        loop {
            match self.phase {
                ExecutionPhase::Jogging(motion) => {
                    self.phase = ExecutionPhase::Complete;
                    return Ok(Op::Motion(Motion {
                        arrival: None,
                        ..motion
                    }));
                }
                ExecutionPhase::Stepping(target) => {
                    validate(position.zone, target)?;
                    let motion = plan_transit(position, target, calibration)?;
                    self.phase = if target == Zone::Destination {
                        ExecutionPhase::DumpOpen
                    } else {
                        ExecutionPhase::Complete
                    };
                    return Ok(Op::Motion(motion));
                }
                ExecutionPhase::Descending => {
                    // Nothing to empty from the top row or an unloaded bin
                    if position.zone == Zone::Destination || position.zone.is_start() {
                        self.return_then(Zone::S1, ExecutionPhase::ClearQueue);
                        continue;
                    }
                    let motion = plan_transit(position, Zone::Destination, calibration)?;
                    self.phase = ExecutionPhase::AwaitingEmpty;
                    return Ok(Op::Motion(motion));
                }
                ExecutionPhase::Returning(target) => {
                    match next_transit(position, target, calibration)? {
                        Some(motion) => return Ok(Op::Motion(motion)),
                        None => self.phase = self.resume,
                    }
                }
                ExecutionPhase::AwaitingLoad => {
                    let origin = self
                        .current_route()
                        .map(|route| route.origin)
                        .ok_or(SequenceError::EmptyQueue)?;
                    self.step_index = 0;
                    self.phase = ExecutionPhase::Traversing;
                    return Ok(Op::Confirm(Prompt::LoadMarble(origin)));
                }
                ExecutionPhase::Traversing => {
                    let target = self
                        .current_route()
                        .and_then(|route| route.path.get(self.step_index).copied());
                    let Some(target) = target else {
                        self.phase = ExecutionPhase::DumpOpen;
                        continue;
                    };
                    validate(position.zone, target)?;
                    let motion = plan_transit(position, target, calibration)?;
                    self.step_index += 1;
                    return Ok(Op::Motion(motion));
                }
                ExecutionPhase::DumpOpen => {
                    self.phase = ExecutionPhase::DumpClose;
                    return Ok(Op::Motion(Motion::untracked(
                        calibration.open(),
                        calibration.dump_open_ms,
                    )));
                }
                ExecutionPhase::DumpClose => {
                    self.phase = ExecutionPhase::Tally;
                    return Ok(Op::Motion(Motion::untracked(
                        calibration.close(),
                        calibration.dump_close_ms,
                    )));
                }
                ExecutionPhase::Tally => {
                    self.after_dump();
                    return Ok(Op::Tally);
                }
                ExecutionPhase::AwaitingEmpty => {
                    self.return_then(Zone::S1, ExecutionPhase::ClearQueue);
                    return Ok(Op::Confirm(Prompt::EmptyBin));
                }
                ExecutionPhase::ClearQueue => {
                    self.phase = ExecutionPhase::Complete;
                    return Ok(Op::ClearQueue);
                }
                ExecutionPhase::Complete => return Ok(Op::Done),
            }
        }
    }

    fn return_then(&mut self, target: Zone, resume: ExecutionPhase) {
        self.phase = ExecutionPhase::Returning(target);
        self.resume = resume;
    }

    /// Pick the next route, or head home once the last one is dumped
    fn after_dump(&mut self) {
        if self.job == Job::Run {
            self.route_index += 1;
            if let Some(next) = self.routes.get(self.route_index) {
                let origin = next.origin;
                self.return_then(origin, ExecutionPhase::AwaitingLoad);
                return;
            }
        }
        self.return_then(Zone::S1, ExecutionPhase::Complete);
    }
}
