//! Carrier controller
//!
//! The controller owns every piece of mutable machine state: the screen,
//! the position tracker, the safety flags, the route builder and queue, the
//! counters and the active job. It never waits or does I/O. Each request,
//! motion report or telemetry frame updates the state and returns a list of
//! [`Effect`]s for the controller task to carry out.

use core::fmt;

use heapless::Vec;

use canicas_core::config::Calibration;
use canicas_core::motion::{
    step_target, validate, Direction, Motion, MotionError, MotionState, Position,
    PositionTracker, Prompt, Zone,
};
use canicas_core::safety::{SafetyState, SafetySupervisor};
use canicas_core::scheduler::{
    Admission, Job, Op, Route, RouteBuilder, RouteQueue, SequenceError, Sequencer, Shift,
    MAX_PATH_LEN, MAX_ROUTES,
};
use canicas_core::state::{Capability, MarbleCounters, Screen, ScreenEvent};
use canicas_protocol::{Axis, Directive, TelemetryFrame, TrimMotor};
use tracing::{debug, info, warn};

use crate::channels::{MotionOutcome, MotionReport};
use crate::error::ControlError;

/// Most effects a single message can produce
pub const MAX_EFFECTS: usize = 8;

/// Effects produced by one message
pub type Effects = Vec<Effect, MAX_EFFECTS>;

/// Operator request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Enter a top-level screen
    Open(Screen),
    /// Back out to the main menu
    Back,
    /// Manual single-cell step
    Step(Direction),
    /// Manual safe-return to a start slot
    GoTo(Zone),
    /// Restart the route under construction at a start slot
    Origin(Zone),
    Append(Zone),
    Undo,
    /// Drop every appended zone, keeping the origin
    ClearPath,
    /// Commit the route and add it to the queue
    Save,
    /// Remove a queued route
    Remove(usize),
    /// Move a queued route one place
    Reorder(usize, Shift),
    /// Execute every queued route
    Run,
    /// Calibration jog on one axis
    Jog { axis: Axis, fine: bool, forward: bool },
    /// Calibration trim of one vertical motor
    Trim { motor: TrimMotor, forward: bool },
    /// Drive the dump actuator
    Servo { open: bool },
    /// Declare the carrier aligned at S1
    HomeHere,
    /// Full-system reset
    Reset,
    EmergencyStop,
    /// Resolve a pending operator prompt
    Confirm,
}

impl Request {
    /// Request family used for screen admission
    pub fn capability(&self) -> Capability {
        match self {
            Request::Step(_) | Request::GoTo(_) => Capability::Drive,
            Request::Origin(_)
            | Request::Append(_)
            | Request::Undo
            | Request::ClearPath
            | Request::Save
            | Request::Remove(_)
            | Request::Reorder(..)
            | Request::Run => Capability::Program,
            Request::Jog { .. }
            | Request::Trim { .. }
            | Request::Servo { .. }
            | Request::HomeHere => Capability::Calibrate,
            Request::Open(_)
            | Request::Back
            | Request::Reset
            | Request::EmergencyStop
            | Request::Confirm => Capability::Anywhere,
        }
    }
}

/// Something the controller task has to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Send a directive to the board
    Transmit(Directive),
    /// Start a transit wait
    Wait { id: u32, duration_ms: u32 },
    /// Abort transit waits up to `id`, even one not yet started
    Abort { id: u32 },
    /// Ask the operator for a confirmation
    Prompt(Prompt),
    /// Job finished
    Finished(Job),
    /// Job stopped on an error
    Failed(Job, SequenceError),
    /// Job dropped by an emergency stop
    Cancelled(Job),
}

/// Copy of the controller state for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub screen: Screen,
    pub position: Position,
    pub motion: MotionState,
    pub safety: SafetyState,
    pub counters: MarbleCounters,
    pub job: Option<Job>,
    pub builder_origin: Zone,
    pub builder_path: Vec<Zone, MAX_PATH_LEN>,
    pub queue: Vec<Route, MAX_ROUTES>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "screen:    {}", self.screen)?;
        write!(f, "carrier:   {}", self.position.zone)?;
        if self.position.zone == Zone::Destination {
            write!(f, " (column {})", self.position.destination_column)?;
        }
        writeln!(f)?;
        match self.motion {
            MotionState::Idle => writeln!(f, "motion:    idle")?,
            MotionState::Moving(motion) => writeln!(f, "motion:    moving ({})", motion.directive)?,
            MotionState::AwaitingConfirmation(prompt) => writeln!(f, "motion:    waiting: {}", prompt)?,
        }
        if let Some(job) = self.job {
            writeln!(f, "job:       {:?}", job)?;
        }
        writeln!(
            f,
            "safety:    busy={} emergency_stop={}",
            self.safety.busy, self.safety.emergency_stop
        )?;
        writeln!(
            f,
            "marbles:   {} (entries {}, exits {})",
            self.counters.marbles, self.counters.entries, self.counters.exits
        )?;
        write!(f, "route:     {}", self.builder_origin)?;
        for zone in &self.builder_path {
            write!(f, " -> {}", zone)?;
        }
        writeln!(f)?;
        if self.queue.is_empty() {
            write!(f, "queue:     empty")?;
        }
        for (i, route) in self.queue.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "queue {}:   {}", i + 1, route)?;
        }
        Ok(())
    }
}

/// Single owner of the carrier state
pub struct Controller {
    calibration: Calibration,
    screen: Screen,
    tracker: PositionTracker,
    supervisor: SafetySupervisor,
    builder: RouteBuilder,
    queue: RouteQueue,
    counters: MarbleCounters,
    /// Active busy-gated job
    job: Option<Sequencer>,
    /// Id of the transit wait the tracker is moving for
    wait_id: Option<u32>,
    next_wait_id: u32,
}

impl Controller {
    pub fn new(calibration: Calibration) -> Self {
        Self {
            calibration,
            screen: Screen::default(),
            tracker: PositionTracker::new(),
            supervisor: SafetySupervisor::new(calibration.servo_closed),
            builder: RouteBuilder::default(),
            queue: RouteQueue::new(),
            counters: MarbleCounters::new(),
            job: None,
            wait_id: None,
            next_wait_id: 1,
        }
    }

    /// Active job, if any
    pub fn job(&self) -> Option<Job> {
        self.job.as_ref().map(Sequencer::job)
    }

    /// Process an operator request
    ///
    /// A refused request leaves the state unchanged.
    pub fn handle_request(&mut self, request: Request) -> Result<Effects, ControlError> {
        if !self.screen.permits(request.capability()) {
            return Err(ControlError::NotOnScreen(self.screen));
        }

        let mut effects = Effects::new();
        match request {
            Request::Open(screen) => self.enter(ScreenEvent::Open(screen))?,
            Request::Back => self.enter(ScreenEvent::Back)?,
            Request::Step(direction) => {
                self.supervisor.ensure_ready()?;
                let position = self.tracker.position();
                let target = step_target(&position, direction)?;
                validate(position.zone, target)?;
                self.start(Job::Step(target), &mut effects)?;
            }
            Request::GoTo(zone) => {
                if !zone.is_start() {
                    return Err(MotionError::InvalidTarget.into());
                }
                self.start(Job::Return(zone), &mut effects)?;
            }
            Request::Origin(zone) => self.builder.restart(zone)?,
            Request::Append(zone) => self.builder.append(zone)?,
            Request::Undo => {
                self.builder.undo();
            }
            Request::ClearPath => self.builder.clear(),
            Request::Save => {
                let route = self.builder.commit()?;
                match self.queue.add(route)? {
                    Admission::Appended(i) => info!("Route saved as #{}", i + 1),
                    Admission::Replaced(i) => info!("Route #{} replaced", i + 1),
                }
                self.builder.clear();
            }
            Request::Remove(index) => {
                let route = self.queue.remove(index)?;
                info!("Removed route {}", route);
            }
            Request::Reorder(index, shift) => {
                let to = self.queue.reorder(index, shift)?;
                debug!("Route #{} moved to #{}", index + 1, to + 1);
            }
            Request::Run => self.start(Job::Run, &mut effects)?,
            Request::Jog { axis, fine, forward } => {
                let motion = self.jog(axis, fine, forward);
                self.start(Job::Jog(motion), &mut effects)?;
            }
            Request::Trim { motor, forward } => {
                let motion = self.trim(motor, forward);
                self.start(Job::Jog(motion), &mut effects)?;
            }
            Request::Servo { open } => {
                let motion = if open {
                    Motion::untracked(self.calibration.open(), self.calibration.dump_open_ms)
                } else {
                    Motion::untracked(self.calibration.close(), self.calibration.dump_close_ms)
                };
                self.start(Job::Jog(motion), &mut effects)?;
            }
            Request::HomeHere => {
                self.supervisor.ensure_ready()?;
                self.tracker.set_position(Position::new(Zone::S1, 0))?;
                info!("Carrier homed at S1");
            }
            Request::Reset => self.start(Job::Reset, &mut effects)?,
            Request::EmergencyStop => self.emergency_stop(&mut effects),
            Request::Confirm => {
                let prompt = self.tracker.confirm()?;
                debug!("Confirmed: {}", prompt);
                self.advance(&mut effects);
            }
        }
        Ok(effects)
    }

    /// Process the end of a transit wait
    ///
    /// Reports for a wait that is no longer current are ignored.
    pub fn handle_motion_report(&mut self, report: MotionReport) -> Effects {
        let mut effects = Effects::new();
        if self.wait_id != Some(report.id) {
            debug!("Ignoring stale motion report {}", report.id);
            return effects;
        }
        self.wait_id = None;

        match report.outcome {
            MotionOutcome::Completed => {
                if let Err(err) = self.tracker.complete() {
                    warn!("Motion report while {}", err);
                    return effects;
                }
                self.advance(&mut effects);
            }
            MotionOutcome::Aborted => {
                self.tracker.abort();
                if let Some(sequencer) = self.job.take() {
                    let _ = effects.push(Effect::Cancelled(sequencer.job()));
                }
                self.supervisor.release();
            }
        }
        effects
    }

    /// Apply a telemetry frame to the counters
    pub fn handle_telemetry(&mut self, frame: &TelemetryFrame) {
        self.counters.apply(frame);
    }

    /// Copy out the current state
    pub fn snapshot(&self) -> Snapshot {
        let mut builder_path = Vec::new();
        let _ = builder_path.extend_from_slice(self.builder.path());
        let mut queue = Vec::new();
        for route in self.queue.routes() {
            let _ = queue.push(route.clone());
        }
        Snapshot {
            screen: self.screen,
            position: self.tracker.position(),
            motion: self.tracker.state(),
            safety: self.supervisor.state(),
            counters: self.counters,
            job: self.job(),
            builder_origin: self.builder.origin(),
            builder_path,
            queue,
        }
    }

    fn enter(&mut self, event: ScreenEvent) -> Result<(), ControlError> {
        if self.job.is_some() {
            return Err(ControlError::JobRunning);
        }
        self.screen = self.screen.transition(event);
        self.supervisor.clear_on_screen_entry();
        if self.screen == Screen::Programmed {
            self.builder = RouteBuilder::default();
        }
        info!("Entered {} screen", self.screen);
        Ok(())
    }

    /// Claim the busy flag and run the first steps of a job
    fn start(&mut self, job: Job, effects: &mut Effects) -> Result<(), ControlError> {
        self.supervisor.ensure_ready()?;
        let sequencer = Sequencer::new(job, &self.queue)?;
        self.supervisor.try_acquire()?;
        debug!("Starting {:?}", job);
        self.job = Some(sequencer);
        self.advance(effects);
        Ok(())
    }

    /// Step the active job until it has to wait
    fn advance(&mut self, effects: &mut Effects) {
        loop {
            let Some(sequencer) = self.job.as_mut() else {
                return;
            };
            let job = sequencer.job();
            let position = self.tracker.position();
            match sequencer.next_op(&position, &self.calibration) {
                Ok(Op::Motion(motion)) => {
                    if let Err(err) = self.supervisor.admit(&motion.directive) {
                        warn!("Blocked {}: {}", motion.directive, err);
                        self.job = None;
                        let _ = effects.push(Effect::Cancelled(job));
                        return;
                    }
                    if let Err(err) = self.tracker.begin(motion) {
                        self.fail(job, err.into(), effects);
                        return;
                    }
                    let id = self.next_wait_id;
                    self.next_wait_id = self.next_wait_id.wrapping_add(1);
                    self.wait_id = Some(id);
                    let _ = effects.push(Effect::Transmit(motion.directive));
                    let _ = effects.push(Effect::Wait {
                        id,
                        duration_ms: motion.duration_ms,
                    });
                    return;
                }
                Ok(Op::Confirm(prompt)) => {
                    if let Err(err) = self.tracker.await_confirmation(prompt) {
                        self.fail(job, err.into(), effects);
                        return;
                    }
                    let _ = effects.push(Effect::Prompt(prompt));
                    return;
                }
                Ok(Op::Tally) => {
                    let marbles = self.counters.tally();
                    info!("Marble dumped ({} in bin)", marbles);
                }
                Ok(Op::ClearQueue) => {
                    self.queue.clear();
                    info!("Route queue cleared");
                }
                Ok(Op::Done) => {
                    self.job = None;
                    self.supervisor.release();
                    let _ = effects.push(Effect::Finished(job));
                    return;
                }
                Err(err) => {
                    self.fail(job, err, effects);
                    return;
                }
            }
        }
    }

    fn fail(&mut self, job: Job, err: SequenceError, effects: &mut Effects) {
        self.job = None;
        self.tracker.abort();
        self.supervisor.release();
        let _ = effects.push(Effect::Failed(job, err));
    }

    fn emergency_stop(&mut self, effects: &mut Effects) {
        let halt = self.supervisor.emergency_stop();
        self.tracker.abort();
        // The last issued wait may still sit in the command queue
        let id = self
            .wait_id
            .take()
            .unwrap_or(self.next_wait_id.wrapping_sub(1));
        let _ = effects.push(Effect::Abort { id });
        for directive in halt {
            let _ = effects.push(Effect::Transmit(directive));
        }
        if let Some(sequencer) = self.job.take() {
            let _ = effects.push(Effect::Cancelled(sequencer.job()));
        }
        warn!("Emergency stop");
    }

    fn jog(&self, axis: Axis, fine: bool, forward: bool) -> Motion {
        let cal = &self.calibration;
        let (steps, duration_ms) = if fine {
            (
                cal.fine_steps(axis),
                cal.transit_ms(axis, 1) / cal.fine_divisor.max(1),
            )
        } else {
            (cal.cell_steps(axis), cal.transit_ms(axis, 1))
        };
        let steps = if forward { steps } else { -steps };
        Motion::untracked(Directive::Travel { axis, steps }, duration_ms)
    }

    fn trim(&self, motor: TrimMotor, forward: bool) -> Motion {
        let cal = &self.calibration;
        let steps = cal.fine_steps(Axis::Vertical);
        let steps = if forward { steps } else { -steps };
        Motion::untracked(
            Directive::Trim { motor, steps },
            cal.transit_ms(Axis::Vertical, 1) / cal.fine_divisor.max(1),
        )
    }
}

#[cfg(test)]
impl Controller {
    pub fn position(&self) -> Position {
        self.tracker.position()
    }

    pub fn counters(&self) -> MarbleCounters {
        self.counters
    }

    pub fn queue(&self) -> &RouteQueue {
        &self.queue
    }

    pub fn builder(&self) -> &RouteBuilder {
        &self.builder
    }

    pub fn safety(&self) -> SafetyState {
        self.supervisor.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canicas_core::motion::MoveError;
    use canicas_core::safety::SafetyError;
    use canicas_core::scheduler::{QueueError, RouteError};

    /// Play the motion task and the operator until the job settles
    ///
    /// Every wait completes and every prompt is confirmed. Returns all
    /// transmitted directives and the final effect.
    fn drive(controller: &mut Controller, effects: Effects) -> (std::vec::Vec<Directive>, Effect) {
        let mut sent = std::vec::Vec::new();
        let mut pending: std::vec::Vec<Effect> = effects.into_iter().collect();
        for _ in 0..128 {
            let Some(effect) = (!pending.is_empty()).then(|| pending.remove(0)) else {
                panic!("job stalled");
            };
            match effect {
                Effect::Transmit(directive) => sent.push(directive),
                Effect::Wait { id, .. } => pending.extend(controller.handle_motion_report(
                    MotionReport {
                        id,
                        outcome: MotionOutcome::Completed,
                    },
                )),
                Effect::Prompt(_) => {
                    pending.extend(controller.handle_request(Request::Confirm).unwrap())
                }
                Effect::Abort { .. } => {}
                done => return (sent, done),
            }
        }
        panic!("job did not finish");
    }

    fn on_screen(screen: Screen) -> Controller {
        let mut controller = Controller::new(Calibration::new());
        controller.handle_request(Request::Open(screen)).unwrap();
        controller
    }

    fn save_route(controller: &mut Controller, origin: Zone, path: &[Zone]) {
        controller.handle_request(Request::Origin(origin)).unwrap();
        for &zone in path {
            controller.handle_request(Request::Append(zone)).unwrap();
        }
        controller.handle_request(Request::Save).unwrap();
    }

    #[test]
    fn test_programmed_run_dumps_and_returns_home() {
        let mut controller = on_screen(Screen::Programmed);
        save_route(
            &mut controller,
            Zone::S1,
            &[Zone::T1, Zone::T4, Zone::T7, Zone::Destination],
        );
        assert_eq!(controller.queue().len(), 1);

        let effects = controller.handle_request(Request::Run).unwrap();
        assert!(controller.safety().busy);
        let (sent, last) = drive(&mut controller, effects);

        assert_eq!(last, Effect::Finished(Job::Run));
        assert_eq!(controller.position().zone, Zone::S1);
        assert_eq!(controller.counters().marbles, 1);
        assert!(!controller.safety().busy);
        assert!(sent.contains(&Directive::Servo(25)));
        assert!(sent.contains(&Directive::Servo(65)));
        assert_eq!(
            sent.first(),
            Some(&Directive::Travel {
                axis: Axis::Vertical,
                steps: -1328
            })
        );
    }

    #[test]
    fn test_run_with_empty_queue_is_refused() {
        let mut controller = on_screen(Screen::Programmed);
        assert_eq!(
            controller.handle_request(Request::Run),
            Err(ControlError::Sequence(SequenceError::EmptyQueue))
        );
        assert!(!controller.safety().busy);
    }

    #[test]
    fn test_invalid_append_leaves_path() {
        let mut controller = on_screen(Screen::Programmed);
        assert_eq!(
            controller.handle_request(Request::Append(Zone::T4)),
            Err(ControlError::Route(RouteError::Move(MoveError::NotAdjacent)))
        );
        assert_eq!(controller.builder().len(), 1);
        assert_eq!(controller.builder().origin(), Zone::S1);
    }

    #[test]
    fn test_queue_overwrites_same_origin() {
        let mut controller = on_screen(Screen::Programmed);
        let to_destination = |top: Zone, mid: Zone, low: Zone| [top, mid, low, Zone::Destination];
        save_route(&mut controller, Zone::S1, &to_destination(Zone::T1, Zone::T4, Zone::T7));
        save_route(&mut controller, Zone::S2, &to_destination(Zone::T2, Zone::T5, Zone::T8));
        save_route(&mut controller, Zone::S3, &to_destination(Zone::T3, Zone::T6, Zone::T9));
        assert_eq!(controller.queue().len(), 3);

        save_route(
            &mut controller,
            Zone::S2,
            &[Zone::T2, Zone::T1, Zone::T4, Zone::T7, Zone::Destination],
        );
        assert_eq!(controller.queue().len(), 3);
        let replaced = controller.queue().get(1).unwrap();
        assert_eq!(replaced.origin, Zone::S2);
        assert_eq!(replaced.path.len(), 5);
    }

    #[test]
    fn test_queue_edits_and_bad_index() {
        let mut controller = on_screen(Screen::Programmed);
        save_route(&mut controller, Zone::S1, &[Zone::T1, Zone::T4, Zone::T7, Zone::Destination]);
        save_route(&mut controller, Zone::S3, &[Zone::T3, Zone::T6, Zone::T9, Zone::Destination]);
        controller
            .handle_request(Request::Reorder(1, Shift::Earlier))
            .unwrap();
        assert_eq!(controller.queue().get(0).unwrap().origin, Zone::S3);
        assert_eq!(
            controller.handle_request(Request::Remove(5)),
            Err(ControlError::Queue(QueueError::IndexOutOfRange))
        );
        controller.handle_request(Request::Remove(0)).unwrap();
        assert_eq!(controller.queue().len(), 1);
    }

    #[test]
    fn test_requests_gated_by_screen() {
        let mut controller = Controller::new(Calibration::new());
        assert_eq!(
            controller.handle_request(Request::Step(Direction::Down)),
            Err(ControlError::NotOnScreen(Screen::MainMenu))
        );
        controller.handle_request(Request::Open(Screen::Manual)).unwrap();
        assert_eq!(
            controller.handle_request(Request::Append(Zone::T1)),
            Err(ControlError::NotOnScreen(Screen::Manual))
        );
        assert_eq!(
            controller.handle_request(Request::HomeHere),
            Err(ControlError::NotOnScreen(Screen::Manual))
        );
    }

    #[test]
    fn test_manual_steps_into_destination() {
        let mut controller = on_screen(Screen::Manual);
        for expected in [Zone::T1, Zone::T4, Zone::T7] {
            let effects = controller.handle_request(Request::Step(Direction::Down)).unwrap();
            let (_, last) = drive(&mut controller, effects);
            assert_eq!(last, Effect::Finished(Job::Step(expected)));
            assert_eq!(controller.position().zone, expected);
        }
        let effects = controller.handle_request(Request::Step(Direction::Down)).unwrap();
        let (sent, last) = drive(&mut controller, effects);
        assert_eq!(last, Effect::Finished(Job::Step(Zone::Destination)));
        assert_eq!(controller.position().zone, Zone::S1);
        assert_eq!(controller.counters().marbles, 1);
        assert!(sent.contains(&Directive::Servo(25)));
    }

    #[test]
    fn test_manual_step_column_limit() {
        let mut controller = on_screen(Screen::Manual);
        assert_eq!(
            controller.handle_request(Request::Step(Direction::Left)),
            Err(ControlError::Move(MoveError::ColumnLimit))
        );
        assert!(!controller.safety().busy);
    }

    #[test]
    fn test_second_job_refused_while_busy() {
        let mut controller = on_screen(Screen::Manual);
        let effects = controller.handle_request(Request::Step(Direction::Down)).unwrap();
        assert!(matches!(effects[1], Effect::Wait { id: 1, .. }));
        assert_eq!(
            controller.handle_request(Request::Step(Direction::Down)),
            Err(ControlError::Safety(SafetyError::Busy))
        );
        assert_eq!(
            controller.handle_request(Request::Open(Screen::Programmed)),
            Err(ControlError::JobRunning)
        );
    }

    #[test]
    fn test_emergency_stop_blocks_until_screen_entry() {
        let mut controller = on_screen(Screen::Manual);
        controller.handle_request(Request::Step(Direction::Down)).unwrap();

        let effects = controller.handle_request(Request::EmergencyStop).unwrap();
        assert_eq!(effects[0], Effect::Abort { id: 1 });
        assert_eq!(effects[1], Effect::Transmit(Directive::Brake(Axis::Horizontal)));
        assert_eq!(effects[2], Effect::Transmit(Directive::Brake(Axis::Vertical)));
        assert_eq!(effects[3], Effect::Transmit(Directive::Servo(65)));
        assert_eq!(effects[4], Effect::Cancelled(Job::Step(Zone::T1)));

        let safety = controller.safety();
        assert!(safety.emergency_stop);
        assert!(!safety.busy);

        // the aborted transit never lands
        let late = controller.handle_motion_report(MotionReport {
            id: 1,
            outcome: MotionOutcome::Completed,
        });
        assert!(late.is_empty());
        assert_eq!(controller.position().zone, Zone::S1);

        assert_eq!(
            controller.handle_request(Request::Step(Direction::Down)),
            Err(ControlError::Safety(SafetyError::EmergencyStop))
        );
        assert_eq!(
            controller.handle_request(Request::Reset),
            Err(ControlError::Safety(SafetyError::EmergencyStop))
        );

        controller.handle_request(Request::Open(Screen::Manual)).unwrap();
        assert!(!controller.safety().emergency_stop);
        let effects = controller.handle_request(Request::Step(Direction::Down)).unwrap();
        assert!(matches!(effects[1], Effect::Wait { id: 2, .. }));
    }

    #[test]
    fn test_emergency_stop_cancels_confirmation_wait() {
        let mut controller = on_screen(Screen::Programmed);
        save_route(&mut controller, Zone::S1, &[Zone::T1, Zone::T4, Zone::T7, Zone::Destination]);
        let effects = controller.handle_request(Request::Run).unwrap();
        assert_eq!(effects[0], Effect::Prompt(Prompt::LoadMarble(Zone::S1)));

        controller.handle_request(Request::EmergencyStop).unwrap();
        assert_eq!(
            controller.handle_request(Request::Confirm),
            Err(ControlError::Motion(MotionError::NotAwaiting))
        );
        assert_eq!(controller.job(), None);
    }

    #[test]
    fn test_reset_descends_and_clears_queue() {
        let mut controller = on_screen(Screen::Programmed);
        save_route(&mut controller, Zone::S1, &[Zone::T1, Zone::T4, Zone::T7, Zone::Destination]);
        controller.handle_request(Request::Open(Screen::Manual)).unwrap();
        let effects = controller.handle_request(Request::Step(Direction::Down)).unwrap();
        drive(&mut controller, effects);
        assert_eq!(controller.position().zone, Zone::T1);

        let effects = controller.handle_request(Request::Reset).unwrap();
        assert_eq!(
            effects[0],
            Effect::Transmit(Directive::Travel {
                axis: Axis::Vertical,
                steps: -3 * 1328
            })
        );
        assert_eq!(effects[1], Effect::Wait { id: 2, duration_ms: 9_000 });

        let (_, last) = drive(&mut controller, effects);
        assert_eq!(last, Effect::Finished(Job::Reset));
        assert_eq!(controller.position().zone, Zone::S1);
        assert!(controller.queue().is_empty());
        assert_eq!(controller.counters().marbles, 0);
    }

    #[test]
    fn test_reset_from_top_row_skips_descent() {
        let mut controller = on_screen(Screen::Programmed);
        save_route(&mut controller, Zone::S2, &[Zone::T2, Zone::T5, Zone::T8, Zone::Destination]);

        let effects = controller.handle_request(Request::Reset).unwrap();
        assert_eq!(effects[0], Effect::Finished(Job::Reset));
        assert_eq!(controller.position().zone, Zone::S1);
        assert!(controller.queue().is_empty());
        assert!(!controller.safety().busy);
    }

    #[test]
    fn test_emergency_stop_targets_last_issued_wait() {
        let mut controller = on_screen(Screen::Manual);
        let effects = controller.handle_request(Request::Step(Direction::Down)).unwrap();
        drive(&mut controller, effects);
        controller.handle_request(Request::Step(Direction::Down)).unwrap();

        // wait 2 is pending, maybe still queued for the motion task
        let effects = controller.handle_request(Request::EmergencyStop).unwrap();
        assert_eq!(effects[0], Effect::Abort { id: 2 });

        // with nothing pending the abort still covers every issued wait
        controller.handle_request(Request::Open(Screen::Manual)).unwrap();
        let effects = controller.handle_request(Request::EmergencyStop).unwrap();
        assert_eq!(effects[0], Effect::Abort { id: 2 });
    }

    #[test]
    fn test_go_to_requires_start_slot() {
        let mut controller = on_screen(Screen::Manual);
        assert_eq!(
            controller.handle_request(Request::GoTo(Zone::T5)),
            Err(ControlError::Motion(MotionError::InvalidTarget))
        );
        let effects = controller.handle_request(Request::GoTo(Zone::S3)).unwrap();
        let (sent, last) = drive(&mut controller, effects);
        assert_eq!(last, Effect::Finished(Job::Return(Zone::S3)));
        assert_eq!(controller.position().zone, Zone::S3);
        assert_eq!(sent.len(), 2);
    }

    #[test]
    fn test_calibration_jog_keeps_position() {
        let mut controller = on_screen(Screen::Calibration);
        let effects = controller
            .handle_request(Request::Jog {
                axis: Axis::Horizontal,
                fine: true,
                forward: false,
            })
            .unwrap();
        assert_eq!(
            effects[0],
            Effect::Transmit(Directive::Travel {
                axis: Axis::Horizontal,
                steps: -190
            })
        );
        assert_eq!(effects[1], Effect::Wait { id: 1, duration_ms: 375 });
        let (_, last) = drive(&mut controller, effects);
        assert!(matches!(last, Effect::Finished(Job::Jog(_))));
        assert_eq!(controller.position(), Position::default());

        let effects = controller
            .handle_request(Request::Trim {
                motor: TrimMotor::Left,
                forward: true,
            })
            .unwrap();
        assert_eq!(
            effects[0],
            Effect::Transmit(Directive::Trim {
                motor: TrimMotor::Left,
                steps: 166
            })
        );
    }

    #[test]
    fn test_home_here_resets_column() {
        let mut controller = on_screen(Screen::Calibration);
        controller.handle_request(Request::HomeHere).unwrap();
        assert_eq!(controller.position(), Position::new(Zone::S1, 0));
    }

    #[test]
    fn test_entering_programmed_restarts_builder() {
        let mut controller = on_screen(Screen::Programmed);
        controller.handle_request(Request::Origin(Zone::S3)).unwrap();
        controller.handle_request(Request::Append(Zone::T3)).unwrap();
        controller.handle_request(Request::Back).unwrap();
        controller.handle_request(Request::Open(Screen::Programmed)).unwrap();
        assert_eq!(controller.builder().origin(), Zone::S1);
        assert_eq!(controller.builder().len(), 1);
    }

    #[test]
    fn test_telemetry_updates_snapshot() {
        let mut controller = Controller::new(Calibration::new());
        let frame = TelemetryFrame::parse("#IN,4,1,3").unwrap();
        controller.handle_telemetry(&frame);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.counters.marbles, 3);
        assert_eq!(snapshot.counters.entries, 4);
        let text = std::format!("{}", snapshot);
        assert!(text.contains("marbles:   3 (entries 4, exits 1)"));
        assert!(text.contains("queue:     empty"));
    }
}
