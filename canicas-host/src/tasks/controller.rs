//! Main controller task
//!
//! Owns the [`Controller`] and is the only place carrier state changes.
//! Waits on operator requests, motion reports and telemetry, then carries
//! out the resulting effects and publishes a fresh snapshot.

use embassy_futures::select::{select3, Either3};
use tracing::{debug, info, warn};

use canicas_core::config::Calibration;

use crate::channels::{
    publish_snapshot, MotionCommand, ABORT_MOTION, MOTION_CMD, MOTION_REPORT, OUTBOUND, REQUESTS,
    TELEMETRY,
};
use crate::controller::{Controller, Effect, Effects};

/// Controller task - main coordination loop
#[embassy_executor::task]
pub async fn controller_task(calibration: Calibration) {
    info!("Controller task started");

    let mut controller = Controller::new(calibration);
    publish_snapshot(controller.snapshot());

    loop {
        let effects = match select3(
            REQUESTS.receive(),
            MOTION_REPORT.receive(),
            TELEMETRY.receive(),
        )
        .await
        {
            Either3::First(request) => {
                debug!("Request: {:?}", request);
                match controller.handle_request(request) {
                    Ok(effects) => effects,
                    Err(e) => {
                        warn!("Refused {:?}: {}", request, e);
                        Effects::new()
                    }
                }
            }
            Either3::Second(report) => {
                debug!("Motion report: {:?}", report);
                controller.handle_motion_report(report)
            }
            Either3::Third(frame) => {
                controller.handle_telemetry(&frame);
                Effects::new()
            }
        };

        for effect in effects {
            dispatch(effect).await;
        }
        publish_snapshot(controller.snapshot());
    }
}

async fn dispatch(effect: Effect) {
    match effect {
        Effect::Transmit(directive) => OUTBOUND.send(directive).await,
        Effect::Wait { id, duration_ms } => MOTION_CMD.send(MotionCommand { id, duration_ms }).await,
        Effect::Abort { id } => ABORT_MOTION.signal(id),
        Effect::Prompt(prompt) => info!("Waiting: {}", prompt),
        Effect::Finished(job) => info!("Finished {:?}", job),
        Effect::Failed(job, e) => warn!("{:?} stopped: {}", job, e),
        Effect::Cancelled(job) => warn!("{:?} cancelled", job),
    }
}
