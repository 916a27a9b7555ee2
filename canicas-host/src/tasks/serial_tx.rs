//! Serial writer task
//!
//! Drains admitted directives into the link, in order.

use tracing::{error, info};

use canicas_core::traits::DirectiveLink;

use crate::channels::OUTBOUND;
use crate::link::HostLink;

/// Serial writer task
#[embassy_executor::task]
pub async fn serial_tx_task(mut link: HostLink) {
    info!(
        "Serial writer started ({})",
        if link.is_simulated() { "simulated" } else { "hardware" }
    );

    loop {
        let directive = OUTBOUND.receive().await;
        if let Err(e) = link.transmit(&directive) {
            error!("Failed to send {}: {}", directive, e);
        }
    }
}
