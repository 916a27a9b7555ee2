//! Zone transition to directive compilation

use canicas_protocol::{Axis, Directive};

use super::position::{Motion, MotionError, Position};
use super::zone::{arrival_coordinate, departure_coordinate, Zone};
use crate::config::Calibration;

/// Compile a transit between two zones into a single directive
///
/// Coordinates are effective ones: departing Destination uses
/// `destination_column`, arriving there keeps the departing column. Only
/// single-cell steps and multi-row descents have a directive.
pub fn compile(
    origin: Zone,
    destination: Zone,
    destination_column: u8,
    calibration: &Calibration,
) -> Option<Directive> {
    let from = departure_coordinate(origin, destination_column);
    let to = arrival_coordinate(destination, from);
    let rows = i32::from(to.row) - i32::from(from.row);
    let columns = i32::from(to.column) - i32::from(from.column);

    // Descending is negative on the vertical axis
    let (axis, cells) = match (rows, columns) {
        (r, 0) if r >= 1 => (Axis::Vertical, -r),
        (-1, 0) => (Axis::Vertical, 1),
        (0, 1) => (Axis::Horizontal, 1),
        (0, -1) => (Axis::Horizontal, -1),
        _ => return None,
    };
    calibration.cells(axis, cells).ok()
}

/// Plan a tracked transit from the current position
///
/// The wait scales with the number of cells crossed.
pub fn plan_transit(
    position: &Position,
    destination: Zone,
    calibration: &Calibration,
) -> Result<Motion, MotionError> {
    let directive = compile(
        position.zone,
        destination,
        position.destination_column,
        calibration,
    )
    .ok_or(MotionError::Unreachable)?;

    let from = departure_coordinate(position.zone, position.destination_column);
    let to = arrival_coordinate(destination, from);
    let (axis, cells) = match directive.axis() {
        Some(Axis::Horizontal) => (Axis::Horizontal, from.column.abs_diff(to.column)),
        _ => (Axis::Vertical, from.row.abs_diff(to.row)),
    };

    let destination_column = if destination == Zone::Destination {
        from.column
    } else {
        position.destination_column
    };

    Ok(Motion {
        directive,
        duration_ms: calibration.transit_ms(axis, cells),
        arrival: Some(Position::new(destination, destination_column)),
    })
}
