//! Safe-return maneuver
//!
//! The unloaded carrier is brought back to a start slot in two phases:
//! first straight up to the top row, then sideways along it. From the
//! Destination it shifts left to column 0 before climbing. Every transit
//! covers a single cell, so an interrupted return leaves a known zone.
//! This is the only place an ascent is planned, and it bypasses the
//! loaded-move validator.
//!
//! The maneuver is stateless: each call looks at the current position and
//! returns the next transit, or `None` once the target is reached.

use canicas_protocol::Axis;

use super::position::{Motion, MotionError, Position};
use super::zone::{departure_coordinate, GridCoordinate, Zone, DESTINATION_ROW, HOME_COLUMN};
use crate::config::Calibration;

/// Next transit toward a top-row `target`
pub fn next_transit(
    position: &Position,
    target: Zone,
    calibration: &Calibration,
) -> Result<Option<Motion>, MotionError> {
    if !target.is_start() {
        return Err(MotionError::InvalidTarget);
    }

    let here = departure_coordinate(position.zone, position.destination_column);

    if position.zone == Zone::Destination {
        let column = position.destination_column.min(2);
        if column > HOME_COLUMN {
            let directive = calibration
                .cells(Axis::Horizontal, -1)
                .map_err(|_| MotionError::Unreachable)?;
            return Ok(Some(Motion {
                directive,
                duration_ms: calibration.transit_ms(Axis::Horizontal, 1),
                arrival: Some(Position::new(Zone::Destination, column - 1)),
            }));
        }
        let bottom_left = GridCoordinate::new(DESTINATION_ROW, HOME_COLUMN);
        return climb(bottom_left, position, calibration).map(Some);
    }

    if here.row > 0 {
        return climb(here, position, calibration).map(Some);
    }

    let goal = target.coordinate().column;
    if here.column == goal {
        return Ok(None);
    }

    let (cells, column) = if goal > here.column {
        (1, here.column + 1)
    } else {
        (-1, here.column - 1)
    };
    let directive = calibration
        .cells(Axis::Horizontal, cells)
        .map_err(|_| MotionError::Unreachable)?;
    let zone = Zone::top_row(column).ok_or(MotionError::InvalidTarget)?;
    Ok(Some(Motion {
        directive,
        duration_ms: calibration.transit_ms(Axis::Horizontal, 1),
        arrival: Some(Position::new(zone, position.destination_column)),
    }))
}

/// Ascend one row straight up from `from`
fn climb(
    from: GridCoordinate,
    position: &Position,
    calibration: &Calibration,
) -> Result<Motion, MotionError> {
    let directive = calibration
        .cells(Axis::Vertical, 1)
        .map_err(|_| MotionError::Unreachable)?;
    let above = GridCoordinate::new(from.row.saturating_sub(1), from.column);
    let zone = Zone::at(above).ok_or(MotionError::InvalidTarget)?;
    Ok(Motion {
        directive,
        duration_ms: calibration.transit_ms(Axis::Vertical, 1),
        arrival: Some(Position::new(zone, position.destination_column)),
    })
}
