//! Loaded move validation
//!
//! A loaded carrier may only travel one cell at a time, never upward, and
//! may only enter the Destination from the bottom transit row. The unloaded
//! safe-return maneuver does not go through this module.

use super::zone::{departure_coordinate, GridCoordinate, Zone, COLUMNS, DESTINATION_ROW};
use crate::motion::position::Position;

/// Reasons a move is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveError {
    /// Destination entered from outside row 3
    DestinationNotFed,
    /// Target is not one orthogonal cell away
    NotAdjacent,
    /// Target is above the origin
    Ascent,
    /// Lateral step past the grid edge
    ColumnLimit,
    /// No zone in that direction
    NoZone,
}

impl core::fmt::Display for MoveError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            MoveError::DestinationNotFed => "Destination reachable only from row 3",
            MoveError::NotAdjacent => "not adjacent",
            MoveError::Ascent => "cannot ascend while loaded",
            MoveError::ColumnLimit => "column limit",
            MoveError::NoZone => "no zone in that direction",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for MoveError {}

/// Validate a loaded single-cell move
pub fn validate(origin: Zone, destination: Zone) -> Result<(), MoveError> {
    if destination == Zone::Destination {
        return if origin.feeds_destination() {
            Ok(())
        } else {
            Err(MoveError::DestinationNotFed)
        };
    }

    let from = origin.coordinate();
    let to = destination.coordinate();
    if from.manhattan(to) != 1 {
        return Err(MoveError::NotAdjacent);
    }
    if to.row < from.row {
        return Err(MoveError::Ascent);
    }
    Ok(())
}

/// Manual step direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Left,
    Right,
    Down,
}

/// Zone one manual step away from the carrier
///
/// Uses the effective coordinate, so Destination steps from its virtual
/// column. The result still has to pass [`validate`].
pub fn step_target(position: &Position, direction: Direction) -> Result<Zone, MoveError> {
    let here = departure_coordinate(position.zone, position.destination_column);
    let next = match direction {
        Direction::Left => {
            if here.column == 0 {
                return Err(MoveError::ColumnLimit);
            }
            GridCoordinate::new(here.row, here.column - 1)
        }
        Direction::Right => {
            if here.column + 1 >= COLUMNS {
                return Err(MoveError::ColumnLimit);
            }
            GridCoordinate::new(here.row, here.column + 1)
        }
        Direction::Down => {
            if here.row >= DESTINATION_ROW {
                return Err(MoveError::NoZone);
            }
            GridCoordinate::new(here.row + 1, here.column)
        }
    };
    Zone::at(next).ok_or(MoveError::NoZone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zone() -> impl Strategy<Value = Zone> {
        (0..Zone::ALL.len()).prop_map(|i| Zone::ALL[i])
    }

    #[test]
    fn test_descend_and_lateral_accepted() {
        assert_eq!(validate(Zone::S1, Zone::T1), Ok(()));
        assert_eq!(validate(Zone::T4, Zone::T5), Ok(()));
        assert_eq!(validate(Zone::T6, Zone::T5), Ok(()));
        assert_eq!(validate(Zone::T8, Zone::Destination), Ok(()));
    }

    #[test]
    fn test_skip_and_diagonal_rejected() {
        assert_eq!(validate(Zone::S1, Zone::T4), Err(MoveError::NotAdjacent));
        assert_eq!(validate(Zone::T1, Zone::T5), Err(MoveError::NotAdjacent));
        assert_eq!(validate(Zone::T1, Zone::T1), Err(MoveError::NotAdjacent));
    }

    #[test]
    fn test_ascent_rejected() {
        assert_eq!(validate(Zone::T4, Zone::T1), Err(MoveError::Ascent));
        assert_eq!(validate(Zone::T1, Zone::S1), Err(MoveError::Ascent));
    }

    #[test]
    fn test_destination_only_from_bottom_row() {
        assert_eq!(
            validate(Zone::T5, Zone::Destination),
            Err(MoveError::DestinationNotFed)
        );
        assert_eq!(
            validate(Zone::Destination, Zone::Destination),
            Err(MoveError::DestinationNotFed)
        );
        assert_eq!(validate(Zone::Destination, Zone::T8), Err(MoveError::Ascent));
    }

    #[test]
    fn test_step_targets() {
        let at = |zone| Position::new(zone, 1);
        assert_eq!(step_target(&at(Zone::S1), Direction::Down), Ok(Zone::T1));
        assert_eq!(
            step_target(&at(Zone::S1), Direction::Left),
            Err(MoveError::ColumnLimit)
        );
        assert_eq!(
            step_target(&at(Zone::T9), Direction::Right),
            Err(MoveError::ColumnLimit)
        );
        assert_eq!(step_target(&at(Zone::T5), Direction::Right), Ok(Zone::T6));
        assert_eq!(
            step_target(&at(Zone::T7), Direction::Down),
            Ok(Zone::Destination)
        );
        assert_eq!(
            step_target(&at(Zone::Destination), Direction::Down),
            Err(MoveError::NoZone)
        );
    }

    proptest! {
        #[test]
        fn prop_validate_matches_grid_rules(origin in zone(), destination in zone()) {
            let from = origin.coordinate();
            let to = destination.coordinate();
            let expected = if destination == Zone::Destination {
                matches!(origin, Zone::T7 | Zone::T8 | Zone::T9)
            } else {
                from.manhattan(to) == 1 && to.row >= from.row
            };
            prop_assert_eq!(validate(origin, destination).is_ok(), expected);
        }
    }
}
