//! Zone graph model
//!
//! The carrier moves over a fixed grid:
//!
//! ```text
//!          col 0   col 1   col 2
//! row 0     S1      S2      S3      start slots
//! row 1     1       2       3
//! row 2     4       5       6       transit cells
//! row 3     7       8       9
//! row 4        Destination          drop point, virtual column
//! ```
//!
//! Destination spans the bottom row. Its effective column is the column of
//! the cell that fed it, recorded in the carrier position on arrival.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of grid rows, Destination row included
pub const ROWS: u8 = 5;

/// Number of grid columns
pub const COLUMNS: u8 = 3;

/// Row index of the Destination
pub const DESTINATION_ROW: u8 = 4;

/// Column the safe-return maneuver ascends in
pub const HOME_COLUMN: u8 = 0;

/// Nominal Destination column, used before any arrival recorded one
pub const NOMINAL_DESTINATION_COLUMN: u8 = 1;

/// A named grid location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Zone {
    S1,
    S2,
    S3,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    T8,
    T9,
    Destination,
}

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GridCoordinate {
    pub row: u8,
    pub column: u8,
}

impl GridCoordinate {
    pub const fn new(row: u8, column: u8) -> Self {
        Self { row, column }
    }

    /// Manhattan distance to another coordinate
    pub const fn manhattan(self, other: GridCoordinate) -> u8 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }
}

impl Zone {
    /// Every zone, in grid order
    pub const ALL: [Zone; 13] = [
        Zone::S1,
        Zone::S2,
        Zone::S3,
        Zone::T1,
        Zone::T2,
        Zone::T3,
        Zone::T4,
        Zone::T5,
        Zone::T6,
        Zone::T7,
        Zone::T8,
        Zone::T9,
        Zone::Destination,
    ];

    /// Start slots a route may begin at
    pub const START_SLOTS: [Zone; 3] = [Zone::S1, Zone::S2, Zone::S3];

    /// Nominal coordinate (Destination reports its nominal column)
    pub const fn coordinate(self) -> GridCoordinate {
        let (row, column) = match self {
            Zone::S1 => (0, 0),
            Zone::S2 => (0, 1),
            Zone::S3 => (0, 2),
            Zone::T1 => (1, 0),
            Zone::T2 => (1, 1),
            Zone::T3 => (1, 2),
            Zone::T4 => (2, 0),
            Zone::T5 => (2, 1),
            Zone::T6 => (2, 2),
            Zone::T7 => (3, 0),
            Zone::T8 => (3, 1),
            Zone::T9 => (3, 2),
            Zone::Destination => (DESTINATION_ROW, NOMINAL_DESTINATION_COLUMN),
        };
        GridCoordinate::new(row, column)
    }

    /// Zone at a coordinate (any bottom-row column is Destination)
    pub const fn at(coordinate: GridCoordinate) -> Option<Zone> {
        if coordinate.column >= COLUMNS {
            return None;
        }
        let zone = match (coordinate.row, coordinate.column) {
            (0, 0) => Zone::S1,
            (0, 1) => Zone::S2,
            (0, _) => Zone::S3,
            (1, 0) => Zone::T1,
            (1, 1) => Zone::T2,
            (1, _) => Zone::T3,
            (2, 0) => Zone::T4,
            (2, 1) => Zone::T5,
            (2, _) => Zone::T6,
            (3, 0) => Zone::T7,
            (3, 1) => Zone::T8,
            (3, _) => Zone::T9,
            (DESTINATION_ROW, _) => Zone::Destination,
            _ => return None,
        };
        Some(zone)
    }

    /// Start slot above a column
    pub const fn top_row(column: u8) -> Option<Zone> {
        Zone::at(GridCoordinate::new(0, column))
    }

    /// Check if this is a start slot
    pub const fn is_start(self) -> bool {
        matches!(self, Zone::S1 | Zone::S2 | Zone::S3)
    }

    /// Check if Destination can be entered from this zone
    pub const fn feeds_destination(self) -> bool {
        matches!(self, Zone::T7 | Zone::T8 | Zone::T9)
    }

    /// Operator-facing label
    pub const fn label(self) -> &'static str {
        match self {
            Zone::S1 => "S1",
            Zone::S2 => "S2",
            Zone::S3 => "S3",
            Zone::T1 => "1",
            Zone::T2 => "2",
            Zone::T3 => "3",
            Zone::T4 => "4",
            Zone::T5 => "5",
            Zone::T6 => "6",
            Zone::T7 => "7",
            Zone::T8 => "8",
            Zone::T9 => "9",
            Zone::Destination => "Destination",
        }
    }

    /// Parse an operator label (`S1`, `7`, `D`, `Destination`; any case)
    pub fn from_label(label: &str) -> Option<Zone> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("d") || label.eq_ignore_ascii_case("destination") {
            return Some(Zone::Destination);
        }
        Zone::ALL
            .iter()
            .copied()
            .find(|zone| zone.label().eq_ignore_ascii_case(label))
    }
}

impl core::fmt::Display for Zone {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Coordinate of a zone the carrier departs from
///
/// Departing Destination uses the recorded virtual column.
pub const fn departure_coordinate(zone: Zone, destination_column: u8) -> GridCoordinate {
    match zone {
        Zone::Destination => GridCoordinate::new(DESTINATION_ROW, destination_column),
        other => other.coordinate(),
    }
}

/// Coordinate of a zone the carrier arrives at from `from`
///
/// Arriving at Destination keeps the departing column.
pub const fn arrival_coordinate(zone: Zone, from: GridCoordinate) -> GridCoordinate {
    match zone {
        Zone::Destination => GridCoordinate::new(DESTINATION_ROW, from.column),
        other => other.coordinate(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        assert_eq!(Zone::S1.coordinate(), GridCoordinate::new(0, 0));
        assert_eq!(Zone::T5.coordinate(), GridCoordinate::new(2, 1));
        assert_eq!(Zone::T9.coordinate(), GridCoordinate::new(3, 2));
        assert_eq!(Zone::Destination.coordinate(), GridCoordinate::new(4, 1));
    }

    #[test]
    fn test_at_inverts_coordinate() {
        for zone in Zone::ALL {
            assert_eq!(Zone::at(zone.coordinate()), Some(zone));
        }
        assert_eq!(Zone::at(GridCoordinate::new(4, 2)), Some(Zone::Destination));
        assert_eq!(Zone::at(GridCoordinate::new(5, 0)), None);
        assert_eq!(Zone::at(GridCoordinate::new(1, 3)), None);
    }

    #[test]
    fn test_destination_virtual_column() {
        assert_eq!(
            departure_coordinate(Zone::Destination, 2),
            GridCoordinate::new(4, 2)
        );
        let from = Zone::T7.coordinate();
        assert_eq!(
            arrival_coordinate(Zone::Destination, from),
            GridCoordinate::new(4, 0)
        );
        assert_eq!(departure_coordinate(Zone::T4, 2), Zone::T4.coordinate());
    }

    #[test]
    fn test_labels() {
        for zone in Zone::ALL {
            assert_eq!(Zone::from_label(zone.label()), Some(zone));
        }
        assert_eq!(Zone::from_label("s2"), Some(Zone::S2));
        assert_eq!(Zone::from_label("D"), Some(Zone::Destination));
        assert_eq!(Zone::from_label("10"), None);
        assert_eq!(Zone::from_label(""), None);
    }

    #[test]
    fn test_top_row() {
        assert_eq!(Zone::top_row(0), Some(Zone::S1));
        assert_eq!(Zone::top_row(2), Some(Zone::S3));
        assert_eq!(Zone::top_row(3), None);
    }
}
