//! Operator route builder
//!
//! A route starts at a start slot and grows one validated cell at a time
//! until it reaches the Destination.

use heapless::Vec;

use crate::motion::validator::{validate, MoveError};
use crate::motion::zone::Zone;

/// Longest path a route can hold, origin excluded
///
/// A path that never revisits a cell visits at most every transit cell
/// plus the Destination.
pub const MAX_PATH_LEN: usize = 24;

/// Route builder errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouteError {
    /// Origin is not S1, S2 or S3
    NotStartSlot,
    /// Appended zone fails move validation
    Move(MoveError),
    /// Path already holds MAX_PATH_LEN zones
    PathFull,
    /// Path does not end at the Destination
    NotCommittable,
}

impl From<MoveError> for RouteError {
    fn from(err: MoveError) -> Self {
        RouteError::Move(err)
    }
}

impl core::fmt::Display for RouteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RouteError::NotStartSlot => f.write_str("route must start at S1, S2 or S3"),
            RouteError::Move(err) => write!(f, "{}", err),
            RouteError::PathFull => f.write_str("route is too long"),
            RouteError::NotCommittable => f.write_str("route must end at Destination"),
        }
    }
}

impl core::error::Error for RouteError {}

/// A committed route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Start slot the marble is loaded at
    pub origin: Zone,
    /// Zones visited after the origin, ending at the Destination
    pub path: Vec<Zone, MAX_PATH_LEN>,
}

impl Route {
    /// Zone the route step at `index` moves from
    pub fn step_origin(&self, index: usize) -> Zone {
        match index {
            0 => self.origin,
            i => self.path.get(i - 1).copied().unwrap_or(self.origin),
        }
    }
}

impl core::fmt::Display for Route {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.origin)?;
        for zone in &self.path {
            write!(f, " -> {}", zone)?;
        }
        Ok(())
    }
}

/// Builds a route one zone at a time
#[derive(Debug, Clone)]
pub struct RouteBuilder {
    origin: Zone,
    path: Vec<Zone, MAX_PATH_LEN>,
}

impl Default for RouteBuilder {
    fn default() -> Self {
        Self {
            origin: Zone::S1,
            path: Vec::new(),
        }
    }
}

impl RouteBuilder {
    /// Start a new path at `origin`
    pub fn new(origin: Zone) -> Result<Self, RouteError> {
        if !origin.is_start() {
            return Err(RouteError::NotStartSlot);
        }
        Ok(Self {
            origin,
            path: Vec::new(),
        })
    }

    pub fn origin(&self) -> Zone {
        self.origin
    }

    /// Zones after the origin
    pub fn path(&self) -> &[Zone] {
        &self.path
    }

    /// Path length, origin included
    pub fn len(&self) -> usize {
        self.path.len() + 1
    }

    /// Always false: the origin is part of the path
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Last zone of the path
    pub fn last(&self) -> Zone {
        self.path.last().copied().unwrap_or(self.origin)
    }

    /// Append a zone, validated against the last one
    ///
    /// A rejected append leaves the path unchanged.
    pub fn append(&mut self, zone: Zone) -> Result<(), RouteError> {
        validate(self.last(), zone)?;
        self.path.push(zone).map_err(|_| RouteError::PathFull)
    }

    /// Drop the last zone; the origin is never removed
    pub fn undo(&mut self) -> Option<Zone> {
        self.path.pop()
    }

    /// Check if the path ends at the Destination
    pub fn is_committable(&self) -> bool {
        self.path.last() == Some(&Zone::Destination)
    }

    /// Produce the finished route
    pub fn commit(&self) -> Result<Route, RouteError> {
        if !self.is_committable() {
            return Err(RouteError::NotCommittable);
        }
        Ok(Route {
            origin: self.origin,
            path: self.path.clone(),
        })
    }

    /// Change the origin, restarting the path
    pub fn restart(&mut self, origin: Zone) -> Result<(), RouteError> {
        *self = Self::new(origin)?;
        Ok(())
    }

    /// Keep the origin, drop every appended zone
    pub fn clear(&mut self) {
        self.path.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(origin: Zone, zones: &[Zone]) -> RouteBuilder {
        let mut builder = RouteBuilder::new(origin).unwrap();
        for &zone in zones {
            builder.append(zone).unwrap();
        }
        builder
    }

    #[test]
    fn test_build_and_commit() {
        let builder = build(
            Zone::S1,
            &[Zone::T1, Zone::T4, Zone::T7, Zone::Destination],
        );
        assert!(builder.is_committable());
        let route = builder.commit().unwrap();
        assert_eq!(route.origin, Zone::S1);
        assert_eq!(route.path.len(), 4);
        assert_eq!(route.step_origin(0), Zone::S1);
        assert_eq!(route.step_origin(3), Zone::T7);
    }

    #[test]
    fn test_rejected_append_leaves_path() {
        let mut builder = RouteBuilder::new(Zone::S1).unwrap();
        assert_eq!(
            builder.append(Zone::T4),
            Err(RouteError::Move(MoveError::NotAdjacent))
        );
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.last(), Zone::S1);
    }

    #[test]
    fn test_undo_never_drops_origin() {
        let mut builder = build(Zone::S2, &[Zone::T2]);
        assert_eq!(builder.undo(), Some(Zone::T2));
        assert_eq!(builder.undo(), None);
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.origin(), Zone::S2);
    }

    #[test]
    fn test_commit_requires_destination() {
        let builder = build(Zone::S3, &[Zone::T3, Zone::T6]);
        assert!(!builder.is_committable());
        assert_eq!(builder.commit(), Err(RouteError::NotCommittable));
        let bare = RouteBuilder::new(Zone::S3).unwrap();
        assert_eq!(bare.commit(), Err(RouteError::NotCommittable));
    }

    #[test]
    fn test_restart_changes_origin() {
        let mut builder = build(Zone::S1, &[Zone::T1, Zone::T2]);
        builder.restart(Zone::S3).unwrap();
        assert_eq!(builder.origin(), Zone::S3);
        assert!(builder.path().is_empty());
        assert_eq!(builder.restart(Zone::T5), Err(RouteError::NotStartSlot));
        assert_eq!(builder.origin(), Zone::S3);
    }

    #[test]
    fn test_lateral_wandering_until_full() {
        let mut builder = RouteBuilder::new(Zone::S1).unwrap();
        builder.append(Zone::T1).unwrap();
        for i in 1..MAX_PATH_LEN {
            let next = if i % 2 == 1 { Zone::T2 } else { Zone::T1 };
            builder.append(next).unwrap();
        }
        assert_eq!(builder.append(Zone::T1), Err(RouteError::PathFull));
        assert_eq!(builder.len(), MAX_PATH_LEN + 1);
    }

    #[test]
    fn test_display() {
        let route = build(Zone::S1, &[Zone::T1, Zone::T4, Zone::T7, Zone::Destination])
            .commit()
            .unwrap();
        assert_eq!(
            std::format!("{}", route),
            "S1 -> 1 -> 4 -> 7 -> Destination"
        );
    }
}
