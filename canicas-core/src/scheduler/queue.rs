//! Route queue
//!
//! Holds at most one route per start slot, in execution order.

use heapless::Vec;

use super::builder::Route;

/// One route per start slot
pub const MAX_ROUTES: usize = 3;

/// Route queue errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QueueError {
    /// Every start slot already has a route
    Full,
    /// No route at that index
    IndexOutOfRange,
}

impl core::fmt::Display for QueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let reason = match self {
            QueueError::Full => "queue full",
            QueueError::IndexOutOfRange => "no route at that index",
        };
        f.write_str(reason)
    }
}

impl core::error::Error for QueueError {}

/// Where an added route ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Admission {
    /// New origin, appended at this index
    Appended(usize),
    /// Same origin already queued, overwritten at this index
    Replaced(usize),
}

/// Reorder direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shift {
    /// Toward the front of the queue
    Earlier,
    /// Toward the back of the queue
    Later,
}

/// Ordered routes awaiting execution
#[derive(Debug, Clone, Default)]
pub struct RouteQueue {
    routes: Vec<Route, MAX_ROUTES>,
}

impl RouteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, replacing any route with the same origin in place
    pub fn add(&mut self, route: Route) -> Result<Admission, QueueError> {
        if let Some(index) = self.routes.iter().position(|r| r.origin == route.origin) {
            self.routes[index] = route;
            return Ok(Admission::Replaced(index));
        }
        self.routes.push(route).map_err(|_| QueueError::Full)?;
        Ok(Admission::Appended(self.routes.len() - 1))
    }

    /// Swap a route with its neighbour; no-op at either end
    ///
    /// Returns the route's new index.
    pub fn reorder(&mut self, index: usize, shift: Shift) -> Result<usize, QueueError> {
        if index >= self.routes.len() {
            return Err(QueueError::IndexOutOfRange);
        }
        let target = match shift {
            Shift::Earlier if index > 0 => index - 1,
            Shift::Later if index + 1 < self.routes.len() => index + 1,
            _ => return Ok(index),
        };
        self.routes.swap(index, target);
        Ok(target)
    }

    /// Remove the route at `index`
    pub fn remove(&mut self, index: usize) -> Result<Route, QueueError> {
        if index >= self.routes.len() {
            return Err(QueueError::IndexOutOfRange);
        }
        Ok(self.routes.remove(index))
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Routes in execution order
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn get(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
