//! Marker bookkeeping: arrival order and derived sizes.

use beacon_core::config::MarkerSizing;

use crate::message::{ClientId, Coordinate, Marker, MarkerMap};

/// Derived marker state owned by the registry.
///
/// The arrival sequence is append-only and only its length feeds the size
/// formula, so it is kept as a counter. The index of the entry appended by a
/// broadcast is 1-based and equals the counter after the append.
#[derive(Debug)]
pub(crate) struct MarkerBook {
    base_size: u64,
    sizing: MarkerSizing,
    arrivals: u64,
    ranked: u64,
    markers: MarkerMap,
}

impl MarkerBook {
    pub(crate) fn new(base_size: u64, sizing: MarkerSizing) -> Self {
        Self {
            base_size,
            sizing,
            arrivals: 0,
            ranked: 0,
            markers: MarkerMap::new(),
        }
    }

    /// Appends an arrival for `client_id` and stores its marker.
    /// Returns the size assigned.
    pub(crate) fn record(&mut self, client_id: ClientId, coordinate: Coordinate) -> u64 {
        self.arrivals += 1;

        let size = match self.sizing {
            MarkerSizing::PerMessage => self.base_size + self.arrivals,
            MarkerSizing::FirstArrival => match self.markers.get(&client_id) {
                Some(existing) => existing.size,
                None => {
                    self.ranked += 1;
                    self.base_size + self.ranked
                }
            },
        };

        self.markers.insert(client_id, Marker { coordinate, size });
        size
    }

    pub(crate) fn remove(&mut self, client_id: &ClientId) -> Option<Marker> {
        self.markers.remove(client_id)
    }

    pub(crate) fn clear(&mut self) {
        self.markers.clear();
    }

    pub(crate) fn snapshot(&self) -> MarkerMap {
        self.markers.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.markers.len()
    }

    pub(crate) fn arrivals(&self) -> u64 {
        self.arrivals
    }
}
