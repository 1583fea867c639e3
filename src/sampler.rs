//! Fixed-distance sampling along a route
//!
//! Weather is queried at the route's start, at every multiple of the step
//! distance along the route, and at the route's end.

use crate::models::Coordinate;

/// Default distance between weather samples
pub const DEFAULT_STEP_KM: f64 = 35.0;

/// Sample points along `coordinates` every `step_km` kilometers.
///
/// The result starts with the first coordinate and ends with the last one. A
/// route shorter than one step (or a non-positive step) yields just the two
/// endpoints; an empty route yields nothing.
#[must_use]
pub fn sample_route(coordinates: &[Coordinate], step_km: f64) -> Vec<Coordinate> {
    let (Some(first), Some(last)) = (coordinates.first(), coordinates.last()) else {
        return Vec::new();
    };

    let mut samples = vec![*first];
    if step_km > 0.0 {
        let mut walker = RouteWalker::new(coordinates);
        let total_km = walker.total_km();
        let mut target_km = step_km;
        while target_km < total_km {
            if let Some(point) = walker.point_at(target_km) {
                samples.push(point);
            }
            target_km += step_km;
        }
    }
    samples.push(*last);
    samples
}

/// Total route length in kilometers
#[must_use]
pub fn route_length_km(coordinates: &[Coordinate]) -> f64 {
    coordinates
        .windows(2)
        .map(|pair| pair[0].distance_km(&pair[1]))
        .sum()
}

/// Walks a polyline forward, answering "where am I after `d` km"
struct RouteWalker<'a> {
    coordinates: &'a [Coordinate],
    /// Cumulative distance at each vertex
    cumulative_km: Vec<f64>,
    /// Segment the previous lookup ended in; targets only increase
    segment: usize,
}

impl<'a> RouteWalker<'a> {
    fn new(coordinates: &'a [Coordinate]) -> Self {
        let mut cumulative_km = Vec::with_capacity(coordinates.len());
        let mut travelled = 0.0;
        cumulative_km.push(travelled);
        for pair in coordinates.windows(2) {
            travelled += pair[0].distance_km(&pair[1]);
            cumulative_km.push(travelled);
        }

        Self {
            coordinates,
            cumulative_km,
            segment: 0,
        }
    }

    fn total_km(&self) -> f64 {
        self.cumulative_km.last().copied().unwrap_or(0.0)
    }

    fn point_at(&mut self, distance_km: f64) -> Option<Coordinate> {
        while self.segment + 1 < self.coordinates.len() {
            let start_km = self.cumulative_km[self.segment];
            let end_km = self.cumulative_km[self.segment + 1];
            if distance_km <= end_km {
                let length = end_km - start_km;
                let fraction = if length > 0.0 {
                    (distance_km - start_km) / length
                } else {
                    0.0
                };
                let from = &self.coordinates[self.segment];
                let to = &self.coordinates[self.segment + 1];
                return Some(from.lerp(to, fraction));
            }
            self.segment += 1;
        }
        None
    }
}
