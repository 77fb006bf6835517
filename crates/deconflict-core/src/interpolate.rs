//! Continuous-time position lookup along a mission.

use crate::error::{DeconflictError, Result};
use crate::models::{Mission, Position, Waypoint};

/// Position of the drone flying `mission` at time `t`.
///
/// Queries outside the mission's time span are rejected, never extrapolated.
/// A query exactly at a waypoint timestamp returns that waypoint's position
/// unchanged.
pub fn position_at(mission: &Mission, t: f64) -> Result<Position> {
    check_in_span(mission, t)?;

    let waypoints = mission.waypoints();
    // First waypoint with time >= t. `t` is inside the span so idx is valid.
    let idx = waypoints.partition_point(|w| w.time < t);
    let upper = &waypoints[idx];
    if upper.time == t || idx == 0 {
        return Ok(upper.position);
    }
    Ok(blend(&waypoints[idx - 1], upper, t))
}

fn check_in_span(mission: &Mission, t: f64) -> Result<()> {
    let span = mission.time_span();
    // NaN fails `contains` as well.
    if span.contains(t) {
        Ok(())
    } else {
        Err(DeconflictError::OutOfRange {
            drone_id: mission.drone_id().to_string(),
            time: t,
            span,
        })
    }
}

/// Linear blend inside the segment `[from, to]`.
fn blend(from: &Waypoint, to: &Waypoint, t: f64) -> Position {
    if t == from.time {
        return from.position;
    }
    if t == to.time {
        return to.position;
    }
    let frac = (t - from.time) / (to.time - from.time);
    from.position.lerp(&to.position, frac)
}

/// Forward-only interpolator for monotonically increasing query times.
///
/// Remembers the current segment so a sweep over `n` sample times costs
/// `O(n + waypoints)` instead of a search per sample. Results are identical to
/// [`position_at`].
#[derive(Debug)]
pub struct SegmentCursor<'a> {
    mission: &'a Mission,
    index: usize,
}

impl<'a> SegmentCursor<'a> {
    pub fn new(mission: &'a Mission) -> Self {
        Self { mission, index: 0 }
    }

    /// Position at `t`. Going back in time re-seeks from the start.
    pub fn position_at(&mut self, t: f64) -> Result<Position> {
        check_in_span(self.mission, t)?;

        let waypoints = self.mission.waypoints();
        if waypoints[self.index].time > t {
            self.index = 0;
        }
        while self.index + 1 < waypoints.len() && waypoints[self.index + 1].time < t {
            self.index += 1;
        }

        let current = &waypoints[self.index];
        if current.time == t {
            return Ok(current.position);
        }
        // t > current.time and t <= span end, so a next waypoint exists.
        let next = &waypoints[self.index + 1];
        Ok(blend(current, next, t))
    }
}
