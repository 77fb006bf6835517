//! Mission plans with optional waypoint times.
//!
//! Operators often only know when a drone departs and when it must arrive.
//! [`MissionPlan::schedule`] fills in the missing waypoint times so the drone
//! covers each segment at constant speed over the whole window, then validates
//! the result into a [`Mission`].

use serde::{Deserialize, Serialize};

use crate::error::{DeconflictError, Result, ValidationReason};
use crate::models::{Mission, Position, Waypoint};

/// Waypoint as submitted in a plan; `time` may be left out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlannedWaypoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
}

impl PlannedWaypoint {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z, time: None }
    }

    pub const fn at(mut self, time: f64) -> Self {
        self.time = Some(time);
        self
    }

    fn position(&self) -> Position {
        Position::new(self.x, self.y, self.z)
    }
}

/// A drone's flight plan before scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionPlan {
    pub drone_id: String,
    pub waypoints: Vec<PlannedWaypoint>,
    pub start_time: f64,
    pub end_time: f64,
}

impl MissionPlan {
    pub fn new(
        drone_id: impl Into<String>,
        waypoints: Vec<PlannedWaypoint>,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        Self {
            drone_id: drone_id.into(),
            waypoints,
            start_time,
            end_time,
        }
    }

    /// Assign missing waypoint times in proportion to distance travelled and
    /// validate the resulting mission.
    ///
    /// Explicit times are kept as given. With zero total path length every
    /// missing time collapses to `start_time`, which then fails timestamp
    /// validation.
    pub fn schedule(&self) -> Result<Mission> {
        let (start, end) = (self.start_time, self.end_time);
        if !start.is_finite() || !end.is_finite() || end < start {
            return Err(DeconflictError::validation(
                self.drone_id.clone(),
                ValidationReason::InvalidSchedule { start, end },
            ));
        }

        let mut cumulative = Vec::with_capacity(self.waypoints.len());
        let mut total = 0.0;
        for (i, waypoint) in self.waypoints.iter().enumerate() {
            if i > 0 {
                total += self.waypoints[i - 1]
                    .position()
                    .distance_to(&waypoint.position());
            }
            cumulative.push(total);
        }

        let duration = end - start;
        let waypoints = self
            .waypoints
            .iter()
            .zip(&cumulative)
            .map(|(waypoint, travelled)| {
                let time = waypoint.time.unwrap_or_else(|| {
                    if total > 0.0 {
                        start + (travelled / total) * duration
                    } else {
                        start
                    }
                });
                Waypoint {
                    position: waypoint.position(),
                    time,
                }
            })
            .collect();

        Mission::new(self.drone_id.clone(), waypoints)
    }
}

impl TryFrom<MissionPlan> for Mission {
    type Error = DeconflictError;

    fn try_from(plan: MissionPlan) -> Result<Self> {
        plan.schedule()
    }
}
