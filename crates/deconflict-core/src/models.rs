//! Core data models for deconfliction: positions, waypoints and missions.

use serde::{Deserialize, Serialize};

use crate::error::{DeconflictError, Result, ValidationReason};

/// A point in the mission coordinate frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another position.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Componentwise blend toward `other` by `frac` in [0, 1].
    pub fn lerp(&self, other: &Position, frac: f64) -> Position {
        Position {
            x: self.x + (other.x - self.x) * frac,
            y: self.y + (other.y - self.y) * frac,
            z: self.z + (other.z - self.z) * frac,
        }
    }

    pub fn midpoint(&self, other: &Position) -> Position {
        Position {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A timestamped position a drone is scheduled to pass through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    #[serde(flatten)]
    pub position: Position,
    pub time: f64,
}

impl Waypoint {
    pub const fn new(x: f64, y: f64, z: f64, time: f64) -> Self {
        Self {
            position: Position::new(x, y, z),
            time,
        }
    }
}

/// Closed time interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }

    /// Overlap of two spans, or `None` when they are disjoint.
    pub fn intersect(&self, other: &TimeSpan) -> Option<TimeSpan> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        if start > end {
            None
        } else {
            Some(TimeSpan { start, end })
        }
    }
}

/// One drone's validated flight plan.
///
/// Construction goes through [`Mission::new`], which guarantees at least two
/// waypoints with finite values and strictly increasing timestamps. The
/// waypoint sequence cannot be mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMission")]
pub struct Mission {
    drone_id: String,
    waypoints: Vec<Waypoint>,
}

#[derive(Deserialize)]
struct RawMission {
    drone_id: String,
    waypoints: Vec<Waypoint>,
}

impl TryFrom<RawMission> for Mission {
    type Error = DeconflictError;

    fn try_from(raw: RawMission) -> Result<Self> {
        Mission::new(raw.drone_id, raw.waypoints)
    }
}

impl Mission {
    pub fn new(drone_id: impl Into<String>, waypoints: Vec<Waypoint>) -> Result<Self> {
        let drone_id = drone_id.into();
        if drone_id.trim().is_empty() {
            return Err(DeconflictError::validation(
                drone_id,
                ValidationReason::EmptyDroneId,
            ));
        }
        if waypoints.len() < 2 {
            return Err(DeconflictError::validation(
                drone_id,
                ValidationReason::TooFewWaypoints {
                    count: waypoints.len(),
                },
            ));
        }

        for (index, waypoint) in waypoints.iter().enumerate() {
            if !waypoint.position.is_finite() || !waypoint.time.is_finite() {
                return Err(DeconflictError::validation(
                    drone_id,
                    ValidationReason::NonFiniteValue { index },
                ));
            }
        }

        if let Some(index) = waypoints.windows(2).position(|w| w[1].time <= w[0].time) {
            let reason = ValidationReason::NonIncreasingTimestamp {
                index: index + 1,
                previous: waypoints[index].time,
                current: waypoints[index + 1].time,
            };
            return Err(DeconflictError::validation(drone_id, reason));
        }

        Ok(Self {
            drone_id,
            waypoints,
        })
    }

    pub fn drone_id(&self) -> &str {
        &self.drone_id
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// `[first.time, last.time]`.
    pub fn time_span(&self) -> TimeSpan {
        // At least two waypoints are guaranteed by construction.
        let first = self.waypoints[0].time;
        let last = self.waypoints[self.waypoints.len() - 1].time;
        TimeSpan::new(first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(result: Result<Mission>) -> ValidationReason {
        match result {
            Err(DeconflictError::Validation { reason, .. }) => reason,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_mission_derives_time_span() {
        let mission = Mission::new(
            "A",
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 2.0),
                Waypoint::new(5.0, 0.0, 0.0, 4.0),
                Waypoint::new(5.0, 5.0, 0.0, 9.0),
            ],
        )
        .unwrap();
        assert_eq!(mission.time_span(), TimeSpan::new(2.0, 9.0));
    }

    #[test]
    fn test_rejects_single_waypoint() {
        let reason = reason_of(Mission::new("A", vec![Waypoint::new(0.0, 0.0, 0.0, 0.0)]));
        assert_eq!(reason, ValidationReason::TooFewWaypoints { count: 1 });
    }

    #[test]
    fn test_rejects_duplicate_timestamp() {
        let reason = reason_of(Mission::new(
            "A",
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 0.0),
                Waypoint::new(1.0, 0.0, 0.0, 5.0),
                Waypoint::new(2.0, 0.0, 0.0, 5.0),
            ],
        ));
        assert_eq!(
            reason,
            ValidationReason::NonIncreasingTimestamp {
                index: 2,
                previous: 5.0,
                current: 5.0
            }
        );
    }

    #[test]
    fn test_rejects_decreasing_timestamp_and_nan() {
        let reason = reason_of(Mission::new(
            "A",
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 3.0),
                Waypoint::new(1.0, 0.0, 0.0, 1.0),
            ],
        ));
        assert!(matches!(
            reason,
            ValidationReason::NonIncreasingTimestamp { index: 1, .. }
        ));

        let reason = reason_of(Mission::new(
            "A",
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 0.0),
                Waypoint::new(f64::NAN, 0.0, 0.0, 1.0),
            ],
        ));
        assert_eq!(reason, ValidationReason::NonFiniteValue { index: 1 });
    }

    #[test]
    fn test_rejects_empty_drone_id() {
        let reason = reason_of(Mission::new(
            " ",
            vec![
                Waypoint::new(0.0, 0.0, 0.0, 0.0),
                Waypoint::new(1.0, 0.0, 0.0, 1.0),
            ],
        ));
        assert_eq!(reason, ValidationReason::EmptyDroneId);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Mission = serde_json::from_str(
            r#"{"drone_id":"A","waypoints":[{"x":0,"y":0,"time":0},{"x":1,"y":2,"z":3,"time":1}]}"#,
        )
        .unwrap();
        assert_eq!(ok.waypoints()[1].position, Position::new(1.0, 2.0, 3.0));
        assert_eq!(ok.waypoints()[0].position.z, 0.0);

        let bad = serde_json::from_str::<Mission>(
            r#"{"drone_id":"A","waypoints":[{"x":0,"y":0,"time":1},{"x":1,"y":0,"time":1}]}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_time_span_intersection() {
        let a = TimeSpan::new(0.0, 10.0);
        assert_eq!(
            a.intersect(&TimeSpan::new(5.0, 20.0)),
            Some(TimeSpan::new(5.0, 10.0))
        );
        assert_eq!(
            a.intersect(&TimeSpan::new(10.0, 20.0)),
            Some(TimeSpan::new(10.0, 10.0))
        );
        assert_eq!(a.intersect(&TimeSpan::new(20.0, 30.0)), None);
    }
}
