//! Merging proximity events into conflicts and building the report.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::conflict::ProximityEvent;
use crate::models::Position;

/// Unordered pair of drone identifiers, stored with the smaller id first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DronePair {
    pub first: String,
    pub second: String,
}

impl DronePair {
    /// Canonical pair plus whether the inputs were swapped to get there.
    pub fn canonical(a: &str, b: &str) -> (Self, bool) {
        if a <= b {
            (Self::from_ordered(a, b), false)
        } else {
            (Self::from_ordered(b, a), true)
        }
    }

    pub fn new(a: &str, b: &str) -> Self {
        Self::canonical(a, b).0
    }

    fn from_ordered(first: &str, second: &str) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
        }
    }

    pub fn contains(&self, drone_id: &str) -> bool {
        self.first == drone_id || self.second == drone_id
    }
}

impl fmt::Display for DronePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.first, self.second)
    }
}

/// A contiguous interval during which two drones were closer than the
/// safety buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub pair: DronePair,
    pub start_time: f64,
    pub end_time: f64,
    pub min_distance: f64,
    /// Instant of closest approach within the interval
    pub min_time: f64,
    /// Position of `pair.first` at `min_time`
    pub position_first: Position,
    /// Position of `pair.second` at `min_time`
    pub position_second: Position,
}

impl Conflict {
    /// Midpoint of the two drones at closest approach.
    pub fn location(&self) -> Position {
        self.position_first.midpoint(&self.position_second)
    }

    pub fn description(&self, safety_buffer: f64) -> String {
        format!(
            "Conflict zone {} from {:.1}s to {:.1}s: minimum separation {:.2} units < safety buffer {}",
            self.pair, self.start_time, self.end_time, self.min_distance, safety_buffer
        )
    }

    fn report_order(&self, other: &Self) -> Ordering {
        self.start_time
            .total_cmp(&other.start_time)
            .then_with(|| self.pair.cmp(&other.pair))
    }
}

/// Collapse time-ordered events of one pair into conflicts.
///
/// Events on consecutive samples belong to the same run. `events` carry
/// positions in the order `(a, b)` given by `drone_a` and `drone_b`.
pub fn merge_events(drone_a: &str, drone_b: &str, events: &[ProximityEvent]) -> Vec<Conflict> {
    let (pair, swapped) = DronePair::canonical(drone_a, drone_b);

    let mut conflicts = Vec::new();
    let mut run: Option<Run> = None;

    for &event in events {
        let event = if swapped { event.swapped() } else { event };
        run = match run {
            Some(mut open) if event.sample == open.last.sample + 1 => {
                if event.distance < open.closest.distance {
                    open.closest = event;
                }
                open.last = event;
                Some(open)
            }
            Some(finished) => {
                conflicts.push(finished.close(&pair));
                Some(Run::start(event))
            }
            None => Some(Run::start(event)),
        };
    }
    if let Some(finished) = run {
        conflicts.push(finished.close(&pair));
    }

    conflicts
}

struct Run {
    start_time: f64,
    last: ProximityEvent,
    closest: ProximityEvent,
}

impl Run {
    fn start(event: ProximityEvent) -> Self {
        Self {
            start_time: event.time,
            last: event,
            closest: event,
        }
    }

    fn close(self, pair: &DronePair) -> Conflict {
        Conflict {
            pair: pair.clone(),
            start_time: self.start_time,
            end_time: self.last.time,
            min_distance: self.closest.distance,
            min_time: self.closest.time,
            position_first: self.closest.position_a,
            position_second: self.closest.position_b,
        }
    }
}

/// All conflicts of a run, sorted by start time then pair.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ConflictReport {
    has_conflicts: bool,
    conflicts: Vec<Conflict>,
}

impl ConflictReport {
    /// Build a report from conflicts gathered in any order.
    pub fn new(mut conflicts: Vec<Conflict>) -> Self {
        conflicts.sort_by(Conflict::report_order);
        Self {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }

    pub fn has_conflicts(&self) -> bool {
        self.has_conflicts
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn by_pair(&self) -> BTreeMap<DronePair, Vec<&Conflict>> {
        let mut grouped: BTreeMap<DronePair, Vec<&Conflict>> = BTreeMap::new();
        for conflict in &self.conflicts {
            grouped.entry(conflict.pair.clone()).or_default().push(conflict);
        }
        grouped
    }

    pub fn for_drone<'a>(&'a self, drone_id: &'a str) -> impl Iterator<Item = &'a Conflict> + 'a {
        self.conflicts
            .iter()
            .filter(move |conflict| conflict.pair.contains(drone_id))
    }

    /// Smallest separation seen in any conflict.
    pub fn min_separation(&self) -> Option<f64> {
        self.conflicts
            .iter()
            .map(|conflict| conflict.min_distance)
            .min_by(f64::total_cmp)
    }

    pub fn status(&self) -> &'static str {
        if self.has_conflicts {
            "conflict detected"
        } else {
            "clear"
        }
    }

    pub fn details(&self) -> String {
        match self.conflicts.len() {
            0 => "No conflicts detected".to_string(),
            1 => "Found 1 conflict zone".to_string(),
            n => format!("Found {} conflict zones", n),
        }
    }
}
