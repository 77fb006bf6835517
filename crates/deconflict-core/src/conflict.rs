//! Pairwise conflict evaluation.
//!
//! For one pair of missions the evaluator intersects their time spans, samples
//! the overlap at a fixed step and reports every instant at which the two
//! drones are strictly closer than the safety buffer.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{DeconflictError, Result};
use crate::interpolate::SegmentCursor;
use crate::models::{Mission, Position, TimeSpan};
use crate::rules::DeconflictionConfig;

/// Relative slack applied to `sample_step` when folding a sample into the
/// window end.
const STEP_TOLERANCE: f64 = 1e-9;

/// Samples between checks of the stop flag.
const STOP_CHECK_INTERVAL: usize = 1024;

/// A single sampled instant with separation below the safety buffer.
///
/// Positions are listed in the order the missions were passed to
/// [`evaluate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityEvent {
    /// Position of this instant in the pair's sample timeline
    pub sample: u64,
    pub time: f64,
    pub distance: f64,
    pub position_a: Position,
    pub position_b: Position,
}

impl ProximityEvent {
    pub(crate) fn swapped(self) -> Self {
        Self {
            position_a: self.position_b,
            position_b: self.position_a,
            ..self
        }
    }
}

/// Window in which both missions are airborne, further restricted by the
/// configured analysis window. `None` means the pair cannot conflict.
pub fn overlap_window(a: &Mission, b: &Mission, config: &DeconflictionConfig) -> Option<TimeSpan> {
    let window = a.time_span().intersect(&b.time_span())?;
    match &config.analysis_window {
        Some(limit) => window.intersect(limit),
        None => Some(window),
    }
}

/// Indexed sample times over `window`: `(k, start + k * step)`, always ending
/// exactly on `window.end`. Indices are consecutive, so two samples are
/// neighbours iff their indices differ by one. A degenerate window yields its
/// single instant.
pub fn sample_times(window: TimeSpan, step: f64) -> impl Iterator<Item = (u64, f64)> {
    let TimeSpan { start, end } = window;
    // Covers rounding of `start + k * step` at large time magnitudes.
    let slack = step * STEP_TOLERANCE + 4.0 * f64::EPSILON * start.abs().max(end.abs());
    let interior = ((end - start) / step).floor().max(0.0) as u64;

    (0..=interior)
        .map(move |k| start + k as f64 * step)
        .take_while(move |t| end - *t > slack)
        .chain(std::iter::once(end))
        .enumerate()
        .map(|(k, t)| (k as u64, t))
}

/// Evaluate one pair of missions and return its proximity events in time
/// order.
///
/// Disjoint time spans are pruned before any sampling happens. A mission never
/// conflicts with itself, so passing the same drone twice yields nothing.
/// An invalid configuration is rejected up front.
pub fn evaluate(
    mission_a: &Mission,
    mission_b: &Mission,
    config: &DeconflictionConfig,
) -> Result<Vec<ProximityEvent>> {
    sample_pair(mission_a, mission_b, config, None)
}

/// [`evaluate`] that gives up with [`DeconflictError::Cancelled`] once `stop`
/// is set.
pub(crate) fn sample_pair(
    mission_a: &Mission,
    mission_b: &Mission,
    config: &DeconflictionConfig,
    stop: Option<&AtomicBool>,
) -> Result<Vec<ProximityEvent>> {
    config.validate()?;
    if mission_a.drone_id() == mission_b.drone_id() {
        return Ok(Vec::new());
    }
    let Some(window) = overlap_window(mission_a, mission_b, config) else {
        tracing::debug!(
            drone_a = mission_a.drone_id(),
            drone_b = mission_b.drone_id(),
            "time spans do not overlap, pair pruned"
        );
        return Ok(Vec::new());
    };

    let mut cursor_a = SegmentCursor::new(mission_a);
    let mut cursor_b = SegmentCursor::new(mission_b);
    let mut events = Vec::new();

    for (sample, t) in sample_times(window, config.sample_step) {
        if let Some(stop) = stop {
            if sample as usize % STOP_CHECK_INTERVAL == 0 && stop.load(Ordering::Relaxed) {
                return Err(DeconflictError::Cancelled);
            }
        }
        let position_a = cursor_a.position_at(t)?;
        let position_b = cursor_b.position_at(t)?;
        let distance = position_a.distance_to(&position_b);

        // Strict: exactly at the buffer is not a violation.
        if distance < config.safety_buffer {
            events.push(ProximityEvent {
                sample,
                time: t,
                distance,
                position_a,
                position_b,
            });
        }
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Waypoint;

    fn straight(id: &str, from: (f64, f64, f64), to: (f64, f64, f64), span: (f64, f64)) -> Mission {
        Mission::new(
            id,
            vec![
                Waypoint::new(from.0, from.1, from.2, span.0),
                Waypoint::new(to.0, to.1, to.2, span.1),
            ],
        )
        .unwrap()
    }

    fn times(window: TimeSpan, step: f64) -> Vec<f64> {
        sample_times(window, step).map(|(_, t)| t).collect()
    }

    #[test]
    fn test_sample_times_include_both_endpoints() {
        assert_eq!(
            times(TimeSpan::new(0.0, 2.0), 0.5),
            vec![0.0, 0.5, 1.0, 1.5, 2.0]
        );
        assert_eq!(times(TimeSpan::new(1.0, 2.2), 0.5), vec![1.0, 1.5, 2.0, 2.2]);
    }

    #[test]
    fn test_sample_times_degenerate_window() {
        let samples: Vec<(u64, f64)> = sample_times(TimeSpan::new(3.0, 3.0), 0.5).collect();
        assert_eq!(samples, vec![(0, 3.0)]);
    }

    #[test]
    fn test_sample_times_do_not_duplicate_end() {
        // k * 0.1 can round to just past 3.0.
        let times = times(TimeSpan::new(0.0, 3.0), 0.1);
        assert_eq!(times.len(), 31);
        assert_eq!(*times.last().unwrap(), 3.0);
        assert!(times.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_sample_indices_are_consecutive_at_epoch_times() {
        let t0 = 1.7e9;
        let samples: Vec<(u64, f64)> = sample_times(TimeSpan::new(t0, t0 + 10.0), 0.1).collect();
        assert_eq!(samples.len(), 101);
        assert!(samples.iter().enumerate().all(|(i, &(k, _))| k == i as u64));
        assert_eq!(samples.last().unwrap().1, t0 + 10.0);
        assert!(samples.windows(2).all(|w| w[1].1 > w[0].1));
    }

    #[test]
    fn test_stop_flag_cancels_sampling() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let b = straight("B", (0.0, 1.0, 0.0), (10.0, 1.0, 0.0), (0.0, 10.0));
        let config = DeconflictionConfig::new(2.0, 0.5);

        let stop = AtomicBool::new(true);
        assert_eq!(
            sample_pair(&a, &b, &config, Some(&stop)),
            Err(DeconflictError::Cancelled)
        );
        stop.store(false, Ordering::Relaxed);
        assert_eq!(sample_pair(&a, &b, &config, Some(&stop)).unwrap().len(), 21);
    }

    #[test]
    fn test_crossing_pair_has_events_around_meeting() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let b = straight("B", (5.0, -1.0, 0.0), (5.0, 1.0, 0.0), (0.0, 10.0));
        let config = DeconflictionConfig::new(2.0, 0.5);

        let events = evaluate(&a, &b, &config).unwrap();
        assert!(!events.is_empty());
        assert!(events.iter().all(|e| e.distance < 2.0));
        let closest = events
            .iter()
            .min_by(|x, y| x.distance.total_cmp(&y.distance))
            .unwrap();
        assert_eq!(closest.time, 5.0);
        assert_eq!(closest.distance, 0.0);
        assert_eq!(closest.position_a, Position::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn test_disjoint_spans_are_pruned() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let b = straight("B", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (20.0, 30.0));
        let config = DeconflictionConfig::new(100.0, 0.5);
        assert!(overlap_window(&a, &b, &config).is_none());
        assert!(evaluate(&a, &b, &config).unwrap().is_empty());
    }

    #[test]
    fn test_same_drone_never_conflicts() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let config = DeconflictionConfig::new(100.0, 0.5);
        assert!(evaluate(&a, &a, &config).unwrap().is_empty());
    }

    #[test]
    fn test_exact_buffer_distance_is_not_an_event() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let b = straight("B", (0.0, 2.0, 0.0), (10.0, 2.0, 0.0), (0.0, 10.0));
        let config = DeconflictionConfig::new(2.0, 0.5);
        assert!(evaluate(&a, &b, &config).unwrap().is_empty());
    }

    #[test]
    fn test_analysis_window_limits_sampling() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let b = straight("B", (0.0, 1.0, 0.0), (10.0, 1.0, 0.0), (0.0, 10.0));
        let config =
            DeconflictionConfig::new(2.0, 0.5).with_analysis_window(TimeSpan::new(2.0, 4.0));
        let events = evaluate(&a, &b, &config).unwrap();
        let times: Vec<f64> = events.iter().map(|e| e.time).collect();
        assert_eq!(times, vec![2.0, 2.5, 3.0, 3.5, 4.0]);

        let outside =
            DeconflictionConfig::new(2.0, 0.5).with_analysis_window(TimeSpan::new(11.0, 12.0));
        assert!(evaluate(&a, &b, &outside).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_zero_step() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0));
        let b = straight("B", (0.0, 1.0, 0.0), (10.0, 1.0, 0.0), (0.0, 10.0));
        let config = DeconflictionConfig::new(2.0, 0.0);
        assert!(matches!(
            evaluate(&a, &b, &config),
            Err(DeconflictError::Configuration { .. })
        ));
    }

    #[test]
    fn test_evaluation_is_symmetric() {
        let a = straight("A", (0.0, 0.0, 0.0), (10.0, 10.0, 5.0), (0.0, 10.0));
        let b = straight("B", (10.0, 0.0, 5.0), (0.0, 10.0, 0.0), (2.0, 12.0));
        let config = DeconflictionConfig::new(4.0, 0.25);
        let ab = evaluate(&a, &b, &config).unwrap();
        let ba: Vec<ProximityEvent> = evaluate(&b, &a, &config)
            .unwrap()
            .into_iter()
            .map(ProximityEvent::swapped)
            .collect();
        assert!(!ab.is_empty());
        assert_eq!(ab, ba);
    }
}
