//! Whole-run orchestration.
//!
//! A run moves through `Idle -> Validating -> Pruning -> Sampling ->
//! Aggregating -> Done`. Any error moves it to `Failed` and the caller gets
//! the error instead of a partial report.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;

use crate::aggregate::{merge_events, Conflict, ConflictReport};
use crate::conflict::{evaluate, overlap_window, sample_pair};
use crate::error::{DeconflictError, Result, ValidationReason};
use crate::models::Mission;
use crate::rules::DeconflictionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Idle,
    Validating,
    /// Time-window intersection per pair
    Pruning,
    Sampling,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunPhase::Idle => "idle",
            RunPhase::Validating => "validating",
            RunPhase::Pruning => "pruning",
            RunPhase::Sampling => "sampling",
            RunPhase::Aggregating => "aggregating",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

struct PhaseTracker {
    phase: RunPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        tracing::debug!(from = %self.phase, to = %next, "run phase");
        self.phase = next;
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.enter(RunPhase::Done),
            Err(DeconflictError::Cancelled) => {
                tracing::warn!(phase = %self.phase, "run cancelled");
                self.enter(RunPhase::Failed);
            }
            Err(err) => {
                tracing::warn!(phase = %self.phase, error = %err, "run failed");
                self.enter(RunPhase::Failed);
            }
        }
        result
    }
}

/// Deadline and cancellation controls for a sequential run.
///
/// Both are checked between pair evaluations only.
#[derive(Debug, Clone, Default)]
pub struct RunControl {
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl RunControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Share a flag that aborts the run once set to `true`.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check(&self) -> Result<()> {
        let expired = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        let cancelled = self
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed));
        if expired || cancelled {
            Err(DeconflictError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Detect all conflicts between every unordered pair of `missions`.
pub fn analyze(missions: &[Mission], config: &DeconflictionConfig) -> Result<ConflictReport> {
    analyze_with_control(missions, config, &RunControl::default())
}

pub fn analyze_with_control(
    missions: &[Mission],
    config: &DeconflictionConfig,
    control: &RunControl,
) -> Result<ConflictReport> {
    let mut tracker = PhaseTracker::new();
    let result = run_pairs(&mut tracker, missions, &all_pairs(missions.len()), config, control);
    tracker.finish(result)
}

/// Check one primary mission against surrounding traffic.
///
/// Only pairs involving the primary are evaluated. The primary's identifier
/// must not appear among the traffic.
pub fn analyze_primary(
    primary: &Mission,
    traffic: &[Mission],
    config: &DeconflictionConfig,
) -> Result<ConflictReport> {
    analyze_primary_with_control(primary, traffic, config, &RunControl::default())
}

pub fn analyze_primary_with_control(
    primary: &Mission,
    traffic: &[Mission],
    config: &DeconflictionConfig,
    control: &RunControl,
) -> Result<ConflictReport> {
    let mut missions = Vec::with_capacity(traffic.len() + 1);
    missions.push(primary.clone());
    missions.extend_from_slice(traffic);
    let pairs: Vec<(usize, usize)> = (1..missions.len()).map(|j| (0, j)).collect();

    let mut tracker = PhaseTracker::new();
    let result = run_pairs(&mut tracker, &missions, &pairs, config, control);
    tracker.finish(result)
}

/// Evaluate all pairs on the blocking thread pool.
///
/// Pairs complete in any order; the report is sorted afterwards so the result
/// matches [`analyze`]. When `timeout` elapses first the run fails with
/// [`DeconflictError::Cancelled`]. Queued tasks are aborted and tasks already
/// sampling stop at their next stop-flag check.
pub async fn analyze_concurrent(
    missions: Arc<[Mission]>,
    config: DeconflictionConfig,
    timeout: Option<Duration>,
) -> Result<ConflictReport> {
    let mut tracker = PhaseTracker::new();
    let result = run_concurrent(&mut tracker, missions, config, timeout).await;
    tracker.finish(result)
}

async fn run_concurrent(
    tracker: &mut PhaseTracker,
    missions: Arc<[Mission]>,
    config: DeconflictionConfig,
    timeout: Option<Duration>,
) -> Result<ConflictReport> {
    tracker.enter(RunPhase::Validating);
    validate_run(&missions, &config)?;

    tracker.enter(RunPhase::Pruning);
    let pairs = overlapping_pairs(&missions, &all_pairs(missions.len()), &config);

    tracker.enter(RunPhase::Sampling);
    let config = Arc::new(config);
    let stop = StopOnDrop::default();
    let mut tasks = JoinSet::new();
    for (i, j) in pairs {
        let missions = Arc::clone(&missions);
        let config = Arc::clone(&config);
        let flag = Arc::clone(&stop.0);
        tasks.spawn_blocking(move || -> Result<Vec<Conflict>> {
            let (a, b) = (&missions[i], &missions[j]);
            let events = sample_pair(a, b, &config, Some(&flag))?;
            Ok(merge_events(a.drone_id(), b.drone_id(), &events))
        });
    }

    let collect = async {
        let mut conflicts = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let pair_conflicts = joined.map_err(|err| DeconflictError::TaskFailed {
                reason: err.to_string(),
            })??;
            conflicts.extend(pair_conflicts);
        }
        Ok::<_, DeconflictError>(conflicts)
    };
    let conflicts = match timeout {
        Some(limit) => tokio::time::timeout(limit, collect)
            .await
            .map_err(|_| DeconflictError::Cancelled)??,
        None => collect.await?,
    };

    tracker.enter(RunPhase::Aggregating);
    let report = ConflictReport::new(conflicts);
    tracing::info!(
        missions = missions.len(),
        conflicts = report.len(),
        "deconfliction run complete"
    );
    Ok(report)
}

/// Raises the shared stop flag once the collecting run goes away.
#[derive(Default)]
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

fn run_pairs(
    tracker: &mut PhaseTracker,
    missions: &[Mission],
    pairs: &[(usize, usize)],
    config: &DeconflictionConfig,
    control: &RunControl,
) -> Result<ConflictReport> {
    tracker.enter(RunPhase::Validating);
    validate_run(missions, config)?;

    tracker.enter(RunPhase::Pruning);
    let candidates = overlapping_pairs(missions, pairs, config);

    tracker.enter(RunPhase::Sampling);
    let mut conflicts = Vec::new();
    for (i, j) in candidates {
        control.check()?;
        conflicts.extend(evaluate_pair(&missions[i], &missions[j], config)?);
    }

    tracker.enter(RunPhase::Aggregating);
    let report = ConflictReport::new(conflicts);
    tracing::info!(
        missions = missions.len(),
        pairs = pairs.len(),
        conflicts = report.len(),
        "deconfliction run complete"
    );
    Ok(report)
}

/// Evaluate one pair and merge its events into conflicts.
pub fn evaluate_pair(a: &Mission, b: &Mission, config: &DeconflictionConfig) -> Result<Vec<Conflict>> {
    let events = evaluate(a, b, config)?;
    Ok(merge_events(a.drone_id(), b.drone_id(), &events))
}

fn validate_run(missions: &[Mission], config: &DeconflictionConfig) -> Result<()> {
    config.validate()?;
    let mut seen = HashSet::with_capacity(missions.len());
    for mission in missions {
        if !seen.insert(mission.drone_id()) {
            return Err(DeconflictError::validation(
                mission.drone_id(),
                ValidationReason::DuplicateDroneId,
            ));
        }
    }
    Ok(())
}

/// Drop pairs whose time spans cannot meet.
fn overlapping_pairs(
    missions: &[Mission],
    pairs: &[(usize, usize)],
    config: &DeconflictionConfig,
) -> Vec<(usize, usize)> {
    let kept: Vec<(usize, usize)> = pairs
        .iter()
        .copied()
        .filter(|&(i, j)| overlap_window(&missions[i], &missions[j], config).is_some())
        .collect();
    tracing::debug!(
        pairs = pairs.len(),
        pruned = pairs.len() - kept.len(),
        "time-window pruning"
    );
    kept
}

fn all_pairs(count: usize) -> Vec<(usize, usize)> {
    (0..count)
        .flat_map(|i| (i + 1..count).map(move |j| (i, j)))
        .collect()
}
