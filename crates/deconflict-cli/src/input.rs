//! Mission file loading.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use deconflict_core::{Mission, MissionPlan};

/// Parse a JSON array of mission plans and schedule each one.
///
/// The first invalid plan aborts the whole load.
pub fn parse_missions(json: &str) -> Result<Vec<Mission>> {
    let plans: Vec<MissionPlan> =
        serde_json::from_str(json).context("mission file is not a JSON array of mission plans")?;
    plans
        .iter()
        .map(|plan| {
            plan.schedule()
                .with_context(|| format!("failed to schedule mission '{}'", plan.drone_id))
        })
        .collect()
}

pub fn load_missions(path: &Path) -> Result<Vec<Mission>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read mission file {}", path.display()))?;
    let missions = parse_missions(&json)?;
    tracing::info!(path = %path.display(), missions = missions.len(), "loaded missions");
    Ok(missions)
}
