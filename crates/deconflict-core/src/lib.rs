pub mod aggregate;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod interpolate;
pub mod models;
pub mod plan;
pub mod rules;

pub use aggregate::{merge_events, Conflict, ConflictReport, DronePair};
pub use conflict::{evaluate, overlap_window, sample_times, ProximityEvent};
pub use engine::{
    analyze, analyze_concurrent, analyze_primary, analyze_primary_with_control,
    analyze_with_control, evaluate_pair, RunControl,
};
pub use error::{DeconflictError, Result, ValidationReason};
pub use interpolate::{position_at, SegmentCursor};
pub use models::{Mission, Position, TimeSpan, Waypoint};
pub use plan::{MissionPlan, PlannedWaypoint};
pub use rules::DeconflictionConfig;
