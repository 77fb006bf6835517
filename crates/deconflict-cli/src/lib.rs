//! Deconfliction CLI - one-shot conflict checks over a mission file.
//!
//! This crate provides:
//! - config: environment defaults for the `deconflict` binary
//! - input: mission file loading
//! - report: text rendering of a conflict report

pub mod config;
pub mod input;
pub mod report;

pub use config::CliConfig;
pub use input::{load_missions, parse_missions};
pub use report::{render_report, ReportText};
