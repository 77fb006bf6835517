//! Text rendering of conflict reports.

use std::fmt;

use deconflict_core::ConflictReport;

/// Human-readable view of a report.
pub struct ReportText<'a> {
    pub report: &'a ConflictReport,
    pub safety_buffer: f64,
}

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "Status: {}", report.status())?;
        writeln!(f, "Details: {}", report.details())?;
        if !report.has_conflicts() {
            return Ok(());
        }

        writeln!(f, "\nConflict Details:")?;
        for (i, conflict) in report.conflicts().iter().enumerate() {
            let location = conflict.location();
            writeln!(f, "  Conflict {}:", i + 1)?;
            writeln!(
                f,
                "    Time: {:.1}s - {:.1}s (closest at {:.1}s)",
                conflict.start_time, conflict.end_time, conflict.min_time
            )?;
            writeln!(
                f,
                "    Location: ({:.1}, {:.1}, {:.1})",
                location.x, location.y, location.z
            )?;
            writeln!(f, "    Minimum Distance: {:.2} units", conflict.min_distance)?;
            writeln!(f, "    Drones: {}", conflict.pair)?;
            writeln!(
                f,
                "    Description: {}",
                conflict.description(self.safety_buffer)
            )?;
        }
        Ok(())
    }
}

pub fn render_report(report: &ConflictReport, safety_buffer: f64) -> String {
    ReportText {
        report,
        safety_buffer,
    }
    .to_string()
}
