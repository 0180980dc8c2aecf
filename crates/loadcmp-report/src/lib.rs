//! # loadcmp-report
//!
//! Impact analysis and report generation:
//! - `percent_change` / `compute_impact` derive relative overhead from a
//!   comparison record, preserving infinity for zero baselines
//! - `Verdict` tiers the overhead (low / moderate / high)
//! - `ReportGenerator` renders a Markdown report plus an SVG chart

pub mod chart;
pub mod impact;
pub mod report;
pub mod table;

pub use chart::render_chart;
pub use impact::{compute_impact, percent_change, ImpactRecord, Verdict};
pub use report::{ReportArtifacts, ReportGenerator};
pub use table::{format_impact, markdown_table, summary_rows, SummaryRow};
