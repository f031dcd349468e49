//! Plain-text rendering of prediction reports for the console.

use crate::report::PredictionReport;
use serde::Serialize;
use std::fmt;

const RULE_WIDTH: usize = 75;

/// A report paired with its item label
///
/// `item_label` is the display name of the target item, resolved by the
/// caller (the core has no notion of item titles). `Display` gives the
/// console layout; serializing flattens the report and adds `item_label`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LabeledReport<'a> {
    #[serde(flatten)]
    report: &'a PredictionReport,
    item_label: &'a str,
}

impl<'a> LabeledReport<'a> {
    pub fn new(report: &'a PredictionReport, item_label: &'a str) -> Self {
        Self { report, item_label }
    }
}

impl fmt::Display for LabeledReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let rule = "-".repeat(RULE_WIDTH);

        writeln!(
            f,
            "Performing {} Rating Prediction for User {} on Item: {} with neighborhood size {}",
            report.mode().label(),
            report.target_user(),
            self.item_label,
            report.k()
        )?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "most similar neighbors {}", format_ids(report.neighbor_ids()))?;
        writeln!(
            f,
            "neighbor ratings for {}: {}",
            self.item_label,
            format_ratings(report.neighbor_ratings())
        )?;
        writeln!(f, "Average Rating: {:.2}", report.average_rating())?;
        writeln!(f, "Predicted Rating: {:.2}", report.predicted_rating())?;
        match report.actual_rating() {
            Some(actual) => writeln!(f, "Actual Rating: {:.2}", actual)?,
            None => writeln!(f, "Actual Rating: unavailable")?,
        }
        writeln!(f, "{}", rule)
    }
}

/// Render a report as console text
pub fn render_text(report: &PredictionReport, item_label: &str) -> String {
    LabeledReport::new(report, item_label).to_string()
}

fn format_ids(ids: &[u32]) -> String {
    let parts: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("[{}]", parts.join(", "))
}

fn format_ratings(ratings: &[f64]) -> String {
    let parts: Vec<String> = ratings.iter().map(|r| format!("{:.1}", r)).collect();
    format!("[{}]", parts.join(", "))
}
