//! Fix suggestions derived from a report.
//!
//! Each overflowing slide is graded by its vertical overflow. Slides past
//! the moderate threshold should switch to the dense layout
//! (`<section class="dense-slide">`); minor ones need a manual look; those
//! under the minor threshold get no suggestion.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::report::{OverflowReport, iso_millis, write_json};

/// Vertical overflow thresholds in pixels, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub minor: u32,
    pub moderate: u32,
    pub severe: u32,
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            minor: 50,
            moderate: 200,
            severe: 500,
        }
    }
}

impl SeverityThresholds {
    pub fn classify(&self, overflow: u32) -> Option<Severity> {
        if overflow >= self.severe {
            Some(Severity::Severe)
        } else if overflow >= self.moderate {
            Some(Severity::Moderate)
        } else if overflow >= self.minor {
            Some(Severity::Minor)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub const fn action(self) -> FixAction {
        match self {
            Self::Minor => FixAction::CheckManually,
            Self::Moderate | Self::Severe => FixAction::AddDenseSlide,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixAction {
    AddDenseSlide,
    CheckManually,
}

impl FixAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddDenseSlide => "add-dense-slide",
            Self::CheckManually => "check-manually",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fix {
    /// Slide source file, `NNN.html`.
    pub file: String,
    /// Vertical overflow in pixels.
    pub overflow: u32,
    pub action: FixAction,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSuggestions {
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    /// Largest overflow first.
    pub fixes: Vec<Fix>,
    pub dense_slide_files: Vec<String>,
}

/// Source file name for a 1-based slide index: `7` → `007.html`.
pub fn slide_file(index: u32) -> String {
    format!("{index:03}.html")
}

impl FixSuggestions {
    pub fn from_report(report: &OverflowReport) -> Self {
        Self::from_report_with(report, SeverityThresholds::default(), Utc::now())
    }

    pub fn from_report_with(
        report: &OverflowReport,
        thresholds: SeverityThresholds,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut fixes: Vec<Fix> = report
            .overflow_slides
            .iter()
            .filter_map(|slide| {
                let overflow = slide.overflow_amount.vertical;
                thresholds.classify(overflow).map(|severity| Fix {
                    file: slide_file(slide.index),
                    overflow,
                    action: severity.action(),
                    severity,
                })
            })
            .collect();
        // Stable: equal overflow keeps report order.
        fixes.sort_by(|a, b| b.overflow.cmp(&a.overflow));

        let dense_slide_files = fixes
            .iter()
            .filter(|f| f.action == FixAction::AddDenseSlide)
            .map(|f| f.file.clone())
            .collect();

        tracing::debug!(
            target: "slidefence.report",
            candidates = report.overflow_slides.len(),
            fixes = fixes.len(),
            "fix suggestions derived"
        );

        Self {
            timestamp,
            fixes,
            dense_slide_files,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &self.to_json_pretty()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportConfig;
    use crate::test_support::slide;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn report() -> OverflowReport {
        OverflowReport::with_timestamp(
            ReportConfig::default(),
            vec![
                slide(1, 0, 0),
                slide(2, 60, 0),
                slide(3, 520, 0),
                slide(4, 10, 300),
                slide(5, 200, 0),
                slide(12, 499, 0),
            ],
            Utc.with_ymd_and_hms(2025, 1, 31, 8, 15, 0).unwrap(),
        )
    }

    #[test]
    fn thresholds_are_inclusive() {
        let t = SeverityThresholds::default();
        assert_eq!(t.classify(49), None);
        assert_eq!(t.classify(50), Some(Severity::Minor));
        assert_eq!(t.classify(199), Some(Severity::Minor));
        assert_eq!(t.classify(200), Some(Severity::Moderate));
        assert_eq!(t.classify(499), Some(Severity::Moderate));
        assert_eq!(t.classify(500), Some(Severity::Severe));
    }

    #[test]
    fn fixes_sorted_by_overflow_descending() {
        let s = FixSuggestions::from_report_with(
            &report(),
            SeverityThresholds::default(),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        );
        let files: Vec<(&str, u32, Severity)> = s
            .fixes
            .iter()
            .map(|f| (f.file.as_str(), f.overflow, f.severity))
            .collect();
        assert_eq!(
            files,
            vec![
                ("003.html", 520, Severity::Severe),
                ("012.html", 499, Severity::Moderate),
                ("005.html", 200, Severity::Moderate),
                ("002.html", 60, Severity::Minor),
            ]
        );
        assert_eq!(s.dense_slide_files, vec!["003.html", "012.html", "005.html"]);
    }

    #[test]
    fn horizontal_only_overflow_gets_no_fix() {
        let s = FixSuggestions::from_report(&report());
        assert!(s.fixes.iter().all(|f| f.file != "004.html"));
    }

    #[test]
    fn json_shape() {
        let s = FixSuggestions::from_report_with(
            &report(),
            SeverityThresholds::default(),
            Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
        );
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["timestamp"], "2025-02-01T00:00:00.000Z");
        assert_eq!(v["fixes"][0]["action"], "add-dense-slide");
        assert_eq!(v["fixes"][0]["severity"], "severe");
        assert_eq!(v["fixes"][3]["action"], "check-manually");
        assert_eq!(v["denseSlideFiles"][1], "012.html");
    }

    #[test]
    fn slide_file_pads_to_three_digits() {
        assert_eq!(slide_file(7), "007.html");
        assert_eq!(slide_file(42), "042.html");
        assert_eq!(slide_file(1234), "1234.html");
    }

    #[test]
    fn write_to_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fix-suggestions.json");
        FixSuggestions::from_report(&report()).write_to(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let back: FixSuggestions = serde_json::from_str(&text).unwrap();
        assert_eq!(back.fixes.len(), 4);
    }
}
