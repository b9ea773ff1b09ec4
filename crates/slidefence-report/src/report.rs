//! Deck overflow report.
//!
//! The JSON shape matches `overflow-report.json` as produced by the
//! browser-side detector: camelCase keys, one [`SlideResult`] per slide,
//! and the overflowing subset repeated under `overflowSlides`.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slidefence_runtime::SlideIndices;

use crate::error::{ReportError, Result};

/// Viewport and source the audit ran against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub url: String,
    pub width: u32,
    pub height: u32,
    /// Settle time per slide, in milliseconds.
    pub wait_time: u64,
    pub output_file: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000/index.html".to_string(),
            width: 1920,
            height: 1080,
            wait_time: 1_000,
            output_file: "overflow-report.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

/// Per-axis verdict of one detection method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisFlags {
    pub v: bool,
    pub h: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Methods {
    pub scroll: AxisFlags,
    pub bbox: AxisFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverflowFlags {
    pub vertical: bool,
    pub horizontal: bool,
    /// Computed `overflow-y` of the slide.
    pub y: String,
    /// Computed `overflow-x` of the slide.
    pub x: String,
    pub methods: Methods,
}

/// Whole pixels of overflow per axis, the larger of both methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverflowAmount {
    pub vertical: u32,
    pub horizontal: u32,
}

/// Audit result for one slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideResult {
    pub title: String,
    pub rect: Extent,
    pub scroll: Extent,
    pub client: Extent,
    pub overflow: OverflowFlags,
    pub has_overflow: bool,
    pub overflow_amount: OverflowAmount,
    /// 1-based linear position in the deck, vertical stacks included.
    pub index: u32,
    pub indices: SlideIndices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub ok: usize,
    pub overflow: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverflowReport {
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub config: ReportConfig,
    pub summary: Summary,
    pub results: Vec<SlideResult>,
    pub overflow_slides: Vec<SlideResult>,
}

impl OverflowReport {
    /// Assemble a report stamped with the current time.
    pub fn new(config: ReportConfig, results: Vec<SlideResult>) -> Self {
        Self::with_timestamp(config, results, Utc::now())
    }

    pub fn with_timestamp(
        config: ReportConfig,
        results: Vec<SlideResult>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let overflow_slides: Vec<SlideResult> =
            results.iter().filter(|r| r.has_overflow).cloned().collect();
        let summary = Summary {
            total: results.len(),
            ok: results.len() - overflow_slides.len(),
            overflow: overflow_slides.len(),
        };
        Self {
            timestamp,
            config,
            summary,
            results,
            overflow_slides,
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the pretty-printed report, creating parent directories.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        write_json(path.as_ref(), &self.to_json_pretty()?)
    }
}

pub(crate) fn write_json(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ReportError::io(parent, e))?;
    }
    fs::write(path, content).map_err(|e| ReportError::io(path, e))?;
    tracing::debug!(target: "slidefence.report", path = %path.display(), bytes = content.len(), "wrote json");
    Ok(())
}

/// ISO-8601 UTC with millisecond precision, e.g. `2025-01-31T08:15:00.250Z`.
pub(crate) mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
