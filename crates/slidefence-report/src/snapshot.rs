//! Serializable snapshots of live engine state.

use std::path::Path;

use serde::{Deserialize, Serialize};
use slidefence_backend::DocumentHost;
use slidefence_core::Overflow;
use slidefence_runtime::{EngineStats, OverflowEngine, Violation};

use crate::error::Result;
use crate::report::write_json;

/// One ledger entry, with the element named instead of referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationSnapshot {
    /// `<tag#id.class>`, or `<detached>` once the node is gone.
    pub element: String,
    pub overflow: Overflow,
    /// Host monotonic time of the detection, in milliseconds.
    pub timestamp_ms: u64,
    pub fixed: bool,
    pub attempts: u32,
}

impl ViolationSnapshot {
    pub fn capture<H: DocumentHost + ?Sized>(host: &H, violation: &Violation) -> Self {
        Self {
            element: host
                .describe(violation.element)
                .map_or_else(|| "<detached>".to_string(), |d| d.identifier()),
            overflow: violation.overflow,
            timestamp_ms: u64::try_from(violation.timestamp.as_millis()).unwrap_or(u64::MAX),
            fixed: violation.fixed,
            attempts: violation.attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub container: String,
    pub stats: EngineStats,
    pub violations: Vec<ViolationSnapshot>,
}

impl EngineSnapshot {
    pub fn capture<H: DocumentHost + ?Sized>(host: &H, engine: &OverflowEngine) -> Self {
        Self {
            container: host
                .describe(engine.container())
                .map_or_else(|| "<detached>".to_string(), |d| d.identifier()),
            stats: engine.stats(),
            violations: engine
                .violations()
                .iter()
                .map(|v| ViolationSnapshot::capture(host, v))
                .collect(),
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
    use core::time::Duration;

    use super::*;
    use pretty_assertions::assert_eq;
    use slidefence_backend::NodeId;
    use slidefence_headless::{ElementSpec, HeadlessDocument};

    #[test]
    fn detached_element_is_named_as_such() {
        let doc = HeadlessDocument::new(800.0, 600.0);
        let v = Violation {
            element: NodeId::new(99, 3),
            overflow: Overflow {
                top: 0.0,
                right: 12.0,
                bottom: 0.0,
                left: 0.0,
            },
            timestamp: Duration::from_micros(1_500_700),
            fixed: true,
            attempts: 2,
        };
        let snap = ViolationSnapshot::capture(&doc, &v);
        assert_eq!(
            snap,
            ViolationSnapshot {
                element: "<detached>".to_string(),
                overflow: v.overflow,
                timestamp_ms: 1_500,
                fixed: true,
                attempts: 2,
            }
        );
    }

    #[test]
    fn json_keys_are_camel_case() {
        let mut doc = HeadlessDocument::new(800.0, 600.0);
        let root = doc.root();
        let el = doc
            .append(root, ElementSpec::new("div").id("chart").class("wide"))
            .unwrap();
        let v = Violation {
            element: el,
            overflow: Overflow::NONE,
            timestamp: Duration::from_millis(40),
            fixed: false,
            attempts: 0,
        };
        let value = serde_json::to_value(ViolationSnapshot::capture(&doc, &v)).unwrap();
        assert_eq!(value["element"], "<div#chart.wide>");
        assert_eq!(value["timestampMs"], 40);
        assert_eq!(value["overflow"]["right"], 0.0);
    }
}
