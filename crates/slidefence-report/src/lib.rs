#![forbid(unsafe_code)]

//! Deck-level overflow reporting.
//!
//! # Role in slidefence
//! The runtime engine guards one slide while it is shown. This crate looks
//! at a whole deck after the fact: [`audit_slide`] measures one slide the
//! way a headless browser pass would, [`OverflowReport`] collects the
//! results as `overflow-report.json`, [`FixSuggestions`] grades the
//! overflowing slides, and [`EngineSnapshot`] persists a live engine's
//! ledger.
//!
//! Nothing here mutates the document.

pub mod audit;
pub mod error;
pub mod report;
pub mod snapshot;
pub mod suggest;

pub use audit::{AuditOptions, DeckSlide, EPS_PX, audit_deck, audit_slide, slide_title};
pub use error::ReportError;
pub use report::{
    AxisFlags, Extent, Methods, OverflowAmount, OverflowFlags, OverflowReport, ReportConfig,
    SlideResult, Summary,
};
pub use snapshot::{EngineSnapshot, ViolationSnapshot};
pub use suggest::{Fix, FixAction, FixSuggestions, Severity, SeverityThresholds, slide_file};
