#![forbid(unsafe_code)]

//! Overflow detection and prevention for rendered slides.
//!
//! # Role in slidefence
//! `slidefence-runtime` is the engine. It watches one container through a
//! [`DocumentHost`](slidefence_backend::DocumentHost), measures each
//! descendant against the container box, records violations, and applies
//! the configured remediation.
//!
//! # Primary responsibilities
//! - **Probing**: read element and container rects, compute [`Overflow`].
//! - **Constraints**: baseline `box-sizing`/`max-width` on every element and
//!   clipping on the container.
//! - **Observation**: structural, size, and boundary watchers feeding one
//!   recheck path, plus a periodic sweeper as the safety net.
//! - **Remediation**: strict clamp, auto-fix, or warn-only.
//!
//! # How it fits in the system
//! The engine is host-driven. The embedder forwards notifications to
//! [`OverflowEngine::handle`] and calls [`OverflowEngine::tick`]; nothing
//! blocks and nothing spawns threads. [`DeckMonitor`] binds engines to the
//! slides of a deck as they become current.
//!
//! [`Overflow`]: slidefence_core::Overflow

pub mod constraints;
pub mod deck;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod prober;
pub mod readiness;
pub mod remediation;
pub mod sweeper;
pub mod watchers;

pub use constraints::{CONSTRAINED_ATTR, Constraints, PREVENTED_ATTR, harden_container};
pub use deck::{DeckEvent, DeckMonitor, SlideIndices};
pub use engine::{EngineStats, OverflowEngine};
pub use error::EngineError;
pub use ledger::{Ledger, Violation};
pub use prober::{Probe, Prober};
pub use readiness::{Readiness, ReadinessGate};
pub use remediation::{AutoFix, RemediationStrategy, Remedy, StrictClamp, Target, WarnOnly, strategy_for};
pub use sweeper::{SweepDecision, Sweeper};
pub use watchers::{BOUNDARY_THRESHOLDS, Recheck, WatcherSet};
