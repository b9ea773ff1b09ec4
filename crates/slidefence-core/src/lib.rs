#![forbid(unsafe_code)]

//! Core primitives for slidefence.
//!
//! Host-independent pieces of the overflow engine: pixel geometry and the
//! four-sided [`Overflow`] measurement, CSS selector matching for scan
//! exclusion, typed style property names, and the validated
//! [`EngineConfig`].

pub mod config;
pub mod geometry;
pub mod selector;
pub mod style;

pub use config::{ConfigError, EngineConfig, EngineOptions, Mode};
pub use geometry::{Overflow, Rect, Side};
pub use selector::{
    ElementDescriptor, ElementIx, ElementTree, SelectorError, SelectorList, TreeElement,
};
pub use style::{Position, StyleProperty, format_px, parse_px};
