//! Per-slide engine binding for a slide deck.
//!
//! The deck framework reports lifecycle events; [`DeckMonitor`] lazily binds
//! one [`OverflowEngine`] to every slide that becomes current and keeps it
//! bound for the rest of the session.

use core::fmt;

use serde::{Deserialize, Serialize};
use slidefence_backend::{DocumentHost, HostNotification, NodeId};
use slidefence_core::EngineOptions;

use crate::engine::OverflowEngine;
use crate::error::EngineError;

/// Horizontal/vertical position of a slide in the deck.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct SlideIndices {
    pub h: u32,
    pub v: u32,
}

impl SlideIndices {
    pub const fn new(h: u32, v: u32) -> Self {
        Self { h, v }
    }
}

impl fmt::Display for SlideIndices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.h, self.v)
    }
}

/// Deck lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckEvent {
    /// The deck finished initializing; `slide` is current.
    Ready { slide: NodeId, indices: SlideIndices },
    SlideChanged { slide: NodeId, indices: SlideIndices },
}

impl DeckEvent {
    pub const fn slide(&self) -> NodeId {
        match self {
            Self::Ready { slide, .. } | Self::SlideChanged { slide, .. } => *slide,
        }
    }

    pub const fn indices(&self) -> SlideIndices {
        match self {
            Self::Ready { indices, .. } | Self::SlideChanged { indices, .. } => *indices,
        }
    }
}

type SlideOptions = Box<dyn Fn(SlideIndices, EngineOptions) -> EngineOptions>;

struct Bound {
    slide: NodeId,
    indices: SlideIndices,
    engine: OverflowEngine,
}

pub struct DeckMonitor {
    options: EngineOptions,
    per_slide: Option<SlideOptions>,
    bound: Vec<Bound>,
    current: Option<NodeId>,
}

impl fmt::Debug for DeckMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckMonitor")
            .field("options", &self.options)
            .field("bound", &self.bound.len())
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl DeckMonitor {
    /// Validate `options` up front; slides bind lazily.
    pub fn new(options: EngineOptions) -> Result<Self, EngineError> {
        options.clone().build()?;
        Ok(Self {
            options,
            per_slide: None,
            bound: Vec::new(),
            current: None,
        })
    }

    /// Adjust options per slide before its engine is created.
    #[must_use]
    pub fn with_slide_options(
        mut self,
        f: impl Fn(SlideIndices, EngineOptions) -> EngineOptions + 'static,
    ) -> Self {
        self.per_slide = Some(Box::new(f));
        self
    }

    /// Bind the event's slide if needed and make it current. Returns the
    /// current slide's violation count.
    pub fn on_event<H: DocumentHost>(
        &mut self,
        host: &mut H,
        event: DeckEvent,
    ) -> Result<usize, EngineError> {
        let slide = event.slide();
        let indices = event.indices();
        if !self.bound.iter().any(|b| b.slide == slide) {
            let options = match &self.per_slide {
                Some(f) => f(indices, self.options.clone()),
                None => self.options.clone(),
            };
            let enable_logs = options.enable_logs;
            let engine = OverflowEngine::attach_with_options(host, slide, options)?;
            if enable_logs {
                tracing::info!(
                    target: "slidefence.engine",
                    slide = %indices,
                    container = %slide,
                    "slide bound"
                );
            }
            self.bound.push(Bound {
                slide,
                indices,
                engine,
            });
        }
        self.current = Some(slide);
        let count = self.current_violations();
        if count > 0 {
            tracing::warn!(
                target: "slidefence.engine",
                slide = %indices,
                violations = count,
                "slide has overflowing elements"
            );
        }
        Ok(count)
    }

    pub fn current_slide(&self) -> Option<NodeId> {
        self.current
    }

    /// Violations on the current slide (zero before any event).
    pub fn current_violations(&self) -> usize {
        self.current
            .and_then(|s| self.engine(s))
            .map_or(0, |e| e.stats().current_violations)
    }

    pub fn engine(&self, slide: NodeId) -> Option<&OverflowEngine> {
        self.bound
            .iter()
            .find(|b| b.slide == slide)
            .map(|b| &b.engine)
    }

    pub fn engine_mut(&mut self, slide: NodeId) -> Option<&mut OverflowEngine> {
        self.bound
            .iter_mut()
            .find(|b| b.slide == slide)
            .map(|b| &mut b.engine)
    }

    /// Bound slides in binding order.
    pub fn slides(&self) -> impl Iterator<Item = (NodeId, SlideIndices)> + '_ {
        self.bound.iter().map(|b| (b.slide, b.indices))
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn handle<H: DocumentHost>(&mut self, host: &mut H, notification: &HostNotification) {
        for b in &mut self.bound {
            b.engine.handle(host, notification);
        }
    }

    pub fn tick<H: DocumentHost>(&mut self, host: &mut H) {
        for b in &mut self.bound {
            b.engine.tick(host);
        }
    }

    /// Destroy every bound engine.
    pub fn shutdown(&mut self) {
        for b in &mut self.bound {
            b.engine.destroy();
        }
        self.bound.clear();
        self.current = None;
    }
}
