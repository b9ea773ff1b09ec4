//! The overflow engine.
//!
//! One [`OverflowEngine`] guards one container. It owns no host: every
//! operation that touches the document takes the host by `&mut`, and the
//! embedder drives the engine by forwarding host notifications to
//! [`OverflowEngine::handle`] and calling [`OverflowEngine::tick`] from its
//! frame or timer loop.
//!
//! All change sources (watchers, sweeps, forced checks) end in the same
//! per-element check, so detection and remediation behave identically no
//! matter what triggered them.
//!
//! # Invariants
//!
//! 1. After [`stop`](OverflowEngine::stop) the engine performs no
//!    measurement and no mutation until [`start`](OverflowEngine::start).
//! 2. A ledger entry exists for an element iff its latest check exceeded the
//!    threshold.
//! 3. In auto-fix mode an element receives at most `max_iterations`
//!    remediation actions while it stays in violation. Strict mode clamps
//!    again on every detection.
//!
//! # Failure Modes
//!
//! - Missing host capability: the affected watcher stays disconnected, a
//!   warning is logged, and detection falls back to the remaining watchers
//!   plus the sweeper.
//! - Host write failure for one element: logged, the scan continues.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use slidefence_backend::{DocumentHost, DocumentView, HostNotification, NodeId, ObserverKind};
use slidefence_core::{EngineConfig, EngineOptions, Mode};

use crate::constraints::{Constraints, harden_container};
use crate::error::EngineError;
use crate::ledger::{Ledger, Violation};
use crate::prober::Prober;
use crate::readiness::{Readiness, ReadinessGate};
use crate::remediation::{Remedy, Target, strategy_for};
use crate::sweeper::{SweepDecision, Sweeper};
use crate::watchers::{Recheck, WatcherSet};

/// Informational events honour `enable_logs`; warnings never do.
macro_rules! info_if {
    ($enabled:expr, $($arg:tt)+) => {
        if $enabled {
            tracing::info!($($arg)+);
        }
    };
}

/// Counters since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    /// Element checks performed.
    pub total_checks: u64,
    /// Detections (one per check that exceeded the threshold).
    pub violations: u64,
    /// Auto-fix actions applied.
    pub fixes: u64,
    /// Clamp actions applied.
    pub prevented: u64,
    /// Entries currently in the ledger.
    pub current_violations: usize,
    pub is_active: bool,
    pub sweeps: u64,
    pub skipped_sweeps: u64,
    /// Elements that reached the auto-fix remediation limit.
    pub accepted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanReason {
    Initial,
    Forced,
    Sweep,
}

impl ScanReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Forced => "forced",
            Self::Sweep => "sweep",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    total_checks: u64,
    violations: u64,
    fixes: u64,
    prevented: u64,
    accepted: u64,
}

#[derive(Debug)]
pub struct OverflowEngine {
    container: NodeId,
    config: EngineConfig,
    prober: Prober,
    constraints: Constraints,
    ledger: Ledger,
    watchers: WatcherSet,
    sweeper: Sweeper,
    readiness: ReadinessGate,
    active: bool,
    pending: Option<ScanReason>,
    counters: Counters,
    accepted: FxHashSet<NodeId>,
}

impl OverflowEngine {
    /// Bind an engine to `container` and start it.
    ///
    /// Fails if the container is not attached. The initial scan runs
    /// immediately when the host is ready, otherwise on a later tick.
    pub fn attach<H: DocumentHost>(
        host: &mut H,
        container: NodeId,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if !host.is_connected(container) {
            return Err(EngineError::ContainerMissing(container));
        }
        let mut engine = Self {
            container,
            prober: Prober::new(container),
            constraints: Constraints::new(),
            ledger: Ledger::new(),
            watchers: WatcherSet::default(),
            sweeper: Sweeper::new(config.check_interval()),
            readiness: ReadinessGate::new(config.readiness_timeout()),
            active: false,
            pending: None,
            counters: Counters::default(),
            accepted: FxHashSet::default(),
            config,
        };
        engine.start(host);
        Ok(engine)
    }

    /// Validate `options` and [`attach`](Self::attach).
    pub fn attach_with_options<H: DocumentHost>(
        host: &mut H,
        container: NodeId,
        options: EngineOptions,
    ) -> Result<Self, EngineError> {
        let config = options.build()?;
        Self::attach(host, container, config)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Connect watchers, harden the container, arm the sweeper, and request
    /// an initial scan. No-op when already active.
    pub fn start<H: DocumentHost>(&mut self, host: &mut H) {
        if self.active {
            return;
        }
        self.active = true;

        let kinds: Vec<ObserverKind> = ObserverKind::ALL
            .into_iter()
            .filter(|k| *k != ObserverKind::Size || self.config.auto_resize())
            .collect();
        for kind in self.watchers.connect(&kinds, host.capabilities()) {
            let err = EngineError::ObserverUnsupported(kind);
            tracing::warn!(
                target: "slidefence.watch",
                container = %self.container,
                observer = %kind,
                error = %err,
                "observer unavailable; relying on remaining sources"
            );
        }
        if self.watchers.is_connected(ObserverKind::Boundary) {
            host.observe_intersections(self.container);
        }
        self.watchers.size.observe(self.container);

        if self.config.constrain_container() {
            if let Err(err) = harden_container(host, self.container) {
                tracing::warn!(
                    target: "slidefence.engine",
                    container = %self.container,
                    error = %err,
                    "failed to harden container"
                );
            }
        }

        self.sweeper.arm(host.now_mono());
        info_if!(
            self.config.enable_logs(),
            target: "slidefence.engine",
            container = %self.container,
            mode = self.config.mode().as_str(),
            threshold = self.config.threshold(),
            interval_ms = self.config.check_interval().as_millis() as u64,
            "engine started"
        );
        self.request_scan(host, ScanReason::Initial);
    }

    /// Disconnect watchers and cancel the sweeper, including any deferred
    /// scan. The ledger is kept.
    pub fn stop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        self.sweeper.cancel();
        self.watchers.disconnect_all();
        self.pending = None;
        self.readiness.reset();
        info_if!(
            self.config.enable_logs(),
            target: "slidefence.engine",
            container = %self.container,
            "engine stopped"
        );
    }

    /// [`stop`](Self::stop) and forget all per-element state.
    pub fn destroy(&mut self) {
        self.stop();
        self.ledger.clear_all();
        self.constraints.clear();
        self.accepted.clear();
    }

    /// Re-probe every element, subject to the readiness gate.
    pub fn force_check<H: DocumentHost>(&mut self, host: &mut H) {
        if !self.active {
            return;
        }
        self.request_scan(host, ScanReason::Forced);
    }

    /// Advance time-based work: retry a deferred scan and run a sweep if due.
    pub fn tick<H: DocumentHost>(&mut self, host: &mut H) {
        if !self.active {
            return;
        }
        if self.pending.is_some() {
            self.run_pending(host);
        }
        match self.sweeper.poll(host.now_mono(), self.pending.is_some()) {
            SweepDecision::Due => self.request_scan(host, ScanReason::Sweep),
            SweepDecision::Skipped => tracing::debug!(
                target: "slidefence.sweep",
                container = %self.container,
                skipped = self.sweeper.skipped(),
                "sweep skipped; previous scan still pending"
            ),
            SweepDecision::Idle => {}
        }
    }

    /// Feed one host notification through the watchers.
    pub fn handle<H: DocumentHost>(&mut self, host: &mut H, notification: &HostNotification) {
        if !self.active {
            return;
        }
        let requests = self.watchers.translate(&*host, self.container, notification);
        for request in requests {
            self.recheck(host, request);
        }
    }

    /// Disconnect a single watcher. Returns whether it was connected.
    pub fn disconnect_watcher(&mut self, kind: ObserverKind) -> bool {
        let was = self.watchers.disconnect(kind);
        if was {
            info_if!(
                self.config.enable_logs(),
                target: "slidefence.watch",
                container = %self.container,
                observer = %kind,
                "observer disconnected"
            );
        }
        was
    }

    pub fn connected_watchers(&self) -> Vec<ObserverKind> {
        self.watchers.connected()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    #[inline]
    pub fn container(&self) -> NodeId {
        self.container
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a full scan is waiting on the readiness gate.
    #[inline]
    pub fn is_scan_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshot of current violations, ordered by element.
    pub fn violations(&self) -> Vec<Violation> {
        self.ledger.all()
    }

    pub fn violation(&self, element: NodeId) -> Option<&Violation> {
        self.ledger.get(element)
    }

    pub fn is_constrained(&self, element: NodeId) -> bool {
        self.constraints.is_marked(element)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_checks: self.counters.total_checks,
            violations: self.counters.violations,
            fixes: self.counters.fixes,
            prevented: self.counters.prevented,
            current_violations: self.ledger.len(),
            is_active: self.active,
            sweeps: self.sweeper.sweeps(),
            skipped_sweeps: self.sweeper.skipped(),
            accepted: self.counters.accepted,
        }
    }

    // -----------------------------------------------------------------------
    // Scans
    // -----------------------------------------------------------------------

    fn request_scan<H: DocumentHost>(&mut self, host: &mut H, reason: ScanReason) {
        // A pending sweep keeps its identity so the sweeper is released.
        self.pending = Some(match self.pending {
            Some(ScanReason::Sweep) => ScanReason::Sweep,
            _ => reason,
        });
        self.run_pending(host);
    }

    fn run_pending<H: DocumentHost>(&mut self, host: &mut H) {
        let Some(reason) = self.pending else {
            return;
        };
        if !self.active {
            self.pending = None;
            return;
        }
        match self
            .readiness
            .check(host.is_ready(self.container), host.now_mono())
        {
            Readiness::Wait => {
                tracing::debug!(
                    target: "slidefence.engine",
                    container = %self.container,
                    reason = reason.as_str(),
                    "host not ready; scan deferred"
                );
                return;
            }
            Readiness::TimedOut => tracing::warn!(
                target: "slidefence.engine",
                container = %self.container,
                reason = reason.as_str(),
                "readiness timeout elapsed; scanning anyway"
            ),
            Readiness::Ready => {}
        }

        self.pending = None;
        let pruned = if reason == ScanReason::Initial {
            0
        } else {
            self.prune(host)
        };
        self.scan(host);
        if reason == ScanReason::Sweep {
            self.sweeper.finish();
            tracing::debug!(
                target: "slidefence.sweep",
                container = %self.container,
                pruned,
                violations = self.ledger.len(),
                "sweep complete"
            );
        }
    }

    fn scan<H: DocumentHost>(&mut self, host: &mut H) {
        let view = DocumentView::capture(&*host, self.container);
        for node in host.descendants(self.container) {
            self.visit(host, &view, node);
        }
    }

    fn is_excluded(&self, view: &DocumentView, node: NodeId) -> bool {
        view.element(node)
            .is_some_and(|element| self.config.is_excluded(&element))
    }

    /// Constrain, observe, and check one element.
    fn visit<H: DocumentHost>(&mut self, host: &mut H, view: &DocumentView, node: NodeId) {
        if !self.active {
            return;
        }
        if self.is_excluded(view, node) {
            self.forget(node);
            return;
        }
        if let Err(err) = self.constraints.apply(host, node) {
            tracing::warn!(
                target: "slidefence.engine",
                element = %node,
                error = %err,
                "failed to apply constraints"
            );
        }
        self.watchers.size.observe(node);
        self.measure(host, node);
    }

    fn recheck<H: DocumentHost>(&mut self, host: &mut H, request: Recheck) {
        match request {
            Recheck::Element(node) => {
                if node == self.container {
                    return;
                }
                if self.is_excluded(&DocumentView::capture(&*host, node), node) {
                    self.forget(node);
                    return;
                }
                self.measure(host, node);
            }
            Recheck::Subtree(node) => {
                let view = DocumentView::capture(&*host, node);
                self.visit(host, &view, node);
                for d in host.descendants(node) {
                    self.visit(host, &view, d);
                }
            }
            Recheck::FullScan => self.scan(host),
            Recheck::Forget(node) => {
                self.forget(node);
                self.prune(host);
            }
        }
    }

    fn prune<H: DocumentHost>(&mut self, host: &H) -> usize {
        let pruned = self.ledger.prune(|id| host.is_connected(id));
        self.constraints.retain(|id| host.is_connected(id));
        self.watchers.retain(|id| host.is_connected(id));
        self.accepted.retain(|id| host.is_connected(*id));
        pruned
    }

    fn forget(&mut self, node: NodeId) {
        self.ledger.clear(node);
        self.accepted.remove(&node);
    }

    // -----------------------------------------------------------------------
    // Check + remediate
    // -----------------------------------------------------------------------

    fn measure<H: DocumentHost>(&mut self, host: &mut H, element: NodeId) {
        if !self.active || element == self.container {
            return;
        }
        self.counters.total_checks += 1;

        let Some(probe) = self.prober.probe(&*host, element) else {
            self.forget(element);
            return;
        };

        if !probe.overflow.exceeds(self.config.threshold()) {
            if self.ledger.clear(element).is_some() {
                self.accepted.remove(&element);
                info_if!(
                    self.config.enable_logs(),
                    target: "slidefence.engine",
                    element = %identify(&*host, element),
                    "overflow resolved"
                );
            }
            return;
        }

        self.counters.violations += 1;
        let mode = self.config.mode();
        // Auto-fix retries are capped per element; strict clamps again on
        // every detection. A capped entry keeps its `fixed` flag.
        let prior = self.ledger.get(element).map(|v| (v.attempts, v.fixed));
        let capped = mode == Mode::AutoFix
            && prior.is_some_and(|(attempts, _)| attempts >= self.config.max_iterations());
        let fixed = capped && prior.is_some_and(|(_, fixed)| fixed);
        let attempts = self
            .ledger
            .record_with(element, probe.overflow, host.now_mono(), fixed)
            .attempts;
        let o = probe.overflow;
        info_if!(
            self.config.enable_logs(),
            target: "slidefence.engine",
            element = %identify(&*host, element),
            top = o.top,
            right = o.right,
            bottom = o.bottom,
            left = o.left,
            "overflow detected"
        );

        if !mode.mutates() {
            return;
        }
        if capped {
            if self.accepted.insert(element) {
                self.counters.accepted += 1;
                tracing::warn!(
                    target: "slidefence.remediate",
                    element = %identify(&*host, element),
                    attempts,
                    "remediation limit reached; accepting overflow"
                );
            }
            return;
        }

        let target = Target {
            element,
            overflow: probe.overflow,
            element_rect: probe.element,
            container_rect: probe.container,
        };
        let result = strategy_for(mode).remediate(&mut *host, &target);
        if let Some(v) = self.ledger.get_mut(element) {
            v.attempts = v.attempts.saturating_add(1);
        }
        match result {
            Ok(remedy) => {
                if remedy.mutated() {
                    self.ledger.mark_fixed(element);
                }
                if matches!(remedy, Remedy::Clamped { .. }) {
                    self.counters.prevented += 1;
                }
                if mode == Mode::AutoFix {
                    self.counters.fixes += 1;
                }
                info_if!(
                    self.config.enable_logs(),
                    target: "slidefence.remediate",
                    element = %identify(&*host, element),
                    mode = mode.as_str(),
                    remedy = ?remedy,
                    "remediation applied"
                );
            }
            Err(err) => tracing::warn!(
                target: "slidefence.remediate",
                element = %identify(&*host, element),
                error = %err,
                "remediation failed"
            ),
        }
    }
}

/// `<tag#id.class>` for logs, falling back to the node id.
fn identify<H: DocumentHost + ?Sized>(host: &H, element: NodeId) -> String {
    host.describe(element)
        .map(|d| d.identifier())
        .unwrap_or_else(|| element.to_string())
}
