//! Remediation strategies.
//!
//! A strategy takes one confirmed violation and applies at most one action
//! to the host. Actions are not verified here; the next check of the element
//! (triggered by the resulting style mutation, a resize, or the sweeper)
//! decides whether the violation is gone.
//!
//! # Failure Modes
//!
//! A rejected style write aborts the action and is returned to the engine,
//! which logs it and moves on to the next element.

use slidefence_backend::{DocumentHost, HostError, NodeId};
use slidefence_core::{Mode, Overflow, Position, Rect, Side, StyleProperty, format_px, parse_px};

/// Font sizes at or below this are never shrunk further.
pub const MIN_FONT_SIZE_PX: f64 = 10.0;
pub const FONT_SCALE: f64 = 0.95;
pub const PADDING_SCALE: f64 = 0.8;

/// A violation handed to a strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    pub element: NodeId,
    pub overflow: Overflow,
    pub element_rect: Rect,
    pub container_rect: Rect,
}

/// What a strategy did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Remedy {
    /// Sizes capped (and position shifted) on `sides`, content clipped.
    Clamped { sides: Side },
    FontSize { from: f64, to: f64 },
    Padding { from: f64, to: f64 },
    /// Recorded only.
    Observed,
}

impl Remedy {
    /// Whether the host was mutated.
    pub const fn mutated(&self) -> bool {
        !matches!(self, Self::Observed)
    }
}

pub trait RemediationStrategy {
    fn mode(&self) -> Mode;

    fn remediate(&self, host: &mut dyn DocumentHost, target: &Target) -> Result<Remedy, HostError>;
}

/// Cap the element to the container and clip it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictClamp;

/// Shrink text, then padding, then fall back to [`StrictClamp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoFix;

/// Never mutate.
#[derive(Debug, Clone, Copy, Default)]
pub struct WarnOnly;

static STRICT: StrictClamp = StrictClamp;
static AUTO_FIX: AutoFix = AutoFix;
static WARN: WarnOnly = WarnOnly;

/// Strategy implementing `mode`.
pub fn strategy_for(mode: Mode) -> &'static dyn RemediationStrategy {
    match mode {
        Mode::Strict => &STRICT,
        Mode::AutoFix => &AUTO_FIX,
        Mode::Warn => &WARN,
    }
}

impl RemediationStrategy for StrictClamp {
    fn mode(&self) -> Mode {
        Mode::Strict
    }

    fn remediate(&self, host: &mut dyn DocumentHost, target: &Target) -> Result<Remedy, HostError> {
        clamp(host, target).map(|sides| Remedy::Clamped { sides })
    }
}

impl RemediationStrategy for AutoFix {
    fn mode(&self) -> Mode {
        Mode::AutoFix
    }

    fn remediate(&self, host: &mut dyn DocumentHost, target: &Target) -> Result<Remedy, HostError> {
        let o = &target.overflow;
        if o.bottom > 0.0 || o.right > 0.0 {
            let el = target.element;
            let font = host
                .computed_style(el, StyleProperty::FontSize)
                .and_then(|v| parse_px(&v));
            if let Some(from) = font.filter(|f| *f > MIN_FONT_SIZE_PX) {
                let to = (from * FONT_SCALE).max(MIN_FONT_SIZE_PX);
                write(host, el, StyleProperty::FontSize, &format_px(to))?;
                return Ok(Remedy::FontSize { from, to });
            }
            let padding = host
                .computed_style(el, StyleProperty::Padding)
                .and_then(|v| parse_px(&v))
                .unwrap_or(0.0);
            if padding > 0.0 {
                let to = padding * PADDING_SCALE;
                write(host, el, StyleProperty::Padding, &format_px(to))?;
                return Ok(Remedy::Padding { from: padding, to });
            }
        }
        clamp(host, target).map(|sides| Remedy::Clamped { sides })
    }
}

impl RemediationStrategy for WarnOnly {
    fn mode(&self) -> Mode {
        Mode::Warn
    }

    fn remediate(&self, _host: &mut dyn DocumentHost, _target: &Target) -> Result<Remedy, HostError> {
        Ok(Remedy::Observed)
    }
}

/// Write only when the inline value differs, so re-applying an identical
/// clamp produces no mutation record.
fn write(
    host: &mut dyn DocumentHost,
    element: NodeId,
    property: StyleProperty,
    value: &str,
) -> Result<(), HostError> {
    if host.inline_style(element, property).as_deref() == Some(value) {
        return Ok(());
    }
    host.set_inline_style(element, property, value)
}

/// Shift (out-of-flow only) and cap each overflowing axis, then clip.
fn clamp(host: &mut dyn DocumentHost, target: &Target) -> Result<Side, HostError> {
    let el = target.element;
    let o = &target.overflow;
    let e = &target.element_rect;
    let c = &target.container_rect;
    let sides = o.sides();
    let out_of_flow = host
        .computed_style(el, StyleProperty::Position)
        .map(|v| Position::parse(&v).is_out_of_flow())
        .unwrap_or(false);

    if sides.intersects(Side::HORIZONTAL) {
        let mut start = e.left();
        if out_of_flow {
            let delta = if o.left > 0.0 {
                o.left
            } else {
                -o.right.min((e.left() - c.left()).max(0.0))
            };
            if delta != 0.0 {
                if let Some(offset) = host
                    .computed_style(el, StyleProperty::Left)
                    .and_then(|v| parse_px(&v))
                {
                    write(host, el, StyleProperty::Left, &format_px(offset + delta))?;
                    start += delta;
                }
            }
        }
        let max = (c.right() - start).max(0.0);
        write(host, el, StyleProperty::MaxWidth, &format_px(max))?;
    }

    if sides.intersects(Side::VERTICAL) {
        let mut start = e.top();
        if out_of_flow {
            let delta = if o.top > 0.0 {
                o.top
            } else {
                -o.bottom.min((e.top() - c.top()).max(0.0))
            };
            if delta != 0.0 {
                if let Some(offset) = host
                    .computed_style(el, StyleProperty::Top)
                    .and_then(|v| parse_px(&v))
                {
                    write(host, el, StyleProperty::Top, &format_px(offset + delta))?;
                    start += delta;
                }
            }
        }
        let max = (c.bottom() - start).max(0.0);
        write(host, el, StyleProperty::MaxHeight, &format_px(max))?;
    }

    write(host, el, StyleProperty::Overflow, "hidden")?;
    write(host, el, StyleProperty::TextOverflow, "ellipsis")?;
    Ok(sides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use slidefence_headless::{ElementSpec, HeadlessDocument};

    fn setup(child: ElementSpec) -> (HeadlessDocument, NodeId, NodeId) {
        let mut doc = HeadlessDocument::new(1920.0, 1080.0);
        let root = doc.root();
        let section = doc
            .append(root, ElementSpec::new("section").rect(0.0, 0.0, 1920.0, 1080.0))
            .unwrap();
        let el = doc.append(section, child).unwrap();
        (doc, section, el)
    }

    fn target(doc: &HeadlessDocument, section: NodeId, el: NodeId) -> Target {
        let element_rect = doc.bounding_rect(el).unwrap();
        let container_rect = doc.bounding_rect(section).unwrap();
        Target {
            element: el,
            overflow: Overflow::measure(&element_rect, &container_rect),
            element_rect,
            container_rect,
        }
    }

    #[test]
    fn strict_caps_width_to_container() {
        let (mut doc, section, el) = setup(ElementSpec::new("div").rect(0.0, 0.0, 2000.0, 100.0));
        let t = target(&doc, section, el);
        let remedy = StrictClamp.remediate(&mut doc, &t).unwrap();
        assert_eq!(remedy, Remedy::Clamped { sides: Side::RIGHT });
        assert_eq!(
            doc.inline_style(el, StyleProperty::MaxWidth).as_deref(),
            Some("1920px")
        );
        assert_eq!(doc.inline_style(el, StyleProperty::MaxHeight), None);
        assert_eq!(
            doc.inline_style(el, StyleProperty::TextOverflow).as_deref(),
            Some("ellipsis")
        );
        let after = target(&doc, section, el);
        assert_eq!(after.overflow.right, 0.0);
    }

    #[test]
    fn strict_shifts_out_of_flow_elements_inside() {
        let (mut doc, section, el) = setup(
            ElementSpec::new("div")
                .position(Position::Absolute)
                .rect(1800.0, 1000.0, 300.0, 200.0),
        );
        let t = target(&doc, section, el);
        StrictClamp.remediate(&mut doc, &t).unwrap();
        assert_eq!(doc.inline_style(el, StyleProperty::Left).as_deref(), Some("1620px"));
        assert_eq!(doc.inline_style(el, StyleProperty::Top).as_deref(), Some("880px"));
        let after = target(&doc, section, el);
        assert_eq!(after.overflow, Overflow::NONE);
        assert_eq!(after.element_rect.width, 300.0);
    }

    #[test]
    fn strict_reapply_is_silent() {
        let (mut doc, section, el) = setup(ElementSpec::new("div").rect(0.0, 0.0, 2000.0, 100.0));
        let t = target(&doc, section, el);
        StrictClamp.remediate(&mut doc, &t).unwrap();
        doc.clear_style_writes();
        StrictClamp.remediate(&mut doc, &t).unwrap();
        assert!(doc.style_writes().is_empty());
    }

    #[test]
    fn auto_fix_shrinks_font_first() {
        let (mut doc, section, el) = setup(
            ElementSpec::new("p")
                .text("long")
                .font_size(20.0)
                .rect(0.0, 0.0, 100.0, 1200.0),
        );
        let t = target(&doc, section, el);
        assert_eq!(
            AutoFix.remediate(&mut doc, &t).unwrap(),
            Remedy::FontSize { from: 20.0, to: 19.0 }
        );
        assert_eq!(doc.inline_style(el, StyleProperty::FontSize).as_deref(), Some("19px"));
    }

    #[test]
    fn auto_fix_falls_back_to_padding_then_clamp() {
        let (mut doc, section, el) = setup(
            ElementSpec::new("p")
                .font_size(10.0)
                .padding(20.0)
                .rect(0.0, 0.0, 100.0, 1200.0),
        );
        let t = target(&doc, section, el);
        assert_eq!(
            AutoFix.remediate(&mut doc, &t).unwrap(),
            Remedy::Padding { from: 20.0, to: 16.0 }
        );

        let (mut doc, section, el) = setup(
            ElementSpec::new("p")
                .font_size(10.0)
                .rect(0.0, 0.0, 100.0, 1200.0),
        );
        let t = target(&doc, section, el);
        assert_eq!(
            AutoFix.remediate(&mut doc, &t).unwrap(),
            Remedy::Clamped { sides: Side::BOTTOM }
        );
    }

    #[test]
    fn auto_fix_clamps_top_left_overflow_directly() {
        let (mut doc, section, el) = setup(
            ElementSpec::new("p")
                .font_size(24.0)
                .rect(-40.0, 0.0, 100.0, 100.0),
        );
        let t = target(&doc, section, el);
        assert_eq!(
            AutoFix.remediate(&mut doc, &t).unwrap(),
            Remedy::Clamped { sides: Side::LEFT }
        );
        assert_eq!(doc.inline_style(el, StyleProperty::FontSize), None);
    }

    #[test]
    fn warn_never_writes() {
        let (mut doc, section, el) = setup(ElementSpec::new("div").rect(0.0, 0.0, 100.0, 1580.0));
        doc.clear_style_writes();
        let t = target(&doc, section, el);
        let remedy = strategy_for(Mode::Warn).remediate(&mut doc, &t).unwrap();
        assert!(!remedy.mutated());
        assert!(doc.style_writes().is_empty());
    }

    #[test]
    fn rejected_write_propagates() {
        let (mut doc, section, el) = setup(ElementSpec::new("div").rect(0.0, 0.0, 2000.0, 100.0));
        doc.reject_style_writes(el);
        let t = target(&doc, section, el);
        assert!(matches!(
            StrictClamp.remediate(&mut doc, &t),
            Err(HostError::RejectedStyle { .. })
        ));
    }
}
