//! Whole-slide overflow audit.
//!
//! Two measurements are cross-checked for every slide:
//!
//! - **scroll**: the slide's scroll extent against its client box.
//! - **bbox**: the union of visible descendant boxes against the slide box.
//!
//! A slide overflows when either method exceeds the tolerance on either
//! axis. The reported amount per axis is the larger of the two methods,
//! rounded up to whole pixels.
//!
//! The audit reads only; it never writes styles. Callers wait for host
//! readiness before auditing.

use slidefence_backend::{DocumentHost, DocumentView, NodeId, ScrollMetrics};
use slidefence_core::{Overflow, Rect, SelectorList, StyleProperty};
use slidefence_runtime::SlideIndices;

use crate::error::{ReportError, Result};
use crate::report::{
    AxisFlags, Extent, Methods, OverflowAmount, OverflowFlags, OverflowReport, ReportConfig,
    SlideResult,
};

/// Tolerance in pixels below which a measurement does not count.
pub const EPS_PX: f64 = 2.0;

/// Speaker notes never count toward content bounds.
pub const DEFAULT_IGNORE: &str = "aside.notes";

pub const UNTITLED: &str = "Untitled";

const TITLE_TAGS: [&str; 3] = ["h1", "h2", "h3"];

#[derive(Debug, Clone, PartialEq)]
pub struct AuditOptions {
    /// 1-based linear index recorded in the result.
    pub index: u32,
    pub indices: SlideIndices,
    pub eps: f64,
    /// Subtrees matching this selector list are left out of the bbox union.
    pub ignore: String,
}

impl AuditOptions {
    pub fn new(index: u32, indices: SlideIndices) -> Self {
        Self {
            index,
            indices,
            eps: EPS_PX,
            ignore: DEFAULT_IGNORE.to_string(),
        }
    }

    #[must_use]
    pub fn eps(mut self, px: f64) -> Self {
        self.eps = px;
        self
    }

    #[must_use]
    pub fn ignore(mut self, selectors: impl Into<String>) -> Self {
        self.ignore = selectors.into();
        self
    }
}

/// A slide to audit and its position in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckSlide {
    pub node: NodeId,
    pub indices: SlideIndices,
}

/// Audit one slide.
///
/// # Errors
///
/// [`ReportError::SlideMissing`] when the slide is detached or has no box;
/// [`ReportError::Selector`] when `options.ignore` does not parse.
pub fn audit_slide<H: DocumentHost + ?Sized>(
    host: &H,
    slide: NodeId,
    options: &AuditOptions,
) -> Result<SlideResult> {
    let slide_rect = host
        .bounding_rect(slide)
        .filter(|_| host.is_connected(slide))
        .ok_or(ReportError::SlideMissing(slide))?;
    let ignore = SelectorList::parse(&options.ignore)?;
    let eps = options.eps;

    let metrics = host.scroll_metrics(slide).unwrap_or(ScrollMetrics {
        scroll_width: slide_rect.width,
        scroll_height: slide_rect.height,
        client_width: slide_rect.width,
        client_height: slide_rect.height,
    });
    let scroll = AxisFlags {
        v: metrics.scroll_height - metrics.client_height > eps,
        h: metrics.scroll_width - metrics.client_width > eps,
    };

    let content = content_bounds(host, slide, &ignore).unwrap_or(slide_rect);
    let sides = Overflow::measure(&content, &slide_rect);
    let bbox_vertical = whole_px(sides.vertical());
    let bbox_horizontal = whole_px(sides.horizontal());
    let bbox = AxisFlags {
        v: f64::from(bbox_vertical) > eps,
        h: f64::from(bbox_horizontal) > eps,
    };

    let overflow = OverflowFlags {
        vertical: scroll.v || bbox.v,
        horizontal: scroll.h || bbox.h,
        y: computed_or_visible(host, slide, StyleProperty::OverflowY),
        x: computed_or_visible(host, slide, StyleProperty::OverflowX),
        methods: Methods { scroll, bbox },
    };
    let has_overflow = overflow.vertical || overflow.horizontal;
    let overflow_amount = OverflowAmount {
        vertical: whole_px(metrics.vertical_excess()).max(bbox_vertical),
        horizontal: whole_px(metrics.horizontal_excess()).max(bbox_horizontal),
    };

    tracing::debug!(
        target: "slidefence.report",
        slide = %slide,
        index = options.index,
        indices = %options.indices,
        vertical = overflow_amount.vertical,
        horizontal = overflow_amount.horizontal,
        has_overflow,
        "slide audited"
    );

    Ok(SlideResult {
        title: slide_title(host, slide),
        rect: Extent {
            width: slide_rect.width,
            height: slide_rect.height,
        },
        scroll: Extent {
            width: metrics.scroll_width,
            height: metrics.scroll_height,
        },
        client: Extent {
            width: metrics.client_width,
            height: metrics.client_height,
        },
        overflow,
        has_overflow,
        overflow_amount,
        index: options.index,
        indices: options.indices,
    })
}

/// Audit every slide in deck order and assemble the report.
///
/// Linear indices are assigned 1-based in the order given.
pub fn audit_deck<H: DocumentHost + ?Sized>(
    host: &H,
    slides: &[DeckSlide],
    config: ReportConfig,
) -> Result<OverflowReport> {
    let mut results = Vec::with_capacity(slides.len());
    for (i, slide) in slides.iter().enumerate() {
        let index = u32::try_from(i + 1).unwrap_or(u32::MAX);
        results.push(audit_slide(
            host,
            slide.node,
            &AuditOptions::new(index, slide.indices),
        )?);
    }
    let report = OverflowReport::new(config, results);
    tracing::info!(
        target: "slidefence.report",
        total = report.summary.total,
        overflow = report.summary.overflow,
        "deck audited"
    );
    Ok(report)
}

/// Text of the first `h1`, `h2`, or `h3` in document order, trimmed.
pub fn slide_title<H: DocumentHost + ?Sized>(host: &H, slide: NodeId) -> String {
    host.descendants(slide)
        .into_iter()
        .find(|&node| {
            host.describe(node)
                .is_some_and(|d| TITLE_TAGS.contains(&d.tag.as_str()))
        })
        .and_then(|heading| host.text_content(heading))
        .map_or_else(|| UNTITLED.to_string(), |text| text.trim().to_string())
}

/// Union of the boxes of every rendered descendant outside `ignore`.
/// `None` when nothing qualifies.
fn content_bounds<H: DocumentHost + ?Sized>(
    host: &H,
    slide: NodeId,
    ignore: &SelectorList,
) -> Option<Rect> {
    let view = DocumentView::capture(host, slide);
    host.descendants(slide)
        .into_iter()
        .filter(|&node| {
            view.element(node)
                .is_none_or(|element| !ignore.matches_self_or_ancestor(&element))
        })
        .filter(|&node| is_rendered(host, node, slide))
        .filter_map(|node| host.bounding_rect(node))
        .reduce(|acc, r| acc.union(&r))
}

/// Visible itself and not removed from layout by a `display: none`
/// ancestor inside the slide.
fn is_rendered<H: DocumentHost + ?Sized>(host: &H, node: NodeId, slide: NodeId) -> bool {
    if host.computed_style(node, StyleProperty::Visibility).as_deref() == Some("hidden") {
        return false;
    }
    let mut cursor = Some(node);
    while let Some(current) = cursor {
        if current == slide {
            return true;
        }
        if host.computed_style(current, StyleProperty::Display).as_deref() == Some("none") {
            return false;
        }
        cursor = host.parent(current);
    }
    true
}

fn computed_or_visible<H: DocumentHost + ?Sized>(
    host: &H,
    node: NodeId,
    property: StyleProperty,
) -> String {
    host.computed_style(node, property)
        .unwrap_or_else(|| "visible".to_string())
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_px(px: f64) -> u32 {
    if px.is_finite() && px > 0.0 {
        px.ceil() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_px_rounds_up_and_clamps() {
        assert_eq!(whole_px(0.0), 0);
        assert_eq!(whole_px(-4.0), 0);
        assert_eq!(whole_px(f64::NAN), 0);
        assert_eq!(whole_px(0.2), 1);
        assert_eq!(whole_px(80.0), 80);
        assert_eq!(whole_px(80.01), 81);
    }

    #[test]
    fn options_builder() {
        let opts = AuditOptions::new(3, SlideIndices::new(2, 1))
            .eps(5.0)
            .ignore(".notes, aside");
        assert_eq!(opts.index, 3);
        assert_eq!(opts.eps, 5.0);
        assert_eq!(opts.ignore, ".notes, aside");
    }
}
