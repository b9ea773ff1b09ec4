#![forbid(unsafe_code)]

//! Typed names for the style properties the engine reads and writes.
//!
//! Hosts address properties by their CSS (kebab-case) name; the engine only
//! ever touches the closed set below, which keeps host adapters honest about
//! what they must support.

use std::fmt;

/// A style property managed or inspected by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StyleProperty {
    BoxSizing,
    Contain,
    Display,
    FontSize,
    Height,
    Left,
    MaxHeight,
    MaxWidth,
    Overflow,
    OverflowX,
    OverflowY,
    Padding,
    Position,
    TextOverflow,
    Top,
    Visibility,
    Width,
}

impl StyleProperty {
    /// Every property, in CSS-name order.
    pub const ALL: [StyleProperty; 17] = [
        Self::BoxSizing,
        Self::Contain,
        Self::Display,
        Self::FontSize,
        Self::Height,
        Self::Left,
        Self::MaxHeight,
        Self::MaxWidth,
        Self::Overflow,
        Self::OverflowX,
        Self::OverflowY,
        Self::Padding,
        Self::Position,
        Self::TextOverflow,
        Self::Top,
        Self::Visibility,
        Self::Width,
    ];

    /// CSS property name.
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::BoxSizing => "box-sizing",
            Self::Contain => "contain",
            Self::Display => "display",
            Self::FontSize => "font-size",
            Self::Height => "height",
            Self::Left => "left",
            Self::MaxHeight => "max-height",
            Self::MaxWidth => "max-width",
            Self::Overflow => "overflow",
            Self::OverflowX => "overflow-x",
            Self::OverflowY => "overflow-y",
            Self::Padding => "padding",
            Self::Position => "position",
            Self::TextOverflow => "text-overflow",
            Self::Top => "top",
            Self::Visibility => "visibility",
            Self::Width => "width",
        }
    }

    /// Look up a property by CSS name.
    pub fn from_css_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.css_name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_name())
    }
}

/// Computed `position` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Position {
    #[default]
    Static,
    Relative,
    Absolute,
    Fixed,
    Sticky,
}

impl Position {
    /// Parse a computed `position` value; unknown values read as `static`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "relative" => Self::Relative,
            "absolute" => Self::Absolute,
            "fixed" => Self::Fixed,
            "sticky" => Self::Sticky,
            _ => Self::Static,
        }
    }

    /// Out-of-flow positioning whose offsets the engine may rewrite.
    #[inline]
    pub const fn is_out_of_flow(self) -> bool {
        matches!(self, Self::Absolute | Self::Fixed)
    }
}

/// Parse the leading number of a CSS length the way `parseFloat` does:
/// `"12.5px"` → `12.5`, `"1em"` → `1.0`, `"auto"` → `None`.
///
/// Shorthands like `"4px 8px"` yield their first component.
pub fn parse_px(value: &str) -> Option<f64> {
    let s = value.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, ch) in s.char_indices() {
        match ch {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + ch.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Format a pixel length, trimming redundant fractional zeros.
pub fn format_px(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 {
        format!("{}px", rounded as i64)
    } else {
        format!("{rounded}px")
    }
}
