// crates/carto-core/src/style.rs

//! # Style Resolver
//!
//! Feature styles are a pure function of `(feature, selection)`. Nothing
//! remembers which feature was highlighted before: on every selection change
//! the whole layer is recomputed with [`restyle_all`], so a stale highlight
//! cannot survive. At province scale (tens of features) the full redraw is
//! negligible.

use crate::index::resolve_name;
use crate::layer::{Feature, GeometryLayer};
use serde::Serialize;
use std::fmt;

/// RGBA color; alpha in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// `#rrggbb` when opaque, `rgba(r,g,b,a)` otherwise.
    pub fn to_css(self) -> String {
        if self.a >= 1.0 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_css())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Font {
    pub size_px: f32,
    pub bold: bool,
    pub family: &'static str,
}

impl Font {
    /// CSS shorthand, e.g. `bold 14px Arial`.
    pub fn css(&self) -> String {
        if self.bold {
            format!("bold {}px {}", self.size_px, self.family)
        } else {
            format!("{}px {}", self.size_px, self.family)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStyle {
    pub text: String,
    pub font: Font,
    pub fill: Color,
    pub halo: Stroke,
}

/// Full visual state of one feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Style {
    pub stroke: Stroke,
    pub fill: Color,
    pub label: LabelStyle,
}

impl Style {
    pub fn is_highlighted(&self) -> bool {
        self.stroke == SELECTED_STROKE
    }
}

const LABEL_FAMILY: &str = "Arial";

const LABEL_HALO: Stroke = Stroke {
    color: Color::rgb(255, 255, 255),
    width: 2.5,
};

pub const SELECTED_STROKE: Stroke = Stroke {
    color: Color::rgb(0xfa, 0xcc, 0x15),
    width: 3.5,
};
const SELECTED_FILL: Color = Color::rgba(250, 204, 21, 0.3);
const SELECTED_FONT: Font = Font {
    size_px: 14.0,
    bold: true,
    family: LABEL_FAMILY,
};
const SELECTED_LABEL: Color = Color::rgb(0, 0, 0);

pub const IDLE_STROKE: Stroke = Stroke {
    color: Color::rgb(0x1e, 0x29, 0x3b),
    width: 1.0,
};
const IDLE_FILL: Color = Color::rgba(30, 41, 59, 0.03);
const IDLE_FONT: Font = Font {
    size_px: 11.0,
    bold: false,
    family: LABEL_FAMILY,
};
const IDLE_LABEL: Color = Color::rgb(0x64, 0x74, 0x8b);

/// Style of `feature` given the currently selected entity name.
///
/// A feature is highlighted when its resolved name equals `selected`.
/// Features without a resolvable name are never highlighted.
pub fn style_for(feature: &Feature, selected: Option<&str>) -> Style {
    let name = resolve_name(feature);
    let highlighted = name.is_some() && name == selected;
    let text = name.unwrap_or_default().to_owned();

    if highlighted {
        Style {
            stroke: SELECTED_STROKE,
            fill: SELECTED_FILL,
            label: LabelStyle {
                text,
                font: SELECTED_FONT,
                fill: SELECTED_LABEL,
                halo: LABEL_HALO,
            },
        }
    } else {
        Style {
            stroke: IDLE_STROKE,
            fill: IDLE_FILL,
            label: LabelStyle {
                text,
                font: IDLE_FONT,
                fill: IDLE_LABEL,
                halo: LABEL_HALO,
            },
        }
    }
}

/// Styles for every feature of the layer, indexed by `FeatureId`.
pub fn restyle_all(layer: &GeometryLayer, selected: Option<&str>) -> Vec<Style> {
    layer
        .features()
        .iter()
        .map(|f| style_for(f, selected))
        .collect()
}
