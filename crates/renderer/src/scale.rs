//! Linear scales for choropleth fills and bubble sizes.

use crate::color::Color;

/// Fill used for features whose joined value is missing or not a number.
pub const NO_DATA_COLOR: Color = Color::new(0xcc, 0xcc, 0xcc);

/// Upper end of the bubble area range, in square meters.
pub const MAX_BUBBLE_AREA: f64 = 5_000.0 * 1000.0 * 1000.0;

/// Unclamped linear map from a numeric domain onto a numeric range.
///
/// A degenerate domain (both ends equal) maps every finite input to the
/// start of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    /// Position of `value` within the domain, 0 at the start and 1 at the end.
    pub fn normalize(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let span = d1 - d0;
        if span == 0.0 {
            0.0
        } else {
            (value - d0) / span
        }
    }

    pub fn scale(&self, value: f64) -> f64 {
        let (r0, r1) = self.range;
        r0 + (r1 - r0) * self.normalize(value)
    }
}

/// Maps numbers onto a two-stop color ramp interpolated in Lab space.
#[derive(Debug, Clone, Copy)]
pub struct ColorScale {
    scale: LinearScale,
    low: Color,
    high: Color,
}

impl ColorScale {
    pub fn new(domain: (f64, f64), low: Color, high: Color) -> Self {
        Self {
            scale: LinearScale::new(domain, (0.0, 1.0)),
            low,
            high,
        }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.scale.domain()
    }

    /// Color for `value`, or `None` when the value is not a finite number.
    pub fn color(&self, value: f64) -> Option<Color> {
        if !value.is_finite() {
            return None;
        }
        let t = self.scale.scale(value);
        if !t.is_finite() {
            return None;
        }
        Some(self.low.interpolate_lab(&self.high, t))
    }

    /// Like [`ColorScale::color`], falling back to [`NO_DATA_COLOR`].
    pub fn fill(&self, value: f64) -> Color {
        self.color(value).unwrap_or(NO_DATA_COLOR)
    }
}

/// Area-proportional circle sizing: `[0, max] -> [0, MAX_BUBBLE_AREA]`.
#[derive(Debug, Clone, Copy)]
pub struct BubbleScale {
    area: LinearScale,
}

impl BubbleScale {
    pub fn new(max_value: f64) -> Self {
        Self {
            area: LinearScale::new((0.0, max_value), (0.0, MAX_BUBBLE_AREA)),
        }
    }

    /// Radius in meters of the circle whose area encodes `value`.
    ///
    /// Returns `None` for values that produce no drawable circle (NaN,
    /// negative or infinite areas).
    pub fn radius(&self, value: f64) -> Option<f64> {
        let area = self.area.scale(value);
        let radius = (area / std::f64::consts::PI).sqrt();
        radius.is_finite().then_some(radius)
    }
}
