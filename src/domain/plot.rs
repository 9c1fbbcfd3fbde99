//! Sampling curves across a 2D viewport.
//!
//! A viewport maps screen pixels to math coordinates: the origin sits at
//! the center of the screen shifted by the offsets, and `scale` is pixels
//! per unit. Curves are sampled once every `density` pixels horizontally
//! and cut into polylines wherever a sample cannot be drawn.

use serde::{Deserialize, Serialize};

/// Most samples a single curve will take. Finer densities are coarsened
/// to fit.
pub const MAX_SAMPLES: usize = 1_000_000;

/// A sample in math coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An unbroken run of samples. Never empty.
pub type Segment = Vec<Point>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen width in pixels
    pub width: f64,
    /// Screen height in pixels
    pub height: f64,
    /// Pixels per math unit
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Viewport {
    /// A viewport centered on the origin.
    pub fn centered(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    pub fn screen_to_math_x(&self, sx: f64) -> f64 {
        (sx - self.width / 2.0 - self.offset_x) / self.scale
    }

    pub fn math_to_screen_y(&self, y: f64) -> f64 {
        self.height / 2.0 - y * self.scale + self.offset_y
    }

    /// Visible range of x in math units.
    pub fn x_range(&self) -> (f64, f64) {
        (self.screen_to_math_x(0.0), self.screen_to_math_x(self.width))
    }
}

/// Samples `f` across `viewport`, one sample every `density` pixels.
///
/// A sample breaks the current polyline when its value is not finite or
/// when it lands more than `margin` pixels above or below the screen.
/// Returns no segments when `density` is not positive. At most
/// [`MAX_SAMPLES`] + 1 samples are taken.
///
/// # Examples
///
/// ```
/// use plotscope::domain::{compile, sample_curve, Viewport};
///
/// let f = compile("1/x").unwrap();
/// let viewport = Viewport::centered(100.0, 100.0, 10.0);
/// let segments = sample_curve(|x| f.eval(x), &viewport, 1.0, 1000.0);
///
/// // the pole at x = 0 splits the hyperbola in two
/// assert_eq!(segments.len(), 2);
/// ```
pub fn sample_curve<F>(f: F, viewport: &Viewport, density: f64, margin: f64) -> Vec<Segment>
where
    F: Fn(f64) -> f64,
{
    let mut segments = Vec::new();
    if density.is_nan() || density <= 0.0 {
        return segments;
    }

    let mut current: Segment = Vec::new();
    let density = density.max(viewport.width / MAX_SAMPLES as f64);
    let steps = (viewport.width / density).floor() as usize;

    // Stepping by index keeps the sample positions free of accumulated error.
    for step in 0..=steps {
        let sx = step as f64 * density;
        let x = viewport.screen_to_math_x(sx);
        let y = f(x);

        let drawable = y.is_finite() && {
            let sy = viewport.math_to_screen_y(y);
            sy >= -margin && sy <= viewport.height + margin
        };

        if drawable {
            current.push(Point { x, y });
        } else if !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    segments
}
