use num::{traits::NumOps, Num, One};

use crate::complex::*;
use crate::error::ConfigError;

trait Two {
    fn two() -> Self;
}

impl<T> Two for T
where
    T: One + NumOps,
{
    fn two() -> Self {
        T::one() + T::one()
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Axis<T> {
    pub min: T,
    pub max: T,
}

impl<T> Axis<T>
where
    T: Num + Copy,
{
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn length(&self) -> T {
        self.max - self.min
    }

    pub fn center(&self) -> T {
        (self.max + self.min) / T::two()
    }
}

/// Rectangle of the complex plane, x along the real axis and y along the
/// imaginary axis. Always non-empty on both axes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PlaneRect {
    pub x: Axis<f64>,
    pub y: Axis<f64>,
}

impl PlaneRect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, ConfigError> {
        let finite = [x_min, x_max, y_min, y_max].iter().all(|v| v.is_finite());
        if !finite || x_max <= x_min || y_max <= y_min {
            return Err(ConfigError::EmptyRegion {
                x_min,
                x_max,
                y_min,
                y_max,
            });
        }
        Ok(Self {
            x: Axis::new(x_min, x_max),
            y: Axis::new(y_min, y_max),
        })
    }

    pub fn from_box(
        center_x: f64,
        center_y: f64,
        width: f64,
        height: f64,
    ) -> Result<Self, ConfigError> {
        Self::new(
            center_x - width / 2.0,
            center_x + width / 2.0,
            center_y - height / 2.0,
            center_y + height / 2.0,
        )
    }

    pub fn x_min(&self) -> f64 {
        self.x.min
    }

    pub fn x_max(&self) -> f64 {
        self.x.max
    }

    pub fn y_min(&self) -> f64 {
        self.y.min
    }

    pub fn y_max(&self) -> f64 {
        self.y.max
    }

    pub fn contains(&self, point: C<f64>) -> bool {
        self.x.min <= point.re
            && point.re <= self.x.max
            && self.y.min <= point.im
            && point.im <= self.y.max
    }
}

impl Default for PlaneRect {
    /// The whole set: x in [-2, 1], y in [-1.5, 1.5].
    fn default() -> Self {
        Self {
            x: Axis::new(-2.0, 1.0),
            y: Axis::new(-1.5, 1.5),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Point<T>
where
    T: Num + Copy,
{
    pub x: T,
    pub y: T,
}

impl<T> Point<T>
where
    T: Num + Copy,
{
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
    pub fn sub(&self, point: &Self) -> Self {
        Point::new(self.x - point.x, self.y - point.y)
    }
}

/// Affine map from colour-buffer pixel coordinates to the plane:
/// `plane = translate + scale * pixel`, per axis.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DisplayTransform {
    pub scale: (f64, f64),
    pub translate: (f64, f64),
}

impl DisplayTransform {
    pub fn apply(&self, px: f64, py: f64) -> C<f64> {
        c(
            self.translate.0 + self.scale.0 * px,
            self.translate.1 + self.scale.1 * py,
        )
    }
}

/// The part of the plane shown on a `width` x `height` pixel grid.
///
/// `scale` is in pixels per plane unit along x; the y axis uses
/// `scale * aspect`. Pixel rows grow downward while the imaginary axis grows
/// upward, so `sample` flips y. Every constructor validates its inputs, so a
/// `Viewport` value always has positive dimensions and scales.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub(crate) center: Point<f64>,
    pub(crate) scale: f64,
    pub(crate) aspect: f64,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl Viewport {
    pub fn new(
        center: Point<f64>,
        scale: f64,
        width: usize,
        height: usize,
    ) -> Result<Self, ConfigError> {
        Self::with_aspect(center, scale, 1.0, width, height)
    }

    pub fn with_aspect(
        center: Point<f64>,
        scale: f64,
        aspect: f64,
        width: usize,
        height: usize,
    ) -> Result<Self, ConfigError> {
        check_dimensions(width, height)?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ConfigError::InvalidScale(scale));
        }
        if !(aspect.is_finite() && aspect > 0.0) {
            return Err(ConfigError::InvalidAspect(aspect));
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(ConfigError::EmptyRegion {
                x_min: center.x,
                x_max: center.x,
                y_min: center.y,
                y_max: center.y,
            });
        }
        Ok(Self {
            center,
            scale,
            aspect,
            width,
            height,
        })
    }

    /// Smallest uniform zoom that shows all of `rect`, centred on it.
    pub fn fit(rect: &PlaneRect, width: usize, height: usize) -> Result<Self, ConfigError> {
        check_dimensions(width, height)?;
        let x_fit = width as f64 / rect.x.length();
        let y_fit = height as f64 / rect.y.length();
        Self::new(
            Point::new(rect.x.center(), rect.y.center()),
            x_fit.min(y_fit),
            width,
            height,
        )
    }

    pub fn center(&self) -> Point<f64> {
        self.center
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn y_scale(&self) -> f64 {
        self.scale * self.aspect
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Plane point for pixel `(px, py)`, row 0 at the top.
    pub fn sample(&self, px: usize, py: usize) -> C<f64> {
        self.sample_at(px as f64, py as f64)
    }

    /// `sample` for fractional pixel positions such as pointer coordinates.
    pub fn sample_at(&self, px: f64, py: f64) -> C<f64> {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        c(
            self.center.x + (px - half_w) / self.scale,
            self.center.y - (py - half_h) / self.y_scale(),
        )
    }

    /// Inverse of `sample_at`.
    pub fn pixel_of(&self, point: C<f64>) -> Point<f64> {
        let half_w = self.width as f64 / 2.0;
        let half_h = self.height as f64 / 2.0;
        Point::new(
            (point.re - self.center.x) * self.scale + half_w,
            half_h - (point.im - self.center.y) * self.y_scale(),
        )
    }

    pub fn plane_rect(&self) -> PlaneRect {
        let top_left = self.sample_at(0.0, 0.0);
        let x_min = top_left.re;
        let y_max = top_left.im;
        PlaneRect {
            x: Axis::new(x_min, x_min + self.width as f64 / self.scale),
            y: Axis::new(y_max - self.height as f64 / self.y_scale(), y_max),
        }
    }

    pub fn display_transform(&self) -> DisplayTransform {
        let top_left = self.sample_at(0.0, 0.0);
        DisplayTransform {
            scale: (1.0 / self.scale, -1.0 / self.y_scale()),
            translate: (top_left.re, top_left.im),
        }
    }

    pub fn resized(&self, width: usize, height: usize) -> Result<Self, ConfigError> {
        Self::with_aspect(self.center, self.scale, self.aspect, width, height)
    }

    pub fn recentered(&self, center: Point<f64>) -> Result<Self, ConfigError> {
        Self::with_aspect(center, self.scale, self.aspect, self.width, self.height)
    }

    /// Same grid at `scale`, keeping the plane point under pixel `anchor`
    /// where it is.
    pub fn zoomed_about(&self, scale: f64, anchor: Point<f64>) -> Result<Self, ConfigError> {
        let fixed = self.sample_at(anchor.x, anchor.y);
        let rescaled = Self::with_aspect(self.center, scale, self.aspect, self.width, self.height)?;
        let drift = rescaled.pixel_of(fixed).sub(&anchor);
        rescaled.recentered(Point::new(
            rescaled.center.x + drift.x / rescaled.scale,
            rescaled.center.y - drift.y / rescaled.y_scale(),
        ))
    }
}

fn check_dimensions(width: usize, height: usize) -> Result<(), ConfigError> {
    if width == 0 || height == 0 {
        Err(ConfigError::InvalidDimensions { width, height })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const EPS: f64 = 1e-12;

    fn default_viewport() -> Viewport {
        Viewport::fit(&PlaneRect::default(), 800, 800).unwrap()
    }

    #[test]
    fn test_fit_default_region() {
        let v = default_viewport();
        assert!((v.center().x + 0.5).abs() < EPS);
        assert!(v.center().y.abs() < EPS);
        assert!((v.scale() - 800.0 / 3.0).abs() < EPS);
    }

    #[test]
    fn test_adjacent_pixels_are_one_over_scale_apart() {
        let v = Viewport::new(Point::new(0.3, -0.2), 123.0, 64, 48).unwrap();
        for (px, py) in [(0, 0), (10, 5), (62, 47), (31, 24)] {
            let dx = v.sample(px + 1, py).re - v.sample(px, py).re;
            let dy = v.sample(px, py).im - v.sample(px, py + 1).im;
            assert!((dx - 1.0 / 123.0).abs() < EPS);
            assert!((dy - 1.0 / 123.0).abs() < EPS);
            assert_eq!(v.sample(px + 1, py).im, v.sample(px, py).im);
        }
    }

    #[test]
    fn test_non_uniform_aspect_stays_affine() {
        let v = Viewport::with_aspect(Point::new(0.0, 0.0), 100.0, 2.0, 40, 40).unwrap();
        let d0 = v.sample(0, 0).im - v.sample(0, 1).im;
        let d1 = v.sample(0, 20).im - v.sample(0, 21).im;
        assert!((d0 - 1.0 / 200.0).abs() < EPS);
        assert!((d0 - d1).abs() < EPS);
        let dx = v.sample(1, 0).re - v.sample(0, 0).re;
        assert!((dx - 1.0 / 100.0).abs() < EPS);
    }

    #[test]
    fn test_screen_corners() {
        let v = default_viewport();
        let top_left = v.sample(0, 0);
        assert!((top_left.re + 2.0).abs() < EPS);
        assert!((top_left.im - 1.5).abs() < EPS);
        let mid = v.sample(400, 400);
        assert!((mid.re + 0.5).abs() < EPS);
        assert!(mid.im.abs() < EPS);
    }

    #[test]
    fn test_pixel_of_inverts_sample() {
        let v = Viewport::with_aspect(Point::new(-0.75, 0.1), 321.0, 1.5, 300, 200).unwrap();
        let p = v.pixel_of(v.sample_at(12.5, 187.25));
        assert!((p.x - 12.5).abs() < 1e-9);
        assert!((p.y - 187.25).abs() < 1e-9);
    }

    #[test]
    fn test_plane_rect_spans_grid() {
        let v = default_viewport();
        let rect = v.plane_rect();
        assert!((rect.x_min() + 2.0).abs() < EPS);
        assert!((rect.x_max() - 1.0).abs() < EPS);
        assert!((rect.y_min() + 1.5).abs() < EPS);
        assert!((rect.y_max() - 1.5).abs() < EPS);
        assert!(rect.contains(v.sample(799, 799)));
    }

    #[test]
    fn test_single_pixel_viewport() {
        let v = Viewport::new(Point::new(0.0, 0.0), 10.0, 1, 1).unwrap();
        let rect = v.plane_rect();
        assert!(rect.x_max() > rect.x_min());
        assert!(rect.y_max() > rect.y_min());
        assert!((rect.x.length() - 0.1).abs() < EPS);
    }

    #[test]
    fn test_display_transform_matches_sample() {
        let v = Viewport::new(Point::new(0.25, 0.5), 50.0, 100, 80).unwrap();
        let t = v.display_transform();
        let a = t.apply(17.0, 33.0);
        let b = v.sample(17, 33);
        assert!((a.re - b.re).abs() < EPS);
        assert!((a.im - b.im).abs() < EPS);
    }

    #[test]
    fn test_invalid_viewports_fail_fast() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(
            Viewport::new(origin, 1.0, 0, 10),
            Err(ConfigError::InvalidDimensions {
                width: 0,
                height: 10
            })
        );
        assert_eq!(
            Viewport::new(origin, 0.0, 10, 10),
            Err(ConfigError::InvalidScale(0.0))
        );
        assert!(Viewport::new(origin, f64::NAN, 10, 10).is_err());
        assert_eq!(
            Viewport::with_aspect(origin, 1.0, -1.0, 10, 10),
            Err(ConfigError::InvalidAspect(-1.0))
        );
        assert!(PlaneRect::new(1.0, 1.0, 0.0, 1.0).is_err());
        assert!(PlaneRect::from_box(0.0, 0.0, 3.0, -1.0).is_err());
    }

    #[test]
    fn test_zoomed_about_keeps_anchor() {
        let v = Viewport::with_aspect(Point::new(-0.75, 0.1), 250.0, 1.25, 320, 240).unwrap();
        let anchor = Point::new(17.0, 201.5);
        let zoomed = v.zoomed_about(4000.0, anchor).unwrap();
        assert_eq!(zoomed.scale(), 4000.0);
        assert_eq!(zoomed.pixel_count(), 320 * 240);
        let before = v.sample_at(anchor.x, anchor.y);
        let after = zoomed.sample_at(anchor.x, anchor.y);
        assert!((before.re - after.re).abs() < 1e-9);
        assert!((before.im - after.im).abs() < 1e-9);

        assert!(v.zoomed_about(0.0, anchor).is_err());
        assert!(v.zoomed_about(10.0, Point::new(f64::NAN, 0.0)).is_err());
        assert!(v.recentered(Point::new(0.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_axis() {
        let axis = Axis::new(-2.0, 1.0);
        assert_eq!(axis.length(), 3.0);
        assert_eq!(axis.center(), -0.5);
    }
}
