use log::{debug, warn};

use crate::coord::{Point, Viewport};
use crate::error::ConfigError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Button {
    Left,
    Middle,
    Right,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum DragState {
    Idle,
    Dragging { last: Point<f64> },
}

/// Owns the view state of a session and turns input into viewport changes.
///
/// Every change bumps `generation`; a frame computed for an older generation
/// is stale.
pub struct ViewportController {
    viewport: Viewport,
    initial: Viewport,
    zoom_factor: f64,
    drag: DragState,
    generation: u64,
    fresh: Option<u64>,
}

impl ViewportController {
    pub fn new(viewport: Viewport, zoom_factor: f64) -> Result<Self, ConfigError> {
        if !(zoom_factor.is_finite() && zoom_factor > 0.0) {
            return Err(ConfigError::InvalidZoomFactor(zoom_factor));
        }
        Ok(Self {
            viewport,
            initial: viewport,
            zoom_factor,
            drag: DragState::Idle,
            generation: 0,
            fresh: None,
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.drag, DragState::Dragging { .. })
    }

    pub fn is_stale(&self) -> bool {
        self.fresh != Some(self.generation)
    }

    /// Records that a frame for `generation` is on screen.
    pub fn mark_fresh(&mut self, generation: u64) {
        if generation == self.generation {
            self.fresh = Some(generation);
        }
    }

    /// Forces the next `is_stale` to report true without moving the view.
    pub fn invalidate(&mut self) {
        self.fresh = None;
    }

    /// Installs `next` if it is a valid viewport different from the current one.
    fn commit(&mut self, next: Viewport) -> bool {
        let viewport = match Viewport::with_aspect(
            next.center,
            next.scale,
            next.aspect,
            next.width,
            next.height,
        ) {
            Ok(viewport) => viewport,
            Err(e) => {
                warn!("ignoring view change: {}", e);
                return false;
            }
        };
        if viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        self.generation += 1;
        true
    }

    pub fn press(&mut self, button: Button, x: f64, y: f64) {
        if button == Button::Left {
            self.drag = DragState::Dragging {
                last: Point::new(x, y),
            };
        }
    }

    /// Pans by the pointer motion since the last position. Ignored unless a
    /// drag is in progress.
    pub fn drag_to(&mut self, x: f64, y: f64) -> bool {
        let last = match self.drag {
            DragState::Dragging { last } => last,
            DragState::Idle => return false,
        };
        let pos = Point::new(x, y);
        self.drag = DragState::Dragging { last: pos };
        let delta = pos.sub(&last);
        self.pan(delta.x, delta.y)
    }

    pub fn release(&mut self, button: Button) {
        if button == Button::Left {
            self.drag = DragState::Idle;
        }
    }

    /// Moves the content by `(dx, dy)` pixels, so the point under the
    /// pointer follows it.
    pub fn pan(&mut self, dx: f64, dy: f64) -> bool {
        if !(dx.is_finite() && dy.is_finite()) {
            warn!("ignoring non-finite pan ({}, {})", dx, dy);
            return false;
        }
        let v = self.viewport;
        let mut next = v;
        next.center = Point::new(v.center.x - dx / v.scale, v.center.y + dy / v.y_scale());
        self.commit(next)
    }

    /// Multiplies the scale by `zoom_factor^delta`. With an anchor, the plane
    /// point under that pixel stays put.
    pub fn zoom(&mut self, delta: f64, anchor: Option<Point<f64>>) -> bool {
        if let Some(anchor) = anchor {
            if !(anchor.x.is_finite() && anchor.y.is_finite()) {
                warn!(
                    "ignoring zoom about non-finite anchor ({}, {})",
                    anchor.x, anchor.y
                );
                return false;
            }
        }
        let scale = self.viewport.scale * self.zoom_factor.powf(delta);
        if !(scale.is_finite() && scale > 0.0) {
            warn!("ignoring zoom to scale {}", scale);
            return false;
        }
        let next = match anchor {
            Some(anchor) => match self.viewport.zoomed_about(scale, anchor) {
                Ok(next) => next,
                Err(e) => {
                    warn!("ignoring zoom: {}", e);
                    return false;
                }
            },
            None => Viewport {
                scale,
                ..self.viewport
            },
        };
        self.commit(next)
    }

    /// Adopts a new pixel grid with the same center and scale.
    pub fn on_resize(&mut self, width: usize, height: usize) -> Result<bool, ConfigError> {
        let next = self.viewport.resized(width, height)?;
        debug!("resize to {}x{}", width, height);
        Ok(self.commit(next))
    }

    /// Back to the starting center and scale, keeping the current size.
    pub fn reset(&mut self) -> bool {
        self.drag = DragState::Idle;
        let next = Viewport {
            width: self.viewport.width,
            height: self.viewport.height,
            ..self.initial
        };
        self.commit(next)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coord::PlaneRect;

    const EPS: f64 = 1e-9;

    fn controller() -> ViewportController {
        let viewport = Viewport::fit(&PlaneRect::default(), 800, 600).unwrap();
        ViewportController::new(viewport, 1.1).unwrap()
    }

    #[test]
    fn test_rejects_bad_zoom_factor() {
        let viewport = Viewport::fit(&PlaneRect::default(), 8, 8).unwrap();
        assert!(ViewportController::new(viewport, 0.0).is_err());
        assert!(ViewportController::new(viewport, f64::NAN).is_err());
    }

    #[test]
    fn test_zoom_round_trip() {
        let mut ctl = controller();
        let scale = ctl.viewport().scale();
        assert!(ctl.zoom(3.0, None));
        assert!((ctl.viewport().scale() - scale * 1.1f64.powi(3)).abs() < EPS);
        assert!(ctl.zoom(-3.0, None));
        assert!((ctl.viewport().scale() - scale).abs() < EPS);
    }

    #[test]
    fn test_pan_round_trip() {
        let mut ctl = controller();
        let center = ctl.viewport().center();
        ctl.pan(37.0, -12.5);
        ctl.pan(-37.0, 12.5);
        assert!((ctl.viewport().center().x - center.x).abs() < EPS);
        assert!((ctl.viewport().center().y - center.y).abs() < EPS);
    }

    #[test]
    fn test_content_follows_pointer() {
        let mut ctl = controller();
        let before = ctl.viewport().sample_at(100.0, 100.0);
        // Drag right and down by (30, 20) pixels.
        ctl.pan(30.0, 20.0);
        let after = ctl.viewport().sample_at(130.0, 120.0);
        assert!((before.re - after.re).abs() < EPS);
        assert!((before.im - after.im).abs() < EPS);
        // Dragging down moves the view toward larger imaginary values.
        assert!(ctl.viewport().center().y > 0.0);
    }

    #[test]
    fn test_anchored_zoom_keeps_point_under_cursor() {
        let mut ctl = controller();
        let anchor = Point::new(613.0, 127.0);
        let before = ctl.viewport().sample_at(anchor.x, anchor.y);
        for delta in [1.0, 5.0, -2.5] {
            ctl.zoom(delta, Some(anchor));
            let after = ctl.viewport().sample_at(anchor.x, anchor.y);
            assert!((before.re - after.re).abs() < EPS);
            assert!((before.im - after.im).abs() < EPS);
        }
    }

    #[test]
    fn test_drag_state_machine() {
        let mut ctl = controller();
        assert!(!ctl.drag_to(10.0, 10.0));
        assert_eq!(ctl.generation(), 0);

        ctl.press(Button::Right, 0.0, 0.0);
        assert!(!ctl.is_dragging());

        ctl.press(Button::Left, 10.0, 10.0);
        assert!(ctl.is_dragging());
        assert!(ctl.drag_to(15.0, 10.0));
        assert!(!ctl.drag_to(15.0, 10.0));
        assert_eq!(ctl.generation(), 1);
        let x = ctl.viewport().center().x;
        assert!((x - (-0.5 - 5.0 / ctl.viewport().scale())).abs() < EPS);

        ctl.release(Button::Left);
        assert_eq!(ctl.drag_state(), DragState::Idle);
        assert!(!ctl.drag_to(50.0, 50.0));
    }

    #[test]
    fn test_generation_and_staleness() {
        let mut ctl = controller();
        assert!(ctl.is_stale());
        ctl.mark_fresh(ctl.generation());
        assert!(!ctl.is_stale());

        ctl.zoom(1.0, None);
        assert!(ctl.is_stale());
        // A frame for an older generation does not clear staleness.
        ctl.mark_fresh(0);
        assert!(ctl.is_stale());
        ctl.mark_fresh(1);
        assert!(!ctl.is_stale());

        assert!(!ctl.zoom(0.0, None));
        assert_eq!(ctl.generation(), 1);
    }

    #[test]
    fn test_degenerate_zoom_rejected() {
        let mut ctl = controller();
        let before = ctl.viewport();
        assert!(!ctl.zoom(1e6, None));
        assert!(!ctl.zoom(-1e6, None));
        assert!(!ctl.pan(f64::NAN, 0.0));
        assert_eq!(ctl.viewport(), before);
        assert_eq!(ctl.generation(), 0);
    }

    #[test]
    fn test_non_finite_anchor_rejected() {
        let mut ctl = controller();
        let before = ctl.viewport();
        assert!(!ctl.zoom(1.0, Some(Point::new(f64::NAN, 10.0))));
        assert!(!ctl.zoom(1.0, Some(Point::new(3.0, f64::INFINITY))));
        assert_eq!(ctl.viewport(), before);
        assert_eq!(ctl.generation(), 0);

        // Still usable afterwards.
        assert!(ctl.zoom(1.0, Some(Point::new(400.0, 300.0))));
        assert!(ctl.viewport().center().x.is_finite());
        assert!(ctl.viewport().center().y.is_finite());
        assert_eq!(ctl.generation(), 1);
    }

    #[test]
    fn test_overflowing_pan_rejected() {
        let viewport = Viewport::new(Point::new(0.0, 0.0), 1e-300, 100, 100).unwrap();
        let mut ctl = ViewportController::new(viewport, 1.1).unwrap();
        // 1e10 pixels at 1e-300 px per unit moves the center past f64::MAX.
        assert!(!ctl.pan(1e10, 0.0));
        assert!(!ctl.pan(0.0, -1e10));
        assert_eq!(ctl.viewport(), viewport);
        assert_eq!(ctl.generation(), 0);
    }

    #[test]
    fn test_resize() {
        let mut ctl = controller();
        let center = ctl.viewport().center();
        assert_eq!(ctl.on_resize(1024, 768), Ok(true));
        assert_eq!(ctl.viewport().width(), 1024);
        assert_eq!(ctl.viewport().center(), center);
        assert_eq!(ctl.on_resize(1024, 768), Ok(false));
        assert!(ctl.on_resize(0, 768).is_err());
        assert_eq!(ctl.viewport().width(), 1024);
    }

    #[test]
    fn test_reset_keeps_size() {
        let mut ctl = controller();
        let initial = ctl.viewport();
        ctl.zoom(4.0, Some(Point::new(10.0, 10.0)));
        ctl.on_resize(400, 300).unwrap();
        assert!(ctl.reset());
        let v = ctl.viewport();
        assert_eq!(v.center(), initial.center());
        assert_eq!(v.scale(), initial.scale());
        assert_eq!((v.width(), v.height()), (400, 300));
    }
}
