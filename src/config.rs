use crate::coord::{PlaneRect, Point, Viewport};
use crate::error::ConfigError;
use crate::painter::ColorPolicy;
use crate::solver::{FieldRequest, Strategy};

/// Where a session starts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum InitialView {
    /// Zoomed so the whole rectangle is visible.
    Fit(PlaneRect),
    Center { center: Point<f64>, scale: f64 },
}

impl Default for InitialView {
    fn default() -> Self {
        Self::Fit(PlaneRect::default())
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    pub max_iter: u32,
    pub initial: InitialView,
    pub aspect: f64,
    pub color_policy: ColorPolicy,
    pub zoom_factor: f64,
    pub strategy: Strategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            max_iter: 200,
            initial: InitialView::default(),
            aspect: 1.0,
            color_policy: ColorPolicy::default(),
            zoom_factor: 1.1,
            strategy: Strategy::default(),
        }
    }
}

impl Config {
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iter == 0 {
            return Err(ConfigError::InvalidMaxIter);
        }
        if !(self.zoom_factor.is_finite() && self.zoom_factor > 0.0) {
            return Err(ConfigError::InvalidZoomFactor(self.zoom_factor));
        }
        self.viewport().map(|_| ())
    }

    /// The starting viewport. Checks dimensions, scale and aspect.
    pub fn viewport(&self) -> Result<Viewport, ConfigError> {
        match self.initial {
            InitialView::Fit(rect) => {
                let fitted = Viewport::fit(&rect, self.width, self.height)?;
                Viewport::with_aspect(
                    fitted.center(),
                    fitted.scale(),
                    self.aspect,
                    self.width,
                    self.height,
                )
            }
            InitialView::Center { center, scale } => {
                Viewport::with_aspect(center, scale, self.aspect, self.width, self.height)
            }
        }
    }

    pub fn request(&self, viewport: Viewport) -> Result<FieldRequest, ConfigError> {
        FieldRequest::new(viewport, self.max_iter, self.color_policy.escape_mode())
    }
}
