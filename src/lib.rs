pub mod complex;
pub mod config;
pub mod controller;
pub mod coord;
pub mod error;
pub mod explorer;
#[cfg(feature = "gui")]
pub mod gui;
pub mod painter;
pub mod solver;
pub mod threads;

pub use config::{Config, InitialView};
pub use controller::{Button, DragState, ViewportController};
pub use coord::{DisplayTransform, PlaneRect, Point, Viewport};
pub use error::ConfigError;
pub use explorer::{Event, Explorer, ExplorerWorker, Frame};
pub use painter::{colorize, ColorPolicy, Colormap, Normalize};
pub use solver::{
    evaluate, make_solver, EscapeField, EscapeMode, FieldRequest, FieldSolver, Strategy,
};

/// Explorer over the default region with default settings.
pub fn explorer(width: usize, height: usize) -> Result<Explorer, ConfigError> {
    Explorer::new(Config::with_size(width, height))
}
