use std::error::Error;
use std::time::Instant;

use log::info;
use structopt::StructOpt;

use mandelscope::painter::{ColorPolicy, Colormap, Normalize};
use mandelscope::solver::Strategy;
use mandelscope::{Config, EscapeField, Event, Explorer, InitialView, Point};

const PREVIEW_RAMP: &[u8] = b" .:-=+*#%";
const PREVIEW_INTERIOR: char = '@';

#[derive(Debug, StructOpt)]
#[structopt(
    name = "mandelscope-render",
    about = "Compute one Mandelbrot frame and report on it"
)]
struct Opt {
    #[structopt(long, default_value = "800")]
    width: usize,

    #[structopt(long, default_value = "800")]
    height: usize,

    #[structopt(long, default_value = "200")]
    max_iter: u32,

    /// Center of the view; defaults to fitting the whole set
    #[structopt(long, allow_hyphen_values = true)]
    center_x: Option<f64>,

    #[structopt(long, allow_hyphen_values = true)]
    center_y: Option<f64>,

    /// Pixels per plane unit, used with --center-x/--center-y
    #[structopt(long)]
    scale: Option<f64>,

    /// "lut" or "cosine"
    #[structopt(long, default_value = "lut")]
    policy: String,

    #[structopt(long, default_value = "inferno")]
    colormap: Colormap,

    /// "field-max" or "max-iter"
    #[structopt(long, default_value = "field-max")]
    normalize: Normalize,

    /// serial, bands[:n], pool[:n] or rayon[:n]
    #[structopt(long, default_value = "pool")]
    strategy: Strategy,

    /// Zoom steps applied about the center before rendering
    #[structopt(long, default_value = "0", allow_hyphen_values = true)]
    zoom: f64,

    /// Print a coarse text rendering of the field
    #[structopt(long)]
    preview: bool,
}

impl Opt {
    fn config(&self) -> Result<Config, Box<dyn Error>> {
        let mut config = Config {
            max_iter: self.max_iter,
            color_policy: ColorPolicy::named(&self.policy, self.colormap, self.normalize)?,
            strategy: self.strategy,
            ..Config::with_size(self.width, self.height)
        };
        if self.center_x.is_some() || self.center_y.is_some() || self.scale.is_some() {
            let fitted = config.viewport()?;
            config.initial = InitialView::Center {
                center: Point::new(
                    self.center_x.unwrap_or(fitted.center().x),
                    self.center_y.unwrap_or(fitted.center().y),
                ),
                scale: self.scale.unwrap_or(fitted.scale()),
            };
        }
        config.validate()?;
        Ok(config)
    }
}

fn preview(field: &EscapeField, columns: usize) -> String {
    let columns = columns.min(field.width()).max(1);
    let step_x = field.width() as f64 / columns as f64;
    // Terminal cells are about twice as tall as wide.
    let step_y = step_x * 2.0;
    let rows = ((field.height() as f64 / step_y) as usize).max(1);
    let denom = field.max_escaped();

    let mut out = String::with_capacity((columns + 1) * rows);
    for row in 0..rows {
        let py = ((row as f64 + 0.5) * step_y) as usize;
        for col in 0..columns {
            let px = ((col as f64 + 0.5) * step_x) as usize;
            let value = field.get(px.min(field.width() - 1), py.min(field.height() - 1));
            if field.is_interior_value(value) {
                out.push(PREVIEW_INTERIOR);
                continue;
            }
            let t = if denom > 0.0 { value / denom } else { 0.0 };
            let i = (t.clamp(0.0, 1.0) * (PREVIEW_RAMP.len() - 1) as f64).round() as usize;
            out.push(PREVIEW_RAMP[i] as char);
        }
        out.push('\n');
    }
    out
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::from_args();
    let config = opt.config()?;
    let mut explorer = Explorer::new(config)?;
    if opt.zoom != 0.0 {
        explorer.dispatch(Event::Zoom { delta: opt.zoom })?;
    }

    let start = Instant::now();
    let frame = explorer.render()?;
    let elapsed = start.elapsed();

    let rect = frame.viewport.plane_rect();
    info!(
        "rendered {}x{} ({} points) in {:?}: x [{}, {}], y [{}, {}]",
        frame.viewport.width(),
        frame.viewport.height(),
        frame.viewport.pixel_count(),
        elapsed,
        rect.x_min(),
        rect.x_max(),
        rect.y_min(),
        rect.y_max()
    );
    let stats = frame.field.stats();
    info!(
        "{} escaped, {} interior, escape values min {:?} max {:?} mean {:?}",
        stats.escaped, stats.interior, stats.min_escaped, stats.max_escaped, stats.mean_escaped
    );

    if opt.preview {
        print!("{}", preview(&frame.field, 80));
    }
    Ok(())
}
