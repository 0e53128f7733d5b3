use std::error::Error;

use druid::{AppLauncher, WindowDesc};
use log::info;

use mandelscope::gui::widget::ExplorerWidget;
use mandelscope::Config;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::default();
    let widget = ExplorerWidget::new(config)?;
    info!("left-drag pans, wheel zooms, R resets");

    AppLauncher::with_window(
        WindowDesc::new(widget)
            .title("Mandelscope")
            .window_size((config.width as f64, config.height as f64)),
    )
    .launch(())?;
    Ok(())
}
