mod app;
mod canvas;
mod clock;
mod compositor;
mod config;
mod effects;
mod error;
mod field;
mod gpu;
mod instance;
mod surface;
mod transition;

use std::path::Path;

use env_logger::Env;
use winit::event_loop::EventLoop;

use crate::app::App;
use crate::config::Config;
use crate::error::BorealisError;

fn main() -> Result<(), BorealisError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => {
            let path = Path::new(&path);
            log::info!("Loading config from {}", path.display());
            Config::load(path)?
        }
        None => Config::default(),
    };

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.take_error() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
