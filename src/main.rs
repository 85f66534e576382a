use winit::event_loop::{ControlFlow, EventLoop};

mod app;
mod atlas;
mod bundle;
mod error;
mod loader;
mod renderer;
mod settings;
mod skeleton;
mod texture;
mod ui;
mod viewer;

#[cfg(test)]
mod test_support;

use crate::app::AppHandler;
use crate::bundle::DroppedFile;
use crate::error::ViewerError;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Command line arguments are opened as a single drop
    let initial_files: Vec<DroppedFile> = std::env::args()
        .skip(1)
        .map(DroppedFile::from_path)
        .collect();

    let event_loop = EventLoop::new().map_err(ViewerError::from)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let runtime = tokio::runtime::Runtime::new()?;
    let mut handler = AppHandler::new(runtime, initial_files);

    event_loop
        .run_app(&mut handler)
        .map_err(ViewerError::from)?;

    Ok(())
}
