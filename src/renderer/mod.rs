#[allow(clippy::module_inception)]
pub mod renderer;
pub mod stage;

pub use renderer::Renderer;
pub use stage::StagePainter;
