pub mod assembler;
pub mod controller;
pub mod entity;
pub mod overlay;
pub mod ticker;

#[cfg(test)]
mod tests;

pub use assembler::{Assembly, Placement, assemble};
pub use controller::Viewer;
pub use entity::ActiveEntity;
pub use overlay::{LiveBinding, OverlayMarker};
