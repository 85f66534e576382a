//! Spine / libGDX text atlas: pages, packed regions and the text rewrite hook
//! applied before parsing.

pub mod parser;
pub mod preprocess;

pub use parser::{AtlasError, AtlasPage, AtlasRegion, TextureAtlas};
pub use preprocess::{AtlasTransform, Passthrough};
