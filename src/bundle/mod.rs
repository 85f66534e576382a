pub mod bundle;
pub mod resolver;

pub use bundle::{AssetBundle, DroppedFile, FileSource, ImageHandle};
pub use resolver::resolve;
