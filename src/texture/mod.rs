pub mod loader;
pub mod manager;
pub mod panel;

pub use loader::{PageTexture, decode_image, load_page_texture};
pub use manager::{TextureInfo, TextureManager, TextureStatus};
pub use panel::TexturePanel;
