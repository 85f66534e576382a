use std::sync::Arc;

use crate::bundle::ImageHandle;
use crate::error::ViewerError;

/// Decoded atlas page image, RGBA8 row-major.
#[derive(Debug, Clone)]
pub struct PageTexture {
    pub file: String,
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<Vec<u8>>,
}

/// Decode PNG/JPEG/BMP bytes into RGBA8.
pub fn decode_image(data: &[u8]) -> Result<(Vec<u8>, u32, u32), ViewerError> {
    let img = image::load_from_memory(data)?;

    let width = img.width();
    let height = img.height();

    // Convert to RGBA8
    let rgba_data = img.to_rgba8().into_raw();

    Ok((rgba_data, width, height))
}

/// Read and decode the image behind a resolved handle.
pub fn load_page_texture(handle: &ImageHandle) -> Result<PageTexture, ViewerError> {
    let bytes = handle.source.read_bytes()?;
    let (rgba, width, height) =
        decode_image(&bytes).map_err(|e| e.with_arg("file", &handle.name))?;
    Ok(PageTexture {
        file: handle.name.clone(),
        width,
        height,
        rgba: Arc::new(rgba),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{DroppedFile, FileSource};
    use crate::test_support::png_bytes;

    #[test]
    fn decodes_png_to_rgba() {
        let (rgba, w, h) = decode_image(&png_bytes(3, 2)).unwrap();
        assert_eq!((w, h), (3, 2));
        assert_eq!(rgba.len(), 3 * 2 * 4);
        assert_eq!(&rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let handle = ImageHandle {
            name: "broken.png".into(),
            source: FileSource::Memory(vec![1u8, 2, 3].into()),
        };
        let err = load_page_texture(&handle).unwrap_err();
        assert_eq!(err.key, "image-error");
        assert_eq!(err.arg("file"), Some("broken.png"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, png_bytes(4, 4)).unwrap();
        let file = DroppedFile::from_path(&path);
        let handle = ImageHandle {
            name: file.name,
            source: file.source,
        };
        let page = load_page_texture(&handle).unwrap();
        assert_eq!(page.file, "page.png");
        assert_eq!((page.width, page.height), (4, 4));
    }
}
