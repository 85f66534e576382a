use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::ViewerError;

/// Where the bytes of a dropped file live.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Memory(Arc<[u8]>),
}

impl FileSource {
    pub fn read_bytes(&self) -> Result<Arc<[u8]>, ViewerError> {
        match self {
            FileSource::Path(path) => Ok(std::fs::read(path)?.into()),
            FileSource::Memory(bytes) => Ok(bytes.clone()),
        }
    }

    pub async fn read_text(&self) -> Result<String, ViewerError> {
        let bytes = match self {
            FileSource::Path(path) => tokio::fs::read(path).await?,
            FileSource::Memory(bytes) => bytes.to_vec(),
        };
        let text =
            String::from_utf8(bytes).map_err(|e| ViewerError::new("invalid-utf8").push_std(e))?;
        Ok(match text.strip_prefix('\u{feff}') {
            Some(rest) => rest.to_string(),
            None => text,
        })
    }
}

/// One named file out of a drop event.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub name: String,
    pub source: FileSource,
}

impl DroppedFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::Memory(bytes.into()),
        }
    }

    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.name.to_lowercase().ends_with(suffix)
    }
}

/// Addressable handle for a texture image candidate.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub name: String,
    pub source: FileSource,
}

/// Filename to image handle mapping for one drop, kept in drop order.
/// Dropping the bundle releases every handle it owns.
#[derive(Debug, Default)]
pub struct AssetBundle {
    images: Vec<ImageHandle>,
    by_name: HashMap<String, usize>,
}

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file: DroppedFile) {
        let handle = ImageHandle {
            name: file.name.clone(),
            source: file.source,
        };
        match self.by_name.get(&file.name) {
            Some(&index) => self.images[index] = handle,
            None => {
                self.by_name.insert(file.name, self.images.len());
                self.images.push(handle);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ImageHandle> {
        self.by_name.get(name).map(|&index| &self.images[index])
    }

    /// Handles in the order they were dropped.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageHandle)> {
        self.images.iter().map(|h| (h.name.as_str(), h))
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl FromIterator<DroppedFile> for AssetBundle {
    fn from_iter<T: IntoIterator<Item = DroppedFile>>(iter: T) -> Self {
        let mut bundle = AssetBundle::new();
        for file in iter {
            bundle.insert(file);
        }
        bundle
    }
}
