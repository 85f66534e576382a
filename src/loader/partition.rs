use crate::bundle::{AssetBundle, DroppedFile};
use crate::error::ViewerError;

pub const SKELETON_SUFFIX: &str = ".json";
pub const ATLAS_SUFFIX: &str = ".atlas";

/// A drop split into its two documents and the image candidates.
#[derive(Debug)]
pub struct Partitioned {
    pub skeleton: DroppedFile,
    pub atlas: DroppedFile,
    pub bundle: AssetBundle,
}

/// Pick the skeleton and atlas documents out of a drop by suffix, ignoring case.
/// Every other file becomes an image candidate. When a suffix matches more than
/// once the first file wins and the rest are ignored.
pub fn partition(files: Vec<DroppedFile>) -> Result<Partitioned, ViewerError> {
    if files.is_empty() {
        return Err(ViewerError::new("no-files"));
    }

    let mut skeleton = None;
    let mut atlas = None;
    let mut images = Vec::new();
    for file in files {
        if file.has_suffix(SKELETON_SUFFIX) {
            if skeleton.is_none() {
                skeleton = Some(file);
            } else {
                log::warn!("Ignoring extra skeleton document {}", file.name);
            }
        } else if file.has_suffix(ATLAS_SUFFIX) {
            if atlas.is_none() {
                atlas = Some(file);
            } else {
                log::warn!("Ignoring extra atlas document {}", file.name);
            }
        } else {
            images.push(file);
        }
    }

    match (skeleton, atlas) {
        (Some(skeleton), Some(atlas)) => {
            log::debug!(
                "Partitioned drop: skeleton={}, atlas={}, {} image candidate(s)",
                skeleton.name,
                atlas.name,
                images.len()
            );
            Ok(Partitioned {
                skeleton,
                atlas,
                bundle: images.into_iter().collect(),
            })
        }
        (skeleton, atlas) => Err(ViewerError::new("required-files-not-found")
            .with_arg("skeleton", skeleton.map_or("missing".into(), |f| f.name))
            .with_arg("atlas", atlas.map_or("missing".into(), |f| f.name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> DroppedFile {
        DroppedFile::from_bytes(name, b"x".to_vec())
    }

    #[test]
    fn splits_documents_from_images() {
        let parts = partition(vec![
            file("Hero.PNG"),
            file("Hero.Atlas"),
            file("HERO.JSON"),
            file("notes.txt"),
        ])
        .unwrap();
        assert_eq!(parts.skeleton.name, "HERO.JSON");
        assert_eq!(parts.atlas.name, "Hero.Atlas");
        assert_eq!(parts.bundle.len(), 2);
        assert!(parts.bundle.get("Hero.PNG").is_some());
    }

    #[test]
    fn first_document_of_each_kind_wins() {
        let parts = partition(vec![
            file("a.json"),
            file("b.atlas"),
            file("c.JSON"),
            file("d.atlas"),
            file("e.png"),
        ])
        .unwrap();
        assert_eq!(parts.skeleton.name, "a.json");
        assert_eq!(parts.atlas.name, "b.atlas");
        // extra documents are dropped, not treated as images
        assert_eq!(parts.bundle.len(), 1);
        assert!(parts.bundle.get("c.JSON").is_none());
    }

    #[test]
    fn empty_drop_is_no_files() {
        assert_eq!(partition(Vec::new()).unwrap_err().key, "no-files");
    }

    #[test]
    fn missing_document_names_which_one() {
        let err = partition(vec![file("a.json"), file("a.png")]).unwrap_err();
        assert_eq!(err.key, "required-files-not-found");
        assert_eq!(err.arg("skeleton"), Some("a.json"));
        assert_eq!(err.arg("atlas"), Some("missing"));
    }
}
