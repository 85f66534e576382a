use super::{AssetBundle, ImageHandle};

/// Find the image a page line of the atlas refers to.
/// Exact filename first, then a case-insensitive scan in drop order.
pub fn resolve<'a>(bundle: &'a AssetBundle, reference: &str) -> Option<&'a ImageHandle> {
    if let Some(handle) = bundle.get(reference) {
        return Some(handle);
    }

    let lower = reference.to_lowercase();
    bundle
        .iter()
        .find(|(name, _)| name.to_lowercase() == lower)
        .map(|(_, handle)| handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::DroppedFile;

    fn bundle(names: &[&str]) -> AssetBundle {
        names
            .iter()
            .map(|n| DroppedFile::from_bytes(*n, n.as_bytes().to_vec()))
            .collect()
    }

    #[test]
    fn exact_name_wins() {
        let b = bundle(&["Hero.png", "hero.PNG"]);
        assert_eq!(resolve(&b, "Hero.png").map(|h| h.name.as_str()), Some("Hero.png"));
        assert_eq!(resolve(&b, "hero.PNG").map(|h| h.name.as_str()), Some("hero.PNG"));
    }

    #[test]
    fn falls_back_to_case_insensitive_match() {
        let b = bundle(&["Hero.png"]);
        assert_eq!(resolve(&b, "hero.png").map(|h| h.name.as_str()), Some("Hero.png"));
        assert_eq!(resolve(&b, "HERO.PNG").map(|h| h.name.as_str()), Some("Hero.png"));
    }

    #[test]
    fn case_insensitive_tie_goes_to_first_dropped() {
        for _ in 0..32 {
            let b = bundle(&["HERO.png", "Hero.PNG"]);
            assert_eq!(resolve(&b, "hero.png").map(|h| h.name.as_str()), Some("HERO.png"));

            let b = bundle(&["Hero.PNG", "HERO.png"]);
            assert_eq!(resolve(&b, "hero.png").map(|h| h.name.as_str()), Some("Hero.PNG"));
        }
    }

    #[test]
    fn unknown_reference_is_not_found() {
        let b = bundle(&["Hero.png"]);
        assert!(resolve(&b, "Villain.png").is_none());
        assert!(resolve(&b, "hero").is_none());
        assert!(resolve(&AssetBundle::new(), "hero.png").is_none());
    }
}
