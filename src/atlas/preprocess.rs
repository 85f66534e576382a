use std::borrow::Cow;

use crate::bundle::AssetBundle;

/// Rewrites atlas text before it is parsed, for example to remap page names
/// onto the files that were actually dropped.
pub trait AtlasTransform: Send + Sync {
    fn transform<'a>(&self, atlas_text: &'a str, bundle: &AssetBundle) -> Cow<'a, str>;
}

/// Identity rewrite; the default.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl AtlasTransform for Passthrough {
    fn transform<'a>(&self, atlas_text: &'a str, _bundle: &AssetBundle) -> Cow<'a, str> {
        Cow::Borrowed(atlas_text)
    }
}
