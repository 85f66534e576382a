//! Built-in Spine runtime: the JSON document model, setup data bound to an
//! atlas, bone world transforms, and single-track animation playback.

pub mod animation;
pub mod bone;
pub mod data;
pub mod document;
#[allow(clippy::module_inception)]
pub mod skeleton;

pub use animation::{Animation, AnimationState};
pub use data::{Attachment, SkeletonData};
pub use document::SkeletonDocument;
pub use skeleton::{Bounds, Skeleton};
