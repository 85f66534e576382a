use std::sync::Arc;

use nalgebra_glm as glm;

use crate::atlas::{AtlasTransform, TextureAtlas};
use crate::bundle::{AssetBundle, resolve};
use crate::error::ViewerError;
use crate::loader::LoadedDocuments;
use crate::skeleton::{AnimationState, Skeleton, SkeletonData, SkeletonDocument};
use crate::texture::{TextureInfo, TextureManager, TextureStatus, load_page_texture};

use super::entity::ActiveEntity;

/// A freshly built entity plus the per-page texture report.
pub struct Assembly {
    pub entity: ActiveEntity,
    pub textures: TextureManager,
}

/// Initial placement for a new entity.
#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub surface: glm::Vec2,
    pub scale: f32,
    pub speed: f32,
}

/// Build the active entity from both documents. Nothing is returned unless
/// every step succeeds.
pub fn assemble(
    documents: LoadedDocuments,
    transform: &dyn AtlasTransform,
    placement: Placement,
) -> Result<Assembly, ViewerError> {
    let LoadedDocuments {
        generation,
        skeleton_text,
        atlas_text,
        bundle,
    } = documents;

    let atlas_text = transform.transform(&atlas_text, &bundle);
    let mut atlas = TextureAtlas::parse(&atlas_text)?;
    let textures = bind_page_textures(&mut atlas, &bundle);

    let document = SkeletonDocument::parse(&skeleton_text)?;
    let data = SkeletonData::build(document, &atlas)?;

    let mut skeleton = Skeleton::new(Arc::new(data));
    if !skeleton.data().skins.is_empty() {
        skeleton.set_skin(0);
    }

    let mut state = AnimationState::new();
    state.time_scale = placement.speed;
    if !skeleton.data().animations.is_empty() {
        state.set_animation(0, true);
    }

    let mut entity = ActiveEntity::new(generation, skeleton, state, atlas);
    entity.scale = placement.scale;
    entity.advance(0.0);
    entity.recenter(placement.surface);

    let data = entity.skeleton.data();
    log::info!(
        "Assembled generation {generation}: {} bones, {} slots, {} skins, {} animations",
        data.bones.len(),
        data.slots.len(),
        data.skins.len(),
        data.animations.len()
    );

    Ok(Assembly { entity, textures })
}

/// Resolve and decode every atlas page image. Unresolved or undecodable pages
/// are reported and left without a texture.
fn bind_page_textures(atlas: &mut TextureAtlas, bundle: &AssetBundle) -> TextureManager {
    let mut textures = TextureManager::new();
    atlas.bind_pages(|page| {
        let mut info = TextureInfo::new(textures.textures.len(), page.name.clone());
        let texture = match resolve(bundle, &page.name) {
            None => {
                log::warn!("No image in the drop matches atlas page {}", page.name);
                None
            }
            Some(handle) => {
                info.file = Some(handle.name.clone());
                match load_page_texture(handle) {
                    Ok(texture) => {
                        info.status = TextureStatus::Resolved;
                        info.width = texture.width;
                        info.height = texture.height;
                        Some(texture)
                    }
                    Err(e) => {
                        log::warn!("Atlas page {} left untextured: {}", page.name, e.message());
                        info.status = TextureStatus::Failed(e.to_string());
                        None
                    }
                }
            }
        };
        textures.push(info);
        texture
    });
    textures
}
