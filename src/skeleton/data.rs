use std::collections::HashMap;

use crate::atlas::{AtlasRegion, TextureAtlas};
use crate::error::ViewerError;

use super::animation::{Animation, Keyframe, Timeline};
use super::document::{is_stepped, AttachmentDoc, SkeletonDocument, VectorKeyDoc};

#[derive(Debug, Clone)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub shear_x: f32,
    pub shear_y: f32,
}

#[derive(Debug, Clone)]
pub struct SlotData {
    pub name: String,
    pub bone: usize,
    /// Setup pose attachment name.
    pub attachment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegionAttachment {
    pub page: usize,
    /// Local quad corners BL, UL, UR, BR as x,y pairs in bone space.
    pub offset: [f32; 8],
    pub uvs: [f32; 8],
}

#[derive(Debug, Clone)]
pub struct BoneWeight {
    pub bone: usize,
    pub x: f32,
    pub y: f32,
    pub weight: f32,
}

#[derive(Debug, Clone)]
pub enum MeshVertices {
    /// x,y pairs in the slot bone's space.
    Unweighted(Vec<f32>),
    /// Per vertex, the bones it is skinned to.
    Weighted(Vec<Vec<BoneWeight>>),
}

#[derive(Debug, Clone)]
pub struct MeshAttachment {
    pub page: usize,
    pub uvs: Vec<f32>,
    pub triangles: Vec<u32>,
    pub vertices: MeshVertices,
}

impl MeshAttachment {
    pub fn vertex_count(&self) -> usize {
        self.uvs.len() / 2
    }
}

#[derive(Debug, Clone)]
pub enum Attachment {
    Region(RegionAttachment),
    Mesh(MeshAttachment),
}

impl Attachment {
    pub fn page(&self) -> usize {
        match self {
            Attachment::Region(r) => r.page,
            Attachment::Mesh(m) => m.page,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Skin {
    pub name: String,
    attachments: HashMap<(usize, String), Attachment>,
}

impl Skin {
    pub fn get(&self, slot: usize, name: &str) -> Option<&Attachment> {
        // (usize, String) keys cannot be borrowed as (usize, &str)
        self.attachments
            .iter()
            .find(|((s, n), _)| *s == slot && n == name)
            .map(|(_, a)| a)
    }

    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}

/// Skeleton document resolved against the atlas: indices instead of names,
/// attachments bound to atlas regions.
#[derive(Debug, Clone, Default)]
pub struct SkeletonData {
    pub bones: Vec<BoneData>,
    pub slots: Vec<SlotData>,
    pub skins: Vec<Skin>,
    pub animations: Vec<Animation>,
    /// Skin named "default", consulted when the active skin lacks an attachment.
    pub default_skin: Option<usize>,
}

impl SkeletonData {
    pub fn find_bone(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }

    pub fn find_skin(&self, name: &str) -> Option<usize> {
        self.skins.iter().position(|s| s.name == name)
    }

    pub fn find_animation(&self, name: &str) -> Option<usize> {
        self.animations.iter().position(|a| a.name == name)
    }

    /// Build from a parsed document. Every attachment must name a region the
    /// atlas defines; any dangling reference fails the whole build.
    pub fn build(doc: SkeletonDocument, atlas: &TextureAtlas) -> Result<Self, ViewerError> {
        let mut data = SkeletonData::default();

        for (index, bone) in doc.bones.iter().enumerate() {
            let parent = match &bone.parent {
                None => None,
                Some(parent) => match data.find_bone(parent) {
                    Some(p) => Some(p),
                    None => {
                        return Err(ViewerError::new("assembly-failed")
                            .with_arg("bone", &bone.name)
                            .with_arg("unknown-parent", parent));
                    }
                },
            };
            if parent.is_none() && index > 0 {
                log::debug!("Bone {} is an additional root", bone.name);
            }
            data.bones.push(BoneData {
                name: bone.name.clone(),
                parent,
                x: bone.x,
                y: bone.y,
                rotation: bone.rotation,
                scale_x: bone.scale_x,
                scale_y: bone.scale_y,
                shear_x: bone.shear_x,
                shear_y: bone.shear_y,
            });
        }

        for slot in &doc.slots {
            let bone = data.find_bone(&slot.bone).ok_or_else(|| {
                ViewerError::new("assembly-failed")
                    .with_arg("slot", &slot.name)
                    .with_arg("unknown-bone", &slot.bone)
            })?;
            data.slots.push(SlotData {
                name: slot.name.clone(),
                bone,
                attachment: slot.attachment.clone(),
            });
        }

        for skin_doc in doc.skins.into_skins() {
            let mut skin = Skin {
                name: skin_doc.name,
                attachments: HashMap::new(),
            };
            for (slot_name, entries) in skin_doc.attachments.iter() {
                let slot = data.find_slot(slot_name).ok_or_else(|| {
                    ViewerError::new("assembly-failed")
                        .with_arg("skin", &skin.name)
                        .with_arg("unknown-slot", slot_name)
                })?;
                for (attachment_name, attachment) in entries.iter() {
                    if let Some(built) = build_attachment(
                        &data,
                        atlas,
                        attachment_name,
                        attachment,
                    )
                    .map_err(|e| e.with_arg("skin", &skin.name).with_arg("slot", slot_name))?
                    {
                        skin.attachments
                            .insert((slot, attachment_name.to_string()), built);
                    }
                }
            }
            data.skins.push(skin);
        }
        data.default_skin = data
            .skins
            .iter()
            .position(|s| s.name.eq_ignore_ascii_case("default"));

        for (name, animation) in doc.animations.iter() {
            let mut timelines = Vec::new();
            let mut duration: f32 = 0.0;

            for (bone_name, tl) in animation.bones.iter() {
                let bone = data.find_bone(bone_name).ok_or_else(|| {
                    ViewerError::new("assembly-failed")
                        .with_arg("animation", name)
                        .with_arg("unknown-bone", bone_name)
                })?;
                if !tl.rotate.is_empty() {
                    let frames: Vec<Keyframe<1>> = tl
                        .rotate
                        .iter()
                        .map(|k| Keyframe {
                            time: k.time,
                            values: [k.value],
                            stepped: is_stepped(&k.curve),
                        })
                        .collect();
                    timelines.push(Timeline::Rotate { bone, frames });
                }
                if !tl.translate.is_empty() {
                    let frames = vector_frames(&tl.translate, 0.0);
                    timelines.push(Timeline::Translate { bone, frames });
                }
                if !tl.scale.is_empty() {
                    let frames = vector_frames(&tl.scale, 1.0);
                    timelines.push(Timeline::Scale { bone, frames });
                }
                if !tl.shear.is_empty() {
                    let frames = vector_frames(&tl.shear, 0.0);
                    timelines.push(Timeline::Shear { bone, frames });
                }
            }

            for (slot_name, tl) in animation.slots.iter() {
                let slot = data.find_slot(slot_name).ok_or_else(|| {
                    ViewerError::new("assembly-failed")
                        .with_arg("animation", name)
                        .with_arg("unknown-slot", slot_name)
                })?;
                if !tl.attachment.is_empty() {
                    let frames = tl
                        .attachment
                        .iter()
                        .map(|k| (k.time, k.name.clone()))
                        .collect();
                    timelines.push(Timeline::Attachment { slot, frames });
                }
            }

            for timeline in &timelines {
                duration = duration.max(timeline.last_time());
            }
            data.animations.push(Animation {
                name: name.to_string(),
                duration,
                timelines,
            });
        }

        Ok(data)
    }
}

fn vector_frames(keys: &[VectorKeyDoc], default: f32) -> Vec<Keyframe<2>> {
    keys.iter()
        .map(|k| Keyframe {
            time: k.time,
            values: [k.x.unwrap_or(default), k.y.unwrap_or(default)],
            stepped: is_stepped(&k.curve),
        })
        .collect()
}

fn find_region<'a>(
    atlas: &'a TextureAtlas,
    attachment_name: &str,
    doc: &AttachmentDoc,
) -> Result<&'a AtlasRegion, ViewerError> {
    let path = doc
        .path
        .as_deref()
        .or(doc.name.as_deref())
        .unwrap_or(attachment_name);
    atlas.find_region(path).ok_or_else(|| {
        ViewerError::new("assembly-failed")
            .with_arg("attachment", attachment_name)
            .with_arg("missing-region", path)
    })
}

/// Attachments that draw nothing (points, bounding boxes, paths, clipping) yield `None`.
fn build_attachment(
    data: &SkeletonData,
    atlas: &TextureAtlas,
    attachment_name: &str,
    doc: &AttachmentDoc,
) -> Result<Option<Attachment>, ViewerError> {
    match doc.kind.as_deref().unwrap_or("region") {
        "region" => {
            let region = find_region(atlas, attachment_name, doc)?;
            Ok(Some(Attachment::Region(region_attachment(region, doc))))
        }
        "mesh" => {
            let region = find_region(atlas, attachment_name, doc)?;
            let page = atlas.page(region.page);
            let (page_width, page_height) = page.map(|p| (p.width, p.height)).unwrap_or((1, 1));
            let vertices = mesh_vertices(data, doc).map_err(|e| {
                e.with_arg("attachment", attachment_name)
            })?;
            Ok(Some(Attachment::Mesh(MeshAttachment {
                page: region.page,
                uvs: mesh_uvs(region, &doc.uvs, page_width, page_height),
                triangles: doc.triangles.clone(),
                vertices,
            })))
        }
        other => {
            log::debug!("Skipping {other} attachment {attachment_name}");
            Ok(None)
        }
    }
}

fn region_attachment(region: &AtlasRegion, doc: &AttachmentDoc) -> RegionAttachment {
    let original_width = region.original_width.max(1) as f32;
    let original_height = region.original_height.max(1) as f32;
    let region_scale_x = doc.width / original_width * doc.scale_x;
    let region_scale_y = doc.height / original_height * doc.scale_y;
    let local_x = -doc.width / 2.0 * doc.scale_x + region.offset_x * region_scale_x;
    let local_y = -doc.height / 2.0 * doc.scale_y + region.offset_y * region_scale_y;
    let local_x2 = local_x + region.width as f32 * region_scale_x;
    let local_y2 = local_y + region.height as f32 * region_scale_y;

    let (sin, cos) = doc.rotation.to_radians().sin_cos();
    let (x, y) = (doc.x, doc.y);
    let corner = |lx: f32, ly: f32| (lx * cos - ly * sin + x, lx * sin + ly * cos + y);
    let (blx, bly) = corner(local_x, local_y);
    let (ulx, uly) = corner(local_x, local_y2);
    let (urx, ury) = corner(local_x2, local_y2);
    let (brx, bry) = corner(local_x2, local_y);

    let (u, v, u2, v2) = (region.u, region.v, region.u2, region.v2);
    let uvs = if region.degrees == 90 {
        [u2, v2, u, v2, u, v, u2, v]
    } else {
        [u, v2, u, v, u2, v, u2, v2]
    };

    RegionAttachment {
        page: region.page,
        offset: [blx, bly, ulx, uly, urx, ury, brx, bry],
        uvs,
    }
}

/// Map region-relative mesh uvs onto the page.
fn mesh_uvs(region: &AtlasRegion, region_uvs: &[f32], page_width: u32, page_height: u32) -> Vec<f32> {
    let tw = page_width.max(1) as f32;
    let th = page_height.max(1) as f32;
    let (ow, oh) = (region.original_width as f32, region.original_height as f32);
    let (w, h) = (region.width as f32, region.height as f32);
    let mut out = Vec::with_capacity(region_uvs.len());

    if region.degrees == 90 {
        let u = region.u - (oh - region.offset_y - h) / tw;
        let v = region.v - (ow - region.offset_x - w) / th;
        let (width, height) = (oh / tw, ow / th);
        for pair in region_uvs.chunks_exact(2) {
            out.push(u + pair[1] * width);
            out.push(v + (1.0 - pair[0]) * height);
        }
    } else {
        let u = region.u - region.offset_x / tw;
        let v = region.v - (oh - region.offset_y - h) / th;
        let (width, height) = (ow / tw, oh / th);
        for pair in region_uvs.chunks_exact(2) {
            out.push(u + pair[0] * width);
            out.push(v + pair[1] * height);
        }
    }
    out
}

fn mesh_vertices(data: &SkeletonData, doc: &AttachmentDoc) -> Result<MeshVertices, ViewerError> {
    let count = doc.uvs.len() / 2;
    if doc.vertices.len() == doc.uvs.len() {
        return Ok(MeshVertices::Unweighted(doc.vertices.clone()));
    }

    let malformed = || ViewerError::new("assembly-failed").with_arg("mesh", "malformed weights");
    let mut weighted = Vec::with_capacity(count);
    let mut values = doc.vertices.iter().copied();
    for _ in 0..count {
        let bones = values.next().ok_or_else(malformed)? as usize;
        let mut influences = Vec::with_capacity(bones);
        for _ in 0..bones {
            let bone = values.next().ok_or_else(malformed)? as usize;
            if bone >= data.bones.len() {
                return Err(malformed().with_arg("bone-index", bone));
            }
            let x = values.next().ok_or_else(malformed)?;
            let y = values.next().ok_or_else(malformed)?;
            let weight = values.next().ok_or_else(malformed)?;
            influences.push(BoneWeight { bone, x, y, weight });
        }
        weighted.push(influences);
    }
    Ok(MeshVertices::Weighted(weighted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ATLAS, SKELETON};

    fn build(json: &str) -> Result<SkeletonData, ViewerError> {
        let atlas = TextureAtlas::parse(ATLAS).unwrap();
        SkeletonData::build(SkeletonDocument::parse(json).unwrap(), &atlas)
    }

    #[test]
    fn resolves_names_to_indices() {
        let data = build(SKELETON).unwrap();
        assert_eq!(data.bones.len(), 3);
        assert_eq!(data.bones[1].parent, Some(0));
        assert_eq!(data.slots[1].bone, data.find_bone("head").unwrap());
        assert_eq!(data.skins.len(), 2);
        assert_eq!(data.default_skin, Some(0));
        assert_eq!(data.animations[0].name, "Walk");
        assert!((data.animations[0].duration - 1.0).abs() < 1e-6);
    }

    #[test]
    fn region_quad_is_centred_on_attachment() {
        let data = build(SKELETON).unwrap();
        let slot = data.find_slot("body").unwrap();
        let Some(Attachment::Region(region)) = data.skins[0].get(slot, "body") else {
            panic!("body region missing");
        };
        // 40x80 attachment with no offset: corners at +-20, +-40
        assert_eq!(region.offset, [-20.0, -40.0, -20.0, 40.0, 20.0, 40.0, 20.0, -40.0]);
    }

    #[test]
    fn unknown_region_fails_the_build() {
        let err = build(
            r#"{"bones":[{"name":"root"}],"slots":[{"name":"s","bone":"root"}],
                "skins":[{"name":"default","attachments":{"s":{"ghost":{"width":1,"height":1}}}}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "assembly-failed");
        assert_eq!(err.arg("missing-region"), Some("ghost"));
    }

    #[test]
    fn unknown_parent_fails_the_build() {
        let err = build(r#"{"bones":[{"name":"arm","parent":"nobody"}]}"#).unwrap_err();
        assert_eq!(err.arg("unknown-parent"), Some("nobody"));
    }

    #[test]
    fn parses_weighted_mesh() {
        let data = build(
            r#"{"bones":[{"name":"root"},{"name":"tip","parent":"root"}],
                "slots":[{"name":"s","bone":"root","attachment":"body"}],
                "skins":[{"name":"default","attachments":{"s":{"body":{"type":"mesh",
                    "uvs":[0,0,1,0],"triangles":[0,1,0],
                    "vertices":[1,0,5,5,1, 2,0,1,1,0.5,1,2,2,0.5]}}}}]}"#,
        )
        .unwrap();
        let Some(Attachment::Mesh(mesh)) = data.skins[0].get(0, "body") else {
            panic!("mesh missing");
        };
        assert_eq!(mesh.vertex_count(), 2);
        let MeshVertices::Weighted(w) = &mesh.vertices else {
            panic!("expected weights");
        };
        assert_eq!(w[0].len(), 1);
        assert_eq!(w[1].len(), 2);
        assert_eq!(w[1][1].bone, 1);
    }

    #[test]
    fn skips_non_drawing_attachments() {
        let data = build(
            r#"{"bones":[{"name":"root"}],"slots":[{"name":"s","bone":"root"}],
                "skins":[{"name":"default","attachments":{"s":{"p":{"type":"point"}}}}]}"#,
        )
        .unwrap();
        assert!(data.skins[0].is_empty());
    }
}
