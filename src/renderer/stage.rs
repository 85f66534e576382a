// Draws the active entity and its overlay markers with the egui painter.

use egui::epaint::{Mesh, Vertex, WHITE_UV};
use egui::{Align2, Color32, FontId, Pos2, Rect, Shape, TextureHandle, TextureOptions};
use nalgebra_glm as glm;

use crate::settings::ViewerSettings;
use crate::skeleton::Attachment;
use crate::viewer::ActiveEntity;

const MISSING_TEXTURE_TINT: Color32 = Color32::from_gray(160);
const REGION_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Page textures uploaded for one entity, plus scratch space for vertices.
#[derive(Default)]
pub struct StagePainter {
    generation: Option<u64>,
    pages: Vec<Option<TextureHandle>>,
    scratch: Vec<f32>,
}

impl StagePainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget uploaded pages; egui frees them once the handles drop.
    pub fn clear(&mut self) {
        self.generation = None;
        self.pages.clear();
    }

    pub fn page_texture(&self, page: usize) -> Option<&TextureHandle> {
        self.pages.get(page)?.as_ref()
    }

    fn upload_pages(&mut self, ctx: &egui::Context, entity: &ActiveEntity) {
        if self.generation == Some(entity.generation) {
            return;
        }
        self.pages = entity
            .atlas
            .pages
            .iter()
            .map(|page| {
                let texture = page.texture.as_ref()?;
                let size = [texture.width as usize, texture.height as usize];
                let image = if page.pma {
                    egui::ColorImage::from_rgba_premultiplied(size, &texture.rgba)
                } else {
                    egui::ColorImage::from_rgba_unmultiplied(size, &texture.rgba)
                };
                Some(ctx.load_texture(&page.name, image, TextureOptions::LINEAR))
            })
            .collect();
        self.generation = Some(entity.generation);
        log::debug!("Uploaded {} atlas page(s)", self.pages.len());
    }

    /// Paint `entity` into `rect`, whose top-left is the surface origin.
    pub fn paint(
        &mut self,
        ui: &egui::Ui,
        rect: Rect,
        entity: &ActiveEntity,
        settings: &ViewerSettings,
    ) {
        self.upload_pages(ui.ctx(), entity);
        let painter = ui.painter_at(rect);
        let origin = rect.min.to_vec2();
        let to_screen = |x: f32, y: f32| -> Pos2 {
            let p = entity.to_surface(glm::vec2(x, y));
            Pos2::new(p.x, p.y) + origin
        };

        let skeleton = &entity.skeleton;
        for slot in 0..skeleton.data().slots.len() {
            let Some(attachment) = skeleton.attachment(slot) else {
                continue;
            };
            skeleton.world_vertices(slot, attachment, &mut self.scratch);

            let texture = self.pages.get(attachment.page()).and_then(Option::as_ref);
            let mut mesh = match texture {
                Some(handle) => Mesh::with_texture(handle.id()),
                None => Mesh::default(),
            };
            let (uvs, indices) = match attachment {
                Attachment::Region(region) => (&region.uvs[..], &REGION_INDICES[..]),
                Attachment::Mesh(m) => (m.uvs.as_slice(), m.triangles.as_slice()),
            };
            for (pos, uv) in self.scratch.chunks_exact(2).zip(uvs.chunks_exact(2)) {
                let (uv, color) = match texture {
                    Some(_) => (Pos2::new(uv[0], uv[1]), Color32::WHITE),
                    None => (WHITE_UV, MISSING_TEXTURE_TINT),
                };
                mesh.vertices.push(Vertex {
                    pos: to_screen(pos[0], pos[1]),
                    uv,
                    color,
                });
            }
            let count = mesh.vertices.len() as u32;
            mesh.indices
                .extend(indices.iter().copied().filter(|&i| i < count));
            // drop a dangling partial triangle
            mesh.indices.truncate(mesh.indices.len() / 3 * 3);
            painter.add(Shape::mesh(mesh));
        }

        let [r, g, b] = settings.marker_color;
        let color = Color32::from_rgb(r, g, b);
        for marker in &entity.markers {
            let center = to_screen(marker.position.x, marker.position.y);
            let radius = settings.marker_radius * marker.local_scale * entity.scale;
            painter.circle_filled(center, radius, color);
            painter.text(
                center - egui::vec2(0.0, radius + 2.0),
                Align2::CENTER_BOTTOM,
                &marker.slot,
                FontId::proportional(12.0),
                color,
            );
        }
    }
}
