//! egui Painter-backed surface.
//!
//! Every [`Mesh2d`] becomes one `egui::Mesh` shape. Additive compositing
//! uses egui's premultiplied colors: a color with zero alpha adds its
//! channels to the framebuffer without darkening what is underneath.

use egui::epaint::{Vertex as EguiVertex, WHITE_UV};
use egui::{Color32, ColorImage, Painter, Pos2, Rect, Rounding, Shape, TextureHandle, TextureId, TextureOptions};

use crate::color::Rgba;
use crate::fast_math::Vec2;
use crate::render::mesh::{Mesh2d, TextureSlot};
use crate::render::noise::{smoke_tile, SMOKE_TILE};
use crate::render::{Composite, DrawTag, Surface};

/// Upload the repeating smoke tile.
pub fn load_smoke_texture(ctx: &egui::Context, seed: u32) -> TextureHandle {
    let tile = smoke_tile(SMOKE_TILE, seed);
    let image = ColorImage::from_gray([tile.width() as usize, tile.height() as usize], tile.as_raw());
    ctx.load_texture("prism-smoke", image, TextureOptions::LINEAR_REPEAT)
}

/// Draws into a rectangle of an egui painter.
pub struct EguiSurface<'a> {
    painter: &'a Painter,
    rect: Rect,
    composite: Composite,
    smoke: Option<TextureId>,
}

impl<'a> EguiSurface<'a> {
    pub fn new(painter: &'a Painter, rect: Rect) -> Self {
        Self {
            painter,
            rect,
            composite: Composite::SourceOver,
            smoke: None,
        }
    }

    /// Without a smoke texture, smoke meshes are skipped.
    pub fn with_smoke(mut self, smoke: Option<&TextureHandle>) -> Self {
        self.smoke = smoke.map(|t| t.id());
        self
    }

    fn color(&self, c: Rgba) -> Color32 {
        match self.composite {
            Composite::SourceOver => Color32::from_rgba_unmultiplied(c.r, c.g, c.b, c.a),
            Composite::Lighter => {
                let a = c.a as u16;
                let scale = |v: u8| ((v as u16 * a + 127) / 255) as u8;
                Color32::from_rgba_premultiplied(scale(c.r), scale(c.g), scale(c.b), 0)
            }
        }
    }

    fn pos(&self, p: Vec2) -> Pos2 {
        Pos2::new(self.rect.min.x + p.x, self.rect.min.y + p.y)
    }
}

impl Surface for EguiSurface<'_> {
    fn size(&self) -> Vec2 {
        Vec2::new(self.rect.width(), self.rect.height())
    }

    fn clear(&mut self, color: Rgba) {
        self.painter
            .rect_filled(self.rect, Rounding::ZERO, Color32::from_rgb(color.r, color.g, color.b));
    }

    fn set_composite(&mut self, mode: Composite) {
        self.composite = mode;
    }

    fn draw_mesh(&mut self, _tag: DrawTag, mesh: &Mesh2d) {
        if mesh.is_empty() {
            return;
        }
        let texture = match mesh.texture {
            None => None,
            Some(TextureSlot::Smoke) => match self.smoke {
                Some(id) => Some(id),
                None => return,
            },
        };

        let mut out = match texture {
            Some(id) => egui::Mesh::with_texture(id),
            None => egui::Mesh::default(),
        };
        out.indices = mesh.indices.clone();
        out.vertices = mesh
            .vertices
            .iter()
            .map(|v| EguiVertex {
                pos: self.pos(v.pos),
                uv: if texture.is_some() {
                    Pos2::new(v.uv.x, v.uv.y)
                } else {
                    WHITE_UV
                },
                color: self.color(v.color),
            })
            .collect();
        self.painter.add(Shape::mesh(out));
    }
}
