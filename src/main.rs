use eframe::egui;

use prism_scene::render::egui_surface::{load_smoke_texture, EguiSurface};
use prism_scene::render::{paint_fallback, Surface, BACKGROUND};
use prism_scene::{DeviceProfile, PrismScene, SceneConfig, Viewport};

/// Seed of the smoke texture; any value gives a usable tile.
const SMOKE_SEED: u32 = 7;

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn main() {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([320.0, 240.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        "PrismScene",
        options,
        Box::new(|cc| Ok(Box::new(PrismApp::new(cc)))),
    );
    if let Err(e) = result {
        log::error!("failed to start PrismScene: {}", e);
        std::process::exit(1);
    }
}

enum SceneSlot {
    /// Waiting for the first frame to learn the canvas size.
    Pending,
    Running(PrismScene),
    /// Construction failed; a static gradient is shown instead.
    Fallback,
}

/// Raw input gathered for one egui frame.
struct FrameInput {
    now_ms: f64,
    minimized: bool,
    close_requested: bool,
    toggle_reduced_motion: bool,
    hover: Option<egui::Pos2>,
    touches: Vec<(egui::TouchPhase, u64, egui::Pos2)>,
}

struct PrismApp {
    slot: SceneSlot,
    profile: DeviceProfile,
    reduced_motion: bool,
    smoke: egui::TextureHandle,
}

impl PrismApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let profile = DeviceProfile {
            reduced_motion: env_flag("PRISM_REDUCED_MOTION"),
            mobile: env_flag("PRISM_MOBILE"),
            viewport_width: 0.0,
        };
        log::info!(
            "device profile: reduced_motion={} mobile={}",
            profile.reduced_motion,
            profile.mobile
        );
        Self {
            slot: SceneSlot::Pending,
            reduced_motion: profile.reduced_motion,
            profile,
            smoke: load_smoke_texture(&cc.egui_ctx, SMOKE_SEED),
        }
    }

    fn gather_input(ctx: &egui::Context) -> FrameInput {
        ctx.input(|i| FrameInput {
            now_ms: i.time * 1000.0,
            minimized: i.viewport().minimized.unwrap_or(false),
            close_requested: i.viewport().close_requested(),
            toggle_reduced_motion: i.key_pressed(egui::Key::M),
            hover: i.pointer.hover_pos(),
            touches: i
                .events
                .iter()
                .filter_map(|e| match e {
                    egui::Event::Touch { id, phase, pos, .. } => Some((*phase, id.0, *pos)),
                    _ => None,
                })
                .collect(),
        })
    }

    fn drive(&mut self, scene_input: &FrameInput, rect: egui::Rect) {
        let SceneSlot::Running(scene) = &mut self.slot else {
            return;
        };
        let now = scene_input.now_ms;

        if scene_input.close_requested {
            scene.stop();
            return;
        }
        scene.set_visible(!scene_input.minimized, now);

        if scene_input.toggle_reduced_motion {
            self.reduced_motion = !self.reduced_motion;
            log::info!("reduced motion preference: {}", self.reduced_motion);
            scene.set_reduced_motion(self.reduced_motion);
        }

        if let Some(p) = scene_input.hover {
            scene.pointer_move(p.x - rect.min.x, p.y - rect.min.y);
        }
        for &(phase, id, pos) in &scene_input.touches {
            let (x, y) = (pos.x - rect.min.x, pos.y - rect.min.y);
            match phase {
                egui::TouchPhase::Start => scene.touch_start(x, y, id),
                egui::TouchPhase::Move => scene.touch_move(x, y, id),
                egui::TouchPhase::End | egui::TouchPhase::Cancel => scene.touch_end(id),
            }
        }
    }
}

impl eframe::App for PrismApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let input = Self::gather_input(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let viewport = Viewport::new(rect.width(), rect.height(), ctx.pixels_per_point());

                if matches!(self.slot, SceneSlot::Pending) {
                    self.slot = match PrismScene::new(SceneConfig::default(), viewport, self.profile) {
                        Ok(scene) => SceneSlot::Running(scene),
                        Err(e) => {
                            log::warn!("scene unavailable, showing static background: {}", e);
                            SceneSlot::Fallback
                        }
                    };
                }

                self.drive(&input, rect);

                let painter = ui.painter_at(rect);
                let mut surface = EguiSurface::new(&painter, rect).with_smoke(Some(&self.smoke));
                match &mut self.slot {
                    SceneSlot::Running(scene) => {
                        scene.request_resize(viewport, input.now_ms);
                        if scene.frame(&mut surface, input.now_ms).is_none() {
                            surface.clear(BACKGROUND);
                        }
                        if scene.wants_frame() {
                            ctx.request_repaint();
                        }
                    }
                    SceneSlot::Fallback => paint_fallback(&mut surface),
                    SceneSlot::Pending => {}
                }
            });
    }
}
