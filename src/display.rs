use anyhow::{Context, Result};
use eframe::egui;
use eframe::epaint::ColorImage;
use image::imageops::FilterType;
use log::debug;
use std::path::Path;
use tokio::sync::watch;

use crate::media::{DisplayMode, ScreenGeometry, ScreenTarget, Size};
use crate::render::Surface;

/// A decoded video frame and how it should be fitted to the surface.
#[derive(Clone)]
pub struct VideoFrame {
    pub image: ColorImage,
    pub mode: DisplayMode,
}

/// Borderless egui viewport that shows the current image or video frame.
pub struct PlayerSurface {
    target: Option<ScreenTarget>,
    size: Option<Size>,
    pending_image: Option<ColorImage>,
    image_mode: DisplayMode,
    showing_image: bool,
    texture: Option<egui::TextureHandle>,
    texture_mode: DisplayMode,
    frames: watch::Receiver<Option<VideoFrame>>,
}

impl PlayerSurface {
    pub fn new(frames: watch::Receiver<Option<VideoFrame>>) -> Self {
        Self {
            target: None,
            size: None,
            pending_image: None,
            image_mode: DisplayMode::Fullscreen,
            showing_image: false,
            texture: None,
            texture_mode: DisplayMode::Fullscreen,
            frames,
        }
    }

    pub fn is_open(&self) -> bool {
        self.target.is_some()
    }

    pub fn target(&self) -> Option<&ScreenTarget> {
        self.target.as_ref()
    }

    pub fn size(&self) -> Option<Size> {
        self.size
    }

    pub fn has_pending_image(&self) -> bool {
        self.pending_image.is_some()
    }

    /// Latest unseen video frame. Frames are ignored while an image is up.
    fn poll_frame(&mut self) -> Option<VideoFrame> {
        if self.showing_image || !self.frames.has_changed().unwrap_or(false) {
            return None;
        }
        self.frames.borrow_and_update().clone()
    }

    /// Draw the player viewport. Returns `true` when the operator asked to
    /// close it with Escape or the window manager.
    pub fn show(&mut self, ctx: &egui::Context) -> bool {
        let Some(target) = self.target.clone() else {
            return false;
        };

        if let Some(image) = self.pending_image.take() {
            self.texture = Some(ctx.load_texture("signage_image", image, egui::TextureOptions::LINEAR));
            self.texture_mode = self.image_mode;
        }
        if let Some(frame) = self.poll_frame() {
            self.texture = Some(ctx.load_texture("signage_video", frame.image, egui::TextureOptions::LINEAR));
            self.texture_mode = frame.mode;
        }

        let size = self.size.unwrap_or(target.geometry.size());
        let (pos, inner) = window_placement(&target.geometry, size);
        let builder = egui::ViewportBuilder::default()
            .with_title(format!("Signage Player - {}", target.name))
            .with_decorations(false)
            .with_position(pos)
            .with_inner_size(inner);

        let texture = self.texture.as_ref();
        let mode = self.texture_mode;
        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of("signage_player"),
            builder,
            |ctx, _class| {
                egui::CentralPanel::default()
                    .frame(egui::Frame::none().fill(egui::Color32::BLACK))
                    .show(ctx, |ui| {
                        let area = ui.max_rect();
                        if let Some(texture) = texture {
                            let rect = fit_rect(mode, texture.size_vec2(), area);
                            ui.painter().image(
                                texture.id(),
                                rect,
                                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                                egui::Color32::WHITE,
                            );
                        }
                    });
                ctx.set_cursor_icon(egui::CursorIcon::None);
                ctx.input(|i| i.key_pressed(egui::Key::Escape) || i.viewport().close_requested())
            },
        )
    }
}

impl Surface for PlayerSurface {
    fn open(&mut self, screen: &ScreenTarget) {
        debug!("Opening player surface on {}", screen.name);
        self.target = Some(screen.clone());
        self.size = Some(screen.geometry.size());
    }

    fn render_image(&mut self, path: &Path, mode: DisplayMode, screen: &ScreenGeometry) -> Result<Size> {
        let img = image::open(path).with_context(|| format!("Failed to open image {}", path.display()))?;
        let native = Size::new(img.width(), img.height());

        let scaled = match mode {
            DisplayMode::Fullscreen => img.resize_exact(screen.width, screen.height, FilterType::Triangle),
            DisplayMode::Original if img.width() > screen.width || img.height() > screen.height => {
                img.resize(screen.width, screen.height, FilterType::Triangle)
            }
            DisplayMode::Original => img,
        };
        let rgba = scaled.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        self.pending_image = Some(ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()));
        self.image_mode = mode;
        self.showing_image = true;
        Ok(native)
    }

    fn resize(&mut self, size: Size) {
        self.size = Some(size);
    }

    fn clear(&mut self) {
        self.pending_image = None;
        self.texture = None;
        self.showing_image = false;
        // Frames already sent belong to whatever was playing before.
        self.frames.borrow_and_update();
    }

    fn close(&mut self) {
        self.clear();
        self.target = None;
        self.size = None;
    }
}

/// Top-left position and inner size for a surface of `size` on `screen`,
/// centred when smaller than the screen.
pub fn window_placement(screen: &ScreenGeometry, size: Size) -> ([f32; 2], [f32; 2]) {
    let width = size.width.min(screen.width);
    let height = size.height.min(screen.height);
    let x = screen.x + ((screen.width - width) / 2) as i32;
    let y = screen.y + ((screen.height - height) / 2) as i32;
    ([x as f32, y as f32], [width as f32, height as f32])
}

/// Where to paint a texture of `texture_size` inside `area`.
pub fn fit_rect(mode: DisplayMode, texture_size: egui::Vec2, area: egui::Rect) -> egui::Rect {
    match mode {
        DisplayMode::Fullscreen => area,
        DisplayMode::Original => {
            if texture_size.x <= 0.0 || texture_size.y <= 0.0 {
                return area;
            }
            let scale = (area.width() / texture_size.x).min(area.height() / texture_size.y);
            egui::Rect::from_center_size(area.center(), texture_size * scale)
        }
    }
}
