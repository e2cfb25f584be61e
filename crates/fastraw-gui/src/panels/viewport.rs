use std::time::Instant;

use fastraw_core::frame::ViewportSize;
use fastraw_core::viewport::AffordanceAnchor;

use crate::app::FastRawApp;

pub fn show(ctx: &egui::Context, app: &mut FastRawApp, now: Instant) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.fill(egui::Color32::BLACK))
        .show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let ppp = ctx.pixels_per_point();
            app.sync_viewport(ctx, physical_size(rect, ppp), now);

            let response = ui.allocate_rect(rect, egui::Sense::click());

            if let Some(texture) = &app.texture {
                let size = texture.size_vec2() / ppp;
                let img_rect = egui::Rect::from_center_size(rect.center(), size);
                ui.painter().image(
                    texture.id(),
                    img_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            let mut open_requested = false;
            if let Some(anchor) = app.session.affordance() {
                let button_rect = anchor_rect(rect, anchor, ppp);
                let button = egui::Button::new(egui::RichText::new("Open Image").size(16.0));
                open_requested |= ui.put(button_rect, button).clicked();
            }

            response.context_menu(|ui| {
                if ui.button("Open RAW file").clicked() {
                    open_requested = true;
                    ui.close();
                }
                ui.separator();
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            if open_requested {
                app.open_dialog(ctx);
            }
        });
}

fn physical_size(rect: egui::Rect, ppp: f32) -> ViewportSize {
    ViewportSize::new(
        (rect.width() * ppp).round().max(0.0) as u32,
        (rect.height() * ppp).round().max(0.0) as u32,
    )
}

/// The anchor is positioned in physical pixels but the button keeps its
/// size in points, so it does not shrink on high-DPI displays.
fn anchor_rect(rect: egui::Rect, anchor: AffordanceAnchor, ppp: f32) -> egui::Rect {
    let size = egui::vec2(anchor.width as f32, anchor.height as f32);
    let (cx, cy) = anchor.center();
    let center = rect.min + egui::vec2(cx, cy) / ppp;
    egui::Rect::from_min_size((center - size / 2.0).max(rect.min), size)
}
