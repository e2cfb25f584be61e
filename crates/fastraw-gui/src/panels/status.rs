use crate::app::FastRawApp;

pub fn show(ctx: &egui::Context, app: &FastRawApp) {
    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.add_space(2.0);
        let status = app.session.status();
        let text = egui::RichText::new(status.to_string()).small();
        if status.is_error() {
            ui.colored_label(ui.visuals().error_fg_color, text);
        } else {
            ui.label(text);
        }
        ui.add_space(2.0);
    });
}
