use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Instant;

use fastraw_core::consts::RAW_EXTENSIONS;
use fastraw_core::frame::ViewportSize;
use fastraw_core::raw::RawloaderDecoder;
use fastraw_core::session::SessionController;
use tracing::debug;

use crate::convert::to_color_image;
use crate::panels;

pub struct FastRawApp {
    pub session: SessionController,
    /// Paths picked in the file dialog (or given on the command line).
    open_tx: mpsc::Sender<PathBuf>,
    open_rx: mpsc::Receiver<PathBuf>,
    pub texture: Option<egui::TextureHandle>,
    texture_version: u64,
}

impl FastRawApp {
    pub fn new(ctx: &egui::Context, startup: Option<PathBuf>) -> Self {
        let repaint = ctx.clone();
        let session = SessionController::new(Arc::new(RawloaderDecoder::new()))
            .with_waker(Arc::new(move || repaint.request_repaint()));

        let (open_tx, open_rx) = mpsc::channel();
        if let Some(path) = startup {
            let _ = open_tx.send(path);
        }

        Self {
            session,
            open_tx,
            open_rx,
            texture: None,
            texture_version: 0,
        }
    }

    /// Show the native file dialog without blocking the UI thread.
    pub fn open_dialog(&self, ctx: &egui::Context) {
        let open_tx = self.open_tx.clone();
        let ctx = ctx.clone();
        std::thread::spawn(move || {
            if let Some(path) = rfd::FileDialog::new()
                .add_filter("RAW files", RAW_EXTENSIONS)
                .add_filter("All files", &["*"])
                .pick_file()
            {
                let _ = open_tx.send(path);
                ctx.request_repaint();
            }
        });
    }

    /// Feed the current surface size and fire due timers, then refresh the
    /// texture if the displayed frame changed.
    pub fn sync_viewport(&mut self, ctx: &egui::Context, size: ViewportSize, now: Instant) {
        self.session.on_resize(size, now);
        self.session.poll_timers(now);

        let version = self.session.frame_version();
        if version == self.texture_version {
            return;
        }
        self.texture_version = version;
        self.texture = self.session.frame().map(|frame| {
            ctx.load_texture("frame", to_color_image(&frame.image), egui::TextureOptions::LINEAR)
        });
    }

    fn drain_open_requests(&mut self) {
        while let Ok(path) = self.open_rx.try_recv() {
            if let Err(e) = self.session.open_file(path) {
                debug!(error = %e, "Open request failed");
            }
        }
    }

    fn handle_shortcuts(&self, ctx: &egui::Context) {
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::O)) {
            self.open_dialog(ctx);
        }
        if ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, egui::Key::Escape)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
}

impl eframe::App for FastRawApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain_open_requests();
        self.session.pump(now);
        self.handle_shortcuts(ctx);

        panels::status::show(ctx, self);
        panels::viewport::show(ctx, self, now);

        if let Some(delay) = self.session.next_wakeup(Instant::now()) {
            ctx.request_repaint_after(delay);
        }
    }
}
