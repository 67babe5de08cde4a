use std::time::{Duration, Instant};

use egui::{Align, Color32, Layout, RichText, Vec2};

use crate::camera::CameraSession;
use crate::cli::StartupOptions;
use crate::display::{DisplayController, SessionState};
use crate::shutdown;
use crate::template::{browse_template, show_template, DialogBrowser};

use super::label::{ImageLabel, LabelSink};

const TEXT_DIM: Color32 = Color32::from_rgb(130, 135, 148);
const ERROR_RED: Color32 = Color32::from_rgb(220, 80, 70);

const IDLE_REPAINT: Duration = Duration::from_millis(250);

pub struct SiftApp {
    controller: DisplayController<CameraSession>,
    labels: LabelSink,
    browser: DialogBrowser,
}

impl SiftApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: StartupOptions) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());

        let session = CameraSession::new(options.camera_settings());
        let mut app = Self {
            controller: DisplayController::new(session, options.loop_options()),
            labels: LabelSink::default(),
            browser: DialogBrowser::default(),
        };

        if let Some(path) = &options.template {
            if let Err(e) = show_template(path, &mut app.labels) {
                log::warn!("{}", e);
                app.labels.set_status(e.to_string(), true);
            }
        }
        if options.start_camera {
            // Failure is already on the status line
            let _ = app.controller.on_toggle(&mut app.labels, Instant::now());
        }
        app
    }

    fn browse(&mut self) {
        match browse_template(&mut self.browser, &mut self.labels) {
            Ok(_) => {}
            Err(e) => {
                log::warn!("{}", e);
                self.labels.set_status(e.to_string(), true);
            }
        }
    }
}

impl eframe::App for SiftApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if shutdown::ctrlc_received() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // Clicks are collected first so that several clicks in one frame
        // still produce a single toggle.
        let mut toggle_clicked = false;
        let mut browse_clicked = false;

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                browse_clicked = ui.button("Browse").clicked();
                toggle_clicked = ui
                    .button(self.controller.state().toggle_label())
                    .clicked();

                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    let color = if self.labels.status_is_error {
                        ERROR_RED
                    } else {
                        TEXT_DIM
                    };
                    ui.label(RichText::new(&self.labels.status).color(color));
                });
            });
        });

        if browse_clicked {
            self.browse();
        }
        if toggle_clicked {
            let _ = self.controller.on_toggle(&mut self.labels, Instant::now());
        }

        let now = Instant::now();
        self.controller.poll(&mut self.labels, now);
        self.labels.upload(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(2, |cols| {
                let template_caption = self
                    .labels
                    .template_name
                    .clone()
                    .unwrap_or_else(|| "No template loaded".to_string());
                image_column(&mut cols[0], &self.labels.template, &template_caption);

                let camera_caption = match (self.controller.state(), self.labels.frame_size) {
                    (SessionState::Running, Some((w, h))) => format!("Camera {}x{}", w, h),
                    (SessionState::Running, None) => "Waiting for frames...".to_string(),
                    (SessionState::Stopped, _) => "Camera off".to_string(),
                };
                image_column(&mut cols[1], &self.labels.camera, &camera_caption);
            });
        });

        // Idle windows still wake up to notice Ctrl+C
        let wait = self
            .controller
            .time_until_next_tick(now)
            .unwrap_or(IDLE_REPAINT);
        ctx.request_repaint_after(wait);
    }
}

impl Drop for SiftApp {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}

fn image_column(ui: &mut egui::Ui, label: &ImageLabel, caption: &str) {
    ui.label(RichText::new(caption).color(TEXT_DIM));
    match label.texture() {
        Some(texture) => {
            ui.add(egui::Image::new(texture).shrink_to_fit());
        }
        None => {
            let (rect, _) = ui.allocate_exact_size(Vec2::new(320.0, 240.0), egui::Sense::hover());
            ui.painter().rect_filled(rect, 4.0, Color32::from_rgb(20, 22, 28));
        }
    }
}
