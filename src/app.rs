//! Capture & Answer window: egui/eframe application.
//!
//! # Architecture
//!
//! [`CaptureAnswerApp`] is the top-level [`eframe::App`]. It never mutates
//! pipeline state itself:
//!
//! * `command_tx`: sends [`PipelineCommand`]s to the coordinator.
//! * `status`: the [`StatusReader`] the coordinator publishes into; read once
//!   per frame.
//! * `surface`: the [`SurfaceHandle`] the shortcut bridge consults. Updated
//!   every frame with the window bounds and focus; focus, paste and move
//!   requests from shortcuts are applied here.
//!
//! # Layout
//!
//! | Area | Content |
//! |------|---------|
//! | Title bar | status icon, provider toggle, settings, close |
//! | Settings | API keys, image host account, microphone; saved to `settings.toml` |
//! | Prompt | multi-line prompt, Ask (Cmd/Ctrl+Enter) |
//! | Actions | screenshot, record / stop, paste image, reset |
//! | Status | spinner + status line, notice, error |
//! | Answer | transcript, then prose and framed code blocks with Copy |

use std::time::{Duration, Instant};

use eframe::egui;
use tokio::sync::mpsc;

use crate::audio::CpalDevice;
use crate::capture::{capture_clipboard, read_system_clipboard, ImagePayload, Rect};
use crate::config::{AppConfig, ProviderKind};
use crate::format::FormattedSegment;
use crate::pipeline::{CaptureTrigger, PipelineCommand, PipelineStage, PipelineView, StatusReader};
use crate::shortcut::SurfaceHandle;

/// A paste seen by both the key hook and egui within this window is one paste.
const PASTE_DEBOUNCE: Duration = Duration::from_millis(400);

// ---------------------------------------------------------------------------
// SettingsDraft
// ---------------------------------------------------------------------------

/// The settings panel's editable copy of the configuration.
#[derive(Debug, Clone, Default, PartialEq)]
struct SettingsDraft {
    openai_key: String,
    gemini_key: String,
    cloudflare_account: String,
    /// `None` is the system default input.
    device: Option<String>,
}

impl SettingsDraft {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            openai_key: config.providers.openai_api_key.clone().unwrap_or_default(),
            gemini_key: config.providers.gemini_api_key.clone().unwrap_or_default(),
            cloudflare_account: config.image_host.cloudflare_account.clone().unwrap_or_default(),
            device: config.recording.device.clone(),
        }
    }

    /// Write the draft into `config`; blank fields clear the setting.
    fn apply(&self, config: &mut AppConfig) {
        config.providers.openai_api_key = optional(&self.openai_key);
        config.providers.gemini_api_key = optional(&self.gemini_key);
        config.image_host.cloudflare_account = optional(&self.cloudflare_account);
        config.recording.device = self.device.clone();
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

// ---------------------------------------------------------------------------
// CaptureAnswerApp
// ---------------------------------------------------------------------------

pub struct CaptureAnswerApp {
    // ── Channels ─────────────────────────────────────────────────────────
    command_tx: mpsc::Sender<PipelineCommand>,
    status: StatusReader,
    surface: SurfaceHandle,

    // ── UI state ─────────────────────────────────────────────────────────
    /// Prompt being edited. Mirrored to the pipeline on every change.
    prompt_draft: String,
    show_settings: bool,
    settings_draft: SettingsDraft,
    input_devices: Vec<String>,
    settings_message: Option<String>,
    attached: bool,
    spinner_phase: f32,
    last_outer_pos: Option<egui::Pos2>,
    last_paste: Option<Instant>,

    // ── Configuration ────────────────────────────────────────────────────
    config: AppConfig,
}

impl CaptureAnswerApp {
    pub fn new(
        command_tx: mpsc::Sender<PipelineCommand>,
        status: StatusReader,
        surface: SurfaceHandle,
        config: AppConfig,
    ) -> Self {
        let prompt_draft = status.with(|view| view.prompt.clone());
        Self {
            command_tx,
            status,
            surface,
            prompt_draft,
            show_settings: false,
            settings_draft: SettingsDraft::default(),
            input_devices: Vec::new(),
            settings_message: None,
            attached: false,
            spinner_phase: 0.0,
            last_outer_pos: None,
            last_paste: None,
            config,
        }
    }

    fn send(&self, command: PipelineCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: pipeline command dropped: {e}");
        }
    }

    // ── Host surface ─────────────────────────────────────────────────────

    /// Keep the surface record current and honour focus requests.
    fn sync_surface(&mut self, ctx: &egui::Context) {
        if !self.attached {
            self.surface.attach(ctx.clone());
            self.attached = true;
        }

        let (outer, ppp, focused) =
            ctx.input(|i| (i.viewport().outer_rect, i.pixels_per_point, i.focused));
        if let Some(outer) = outer {
            self.last_outer_pos = Some(outer.min);
        }
        self.surface
            .update(true, outer.map(|r| surface_rect(r, ppp)));
        self.surface.set_focused(focused);

        if self.surface.take_focus_request() {
            ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }

        if let Some(offset) = self.surface.take_move() {
            if let Some(pos) = self.last_outer_pos {
                let target = moved_position(pos, offset);
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(target));
                self.last_outer_pos = Some(target);
            }
        }
    }

    // ── Clipboard ────────────────────────────────────────────────────────

    fn paste_image(&self) {
        match read_system_clipboard() {
            Ok(items) => match capture_clipboard(&items) {
                Some(image) => self.send(PipelineCommand::Trigger(CaptureTrigger::ClipboardImage {
                    bytes: image.bytes,
                    mime_type: image.mime_type,
                })),
                None => log::debug!("ui: clipboard holds no image"),
            },
            Err(e) => log::warn!("ui: {e}"),
        }
    }

    /// Cmd/Ctrl+V pastes a clipboard image.
    ///
    /// Two sources: egui's paste event (text on the clipboard) and the key
    /// hook's request (any clipboard, including image-only ones, which egui
    /// reports as nothing at all).
    fn poll_paste_shortcut(&mut self, ctx: &egui::Context) {
        let typed = ctx.input(|i| paste_in_events(&i.events));
        let hooked = self.surface.take_paste_request();
        if !typed && !hooked {
            return;
        }

        let now = Instant::now();
        if !paste_due(self.last_paste, now) {
            return;
        }
        self.last_paste = Some(now);
        self.paste_image();
    }

    // ── Title bar ────────────────────────────────────────────────────────

    fn draw_title_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context, view: &PipelineView) {
        ui.horizontal(|ui| {
            let stage = view.stage();
            ui.label(egui::RichText::new(stage_icon(&stage)).color(stage_color(&stage)));
            ui.label(
                egui::RichText::new("Capture & Answer")
                    .color(egui::Color32::from_rgb(200, 200, 200))
                    .size(13.0),
            );

            ui.add_space(12.0);
            let mut selected = view.provider;
            for kind in [ProviderKind::OpenAi, ProviderKind::Gemini] {
                ui.selectable_value(&mut selected, kind, kind.label());
            }
            if selected != view.provider {
                self.send(PipelineCommand::SelectProvider(selected));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add(egui::Button::new(egui::RichText::new("x").size(12.0)).frame(false))
                    .clicked()
                {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if ui
                    .add(egui::Button::new(egui::RichText::new("=").size(12.0)).frame(false))
                    .clicked()
                {
                    self.toggle_settings();
                }
            });
        });
    }

    // ── Prompt and actions ───────────────────────────────────────────────

    fn draw_prompt(&mut self, ui: &mut egui::Ui, view: &PipelineView) {
        let submit = ui.input_mut(|i| i.consume_key(egui::Modifiers::COMMAND, egui::Key::Enter));

        let response = ui.add(
            egui::TextEdit::multiline(&mut self.prompt_draft)
                .hint_text("Ask about the screenshot, or type a question")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.send(PipelineCommand::SetPrompt(self.prompt_draft.clone()));
        }

        ui.horizontal(|ui| {
            let ask = ui.add_enabled(!view.is_busy(), egui::Button::new("Ask"));
            if ask.clicked() || (submit && !view.is_busy()) {
                self.send(PipelineCommand::Trigger(CaptureTrigger::TextSubmit(
                    self.prompt_draft.clone(),
                )));
            }
            ui.label(
                egui::RichText::new("Cmd/Ctrl+Enter")
                    .color(egui::Color32::from_rgb(120, 120, 120))
                    .size(10.0),
            );
        });
    }

    fn draw_actions(&mut self, ui: &mut egui::Ui, view: &PipelineView) {
        let busy = view.is_busy();
        let recording = view.is_recording();

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!busy, egui::Button::new("Screenshot"))
                .on_hover_text(self.config.shortcuts.screenshot.as_str())
                .clicked()
            {
                self.send(PipelineCommand::Trigger(CaptureTrigger::Screenshot));
            }

            let record_label = if recording { "Stop" } else { "Record" };
            if ui
                .add_enabled(!busy || recording, egui::Button::new(record_label))
                .on_hover_text(self.config.shortcuts.voice.as_str())
                .clicked()
            {
                self.send(PipelineCommand::Trigger(CaptureTrigger::VoiceToggle));
            }

            if ui
                .add_enabled(!busy, egui::Button::new("Paste image"))
                .clicked()
            {
                self.paste_image();
            }

            if ui
                .add_enabled(!busy || recording, egui::Button::new("Reset"))
                .clicked()
            {
                self.prompt_draft = self.config.prompt.default_prompt.clone();
                self.send(PipelineCommand::Reset);
            }
        });

        if let Some(image) = &view.image {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(image_summary(image))
                        .color(egui::Color32::from_rgb(140, 180, 140))
                        .size(11.0),
                );
                if ui
                    .add_enabled(!busy, egui::Button::new("Clear").small())
                    .clicked()
                {
                    self.send(PipelineCommand::ClearImage);
                }
            });
        }
    }

    // ── Status ───────────────────────────────────────────────────────────

    fn draw_status(&self, ui: &mut egui::Ui, view: &PipelineView) {
        let stage = view.stage();
        let text = if stage.is_busy() {
            format!("{} {}", self.spinner_char(), view.status)
        } else {
            view.status.clone()
        };
        ui.label(
            egui::RichText::new(text)
                .color(stage_color(&stage))
                .size(12.0),
        );

        if let Some(notice) = &view.notice {
            ui.label(
                egui::RichText::new(notice.as_str())
                    .color(egui::Color32::from_rgb(220, 200, 100))
                    .size(11.0),
            );
        }

        if let Some(error) = &view.error {
            let hint = if error.recoverable {
                " (try again)"
            } else {
                ""
            };
            ui.label(
                egui::RichText::new(format!("{}: {}{hint}", error.stage, error.message))
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(12.0),
            );
        }
    }

    // ── Answer ───────────────────────────────────────────────────────────

    fn draw_answer(&self, ui: &mut egui::Ui, ctx: &egui::Context, view: &PipelineView) {
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if let Some(transcript) = &view.transcript {
                    ui.label(
                        egui::RichText::new(format!("\u{201c}{transcript}\u{201d}"))
                            .color(egui::Color32::from_rgb(130, 130, 130))
                            .italics()
                            .size(12.0),
                    );
                    ui.add_space(6.0);
                }

                for segment in &view.segments {
                    match segment {
                        FormattedSegment::Text { content } => {
                            ui.label(egui::RichText::new(content.trim_matches('\n')).size(13.0));
                        }
                        FormattedSegment::Code {
                            language,
                            title,
                            content,
                        } => draw_code_block(ui, ctx, language, title.as_deref(), content),
                    }
                    ui.add_space(4.0);
                }

                if let Some(answer) = &view.answer {
                    if ui.button("Copy answer").clicked() {
                        ctx.copy_text(answer.clone());
                    }
                }
            });
    }

    // ── Settings ─────────────────────────────────────────────────────────

    fn toggle_settings(&mut self) {
        self.show_settings = !self.show_settings;
        if self.show_settings {
            self.settings_draft = SettingsDraft::from_config(&self.config);
            self.input_devices = CpalDevice::input_device_names();
            self.settings_message = None;
        }
    }

    fn save_settings(&mut self) {
        self.settings_draft.apply(&mut self.config);
        self.settings_message = Some(match self.config.save() {
            Ok(()) => {
                log::info!("ui: settings saved");
                "Saved. Restart to use the new keys and microphone.".into()
            }
            Err(e) => {
                log::warn!("ui: could not save settings: {e}");
                format!("Could not save settings: {e}")
            }
        });
    }

    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        let dim = egui::Color32::from_rgb(140, 140, 140);
        let label = |ui: &mut egui::Ui, text: &str| {
            ui.label(egui::RichText::new(text).color(dim).size(11.0));
        };

        let draft = &mut self.settings_draft;
        egui::Grid::new("settings_grid")
            .num_columns(2)
            .spacing([8.0, 6.0])
            .show(ui, |ui| {
                label(ui, "OpenAI key");
                ui.add(egui::TextEdit::singleline(&mut draft.openai_key).password(true));
                ui.end_row();

                label(ui, "Gemini key");
                ui.add(egui::TextEdit::singleline(&mut draft.gemini_key).password(true));
                ui.end_row();

                label(ui, "Cloudflare account");
                ui.text_edit_singleline(&mut draft.cloudflare_account);
                ui.end_row();

                label(ui, "Microphone");
                egui::ComboBox::from_id_salt("input_device")
                    .selected_text(draft.device.as_deref().unwrap_or("System default"))
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut draft.device, None, "System default");
                        for name in &self.input_devices {
                            ui.selectable_value(&mut draft.device, Some(name.clone()), name.as_str());
                        }
                    });
                ui.end_row();
            });

        label(
            ui,
            &format!(
                "Models: {} / {}, transcription {} ({})",
                self.config.providers.openai_model,
                self.config.providers.gemini_model,
                self.config.transcription.model,
                self.config.transcription.language
            ),
        );

        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save_settings();
            }
            if ui.button("Close").clicked() {
                self.show_settings = false;
            }
        });
        if let Some(message) = &self.settings_message {
            label(ui, message.as_str());
        }

        if ui.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.show_settings = false;
        }
    }

    fn spinner_char(&self) -> char {
        let chars = ['|', '/', '-', '\\'];
        chars[(self.spinner_phase as usize) % chars.len()]
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

fn draw_code_block(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    language: &str,
    title: Option<&str>,
    content: &str,
) {
    egui::Frame::new()
        .fill(egui::Color32::from_rgb(20, 20, 24))
        .corner_radius(egui::CornerRadius::same(6))
        .inner_margin(egui::Margin::same(8))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                let header = match title {
                    Some(title) => format!("{language} · {title}"),
                    None => language.to_string(),
                };
                ui.label(
                    egui::RichText::new(header)
                        .color(egui::Color32::from_rgb(120, 160, 220))
                        .size(11.0),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.small_button("Copy").clicked() {
                        ctx.copy_text(content.to_string());
                    }
                });
            });
            ui.label(
                egui::RichText::new(content)
                    .monospace()
                    .color(egui::Color32::from_rgb(220, 220, 220)),
            );
        });
}

/// Window bounds in physical pixels, the unit screen capture works in.
fn surface_rect(outer: egui::Rect, pixels_per_point: f32) -> Rect {
    Rect {
        x: (outer.min.x * pixels_per_point).round() as i32,
        y: (outer.min.y * pixels_per_point).round() as i32,
        width: (outer.width() * pixels_per_point).round().max(0.0) as u32,
        height: (outer.height() * pixels_per_point).round().max(0.0) as u32,
    }
}

/// Whether this frame's input holds a paste keystroke.
///
/// egui-winit turns Cmd/Ctrl+V into [`egui::Event::Paste`] and swallows the
/// key itself; other backends may deliver the key event instead.
fn paste_in_events(events: &[egui::Event]) -> bool {
    events.iter().any(|event| match event {
        egui::Event::Paste(_) => true,
        egui::Event::Key {
            key: egui::Key::V,
            pressed: true,
            modifiers,
            ..
        } => modifiers.command,
        _ => false,
    })
}

fn paste_due(last: Option<Instant>, now: Instant) -> bool {
    last.map_or(true, |at| now.saturating_duration_since(at) >= PASTE_DEBOUNCE)
}

fn moved_position(pos: egui::Pos2, (dx, dy): (i32, i32)) -> egui::Pos2 {
    pos + egui::vec2(dx as f32, dy as f32)
}

fn image_summary(image: &ImagePayload) -> String {
    let format = image.mime_type.split('/').nth(1).unwrap_or("image");
    let kb = image.bytes.len().div_ceil(1024);
    let hosted = if image.is_hosted() { ", uploaded" } else { "" };
    format!("Image attached ({format}, {kb} KB{hosted})")
}

fn stage_icon(stage: &PipelineStage) -> &'static str {
    match stage {
        PipelineStage::Idle => "  ",
        PipelineStage::Recording => "* ",
        PipelineStage::Done => "OK",
        PipelineStage::Failed(_) => "! ",
        _ => ". ",
    }
}

fn stage_color(stage: &PipelineStage) -> egui::Color32 {
    match stage {
        PipelineStage::Idle | PipelineStage::Done => egui::Color32::from_rgb(140, 140, 140),
        PipelineStage::Recording => egui::Color32::from_rgb(255, 68, 68),
        PipelineStage::Failed(_) => egui::Color32::from_rgb(255, 136, 68),
        _ => egui::Color32::from_rgb(68, 136, 255),
    }
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for CaptureAnswerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.sync_surface(ctx);
        let view = self.status.snapshot();

        self.spinner_phase += 0.08;
        if self.spinner_phase >= 4.0 {
            self.spinner_phase = 0.0;
        }

        // The coordinator publishes from another thread; poll for changes.
        let repaint = if view.is_busy() { 66 } else { 250 };
        ctx.request_repaint_after(Duration::from_millis(repaint));

        let frame = egui::Frame::new()
            .fill(egui::Color32::from_rgb(30, 30, 30))
            .inner_margin(egui::Margin::same(10));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            self.draw_title_bar(ui, ctx, &view);
            ui.separator();

            if self.show_settings {
                self.draw_settings(ui);
                ui.separator();
            }

            self.draw_prompt(ui, &view);
            self.draw_actions(ui, &view);
            self.poll_paste_shortcut(ctx);

            ui.separator();
            self.draw_status(ui, &view);
            ui.separator();
            self.draw_answer(ui, ctx, &view);
        });
    }

    /// Persist the window position and prompt, then detach the surface.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.surface.close();
        if let Some(pos) = self.last_outer_pos {
            self.config.ui.window_position = Some((pos.x, pos.y));
        }
        self.config.prompt.last_prompt = Some(self.prompt_draft.clone());
        if let Err(e) = self.config.save() {
            log::warn!("ui: could not save window state: {e}");
        }
        log::info!("ui: window closing");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
