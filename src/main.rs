//! Application entry point: Capture & Answer.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (returns default on first run).
//! 3. Create the [`tokio`] runtime (multi-thread, 2 workers).
//! 4. Build the stages (screen host, recorder, transcriber, answer stage).
//! 5. Spawn the pipeline coordinator on the runtime.
//! 6. Register global shortcuts and start the listener thread.
//! 7. Run [`eframe::run_native`]; blocks the main thread until the window
//!    is closed.

use std::sync::Arc;

use anyhow::Context as _;
use eframe::egui;
use tokio::sync::mpsc;

use capture_answer::{
    app::CaptureAnswerApp,
    audio::{CpalDevice, RecordingSession},
    capture::XcapHost,
    config::{AppConfig, AppPaths},
    llm::AnswerStage,
    pipeline::{PipelineCommand, PipelineCoordinator, PipelineSettings, PipelineStages},
    shortcut::{MoveDirection, ShortcutBridge, ShortcutKind, ShortcutListener, SurfaceHandle},
    stt::WhisperApiTranscriber,
};

// ---------------------------------------------------------------------------
// Native options builder
// ---------------------------------------------------------------------------

fn native_options(config: &AppConfig) -> eframe::NativeOptions {
    let (width, height) = config.ui.window_size;
    let mut vp = egui::ViewportBuilder::default()
        .with_title("Capture & Answer")
        .with_inner_size([width, height])
        .with_min_inner_size([420.0, 360.0]);

    if config.ui.always_on_top {
        vp = vp.with_always_on_top();
    }

    if let Some((x, y)) = config.ui.window_position {
        vp = vp.with_position(egui::pos2(x, y));
    }

    eframe::NativeOptions {
        viewport: vp,
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Shortcuts
// ---------------------------------------------------------------------------

/// Bind the configured accelerators. A bad accelerator is logged and skipped
/// so the rest still work.
fn register_shortcuts(bridge: &ShortcutBridge, config: &AppConfig) {
    let shortcuts = &config.shortcuts;
    let bindings = [
        (shortcuts.screenshot.as_str(), ShortcutKind::Screenshot),
        (shortcuts.voice.as_str(), ShortcutKind::VoiceToggle),
        (shortcuts.paste.as_str(), ShortcutKind::PasteImage),
        (shortcuts.move_up.as_str(), ShortcutKind::Move(MoveDirection::Up)),
        (shortcuts.move_down.as_str(), ShortcutKind::Move(MoveDirection::Down)),
        (shortcuts.move_left.as_str(), ShortcutKind::Move(MoveDirection::Left)),
        (shortcuts.move_right.as_str(), ShortcutKind::Move(MoveDirection::Right)),
    ];
    for (accelerator, kind) in bindings {
        if let Err(e) = bridge.register_str(accelerator, kind) {
            log::warn!("Shortcut {accelerator:?} for {kind:?} not registered: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Capture & Answer starting up");

    // 2. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    // 3. Tokio runtime (2 worker threads; stages are network-bound)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 4. Stages
    let surface = SurfaceHandle::new();
    let device = CpalDevice::new(
        config.recording.device.clone(),
        config.recording.max_recording_secs,
    );
    let stages = PipelineStages {
        screen: Arc::new(XcapHost),
        surface: Arc::new(surface.clone()),
        recorder: RecordingSession::new(Arc::new(device), config.recording.clone()),
        transcriber: Arc::new(WhisperApiTranscriber::from_config(
            &config.transcription,
            config.providers.openai_key(),
            config.providers.timeout_secs,
        )),
        answers: AnswerStage::from_config(&config),
    };
    let settings = PipelineSettings::from_config(&config, &paths);

    // 5. Coordinator
    let (command_tx, command_rx) = mpsc::channel::<PipelineCommand>(32);
    let (coordinator, status) = PipelineCoordinator::new(stages, settings);
    rt.spawn(coordinator.run(command_rx));

    // 6. Global shortcuts
    let bridge = Arc::new(
        ShortcutBridge::new(Arc::new(surface.clone()), command_tx.clone())
            .with_move_step(config.shortcuts.move_step),
    );
    register_shortcuts(&bridge, &config);
    let _listener = match ShortcutListener::start(Arc::clone(&bridge)) {
        Ok(listener) => Some(listener),
        Err(e) => {
            log::warn!("Global shortcuts unavailable: {e}");
            None
        }
    };

    // 7. UI (blocks until the window is closed)
    let app = CaptureAnswerApp::new(command_tx, status, surface, config.clone());
    let options = native_options(&config);

    eframe::run_native(
        "Capture & Answer",
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| anyhow::anyhow!("window failed: {e}"))?;

    bridge.unregister_all();
    log::info!("Capture & Answer shut down");
    Ok(())
}
