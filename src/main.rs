//! Auto Angler - console front end
//!
//! Loads settings and templates, registers the start/stop/quit hotkeys and keeps the
//! Win32 message queue pumped while the fishing worker runs in the background.

use std::path::Path;
use std::thread;
use std::time::Duration;

use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};

use auto_angler::fishing::{Devices, FishingBot};
use auto_angler::log_main::Journal;
use auto_angler::screen_reader::{ScreenService, TemplateStore};
use auto_angler::utils::keybinds::hotkey_for;
use auto_angler::utils::path::{get_data_dir, templates_dir};
use auto_angler::utils::settings::{get_settings, get_settings_path};
use auto_angler::window::{pump_messages, GameWindow};
use auto_angler::{EnigoInput, EventSink, SessionEvent};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const POLL_INTERVAL: Duration = Duration::from_millis(50);

fn init_logging(base: &Path) {
    let log_dir = base.join("debug").join("log");
    let _ = std::fs::create_dir_all(&log_dir);

    let log_file_path = log_dir.join("debug.log");
    let file_result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path);

    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    const LOG_FILTER: &str = "info,auto_angler=info";

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER));

    match file_result {
        Ok(file) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE);

            let stdout_layer = tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(stdout_layer)
                .init();

            tracing::info!("[INIT] Logging initialized, file: {:?}", log_file_path);
        }
        Err(e) => {
            // Fallback: stdout-only logging with same filter
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(LOG_FILTER))
                .init();
            eprintln!(
                "[INIT] Failed to create debug log file at {:?}: {}",
                log_file_path, e
            );
        }
    }
}

/// Registered hotkey id and the key name shown to the user
fn register(manager: &GlobalHotKeyManager, key: &str, action: &str) -> (Option<u32>, String) {
    let Some((name, hotkey)) = hotkey_for(key) else {
        tracing::warn!("[INIT] Unknown {} key '{}'", action, key);
        return (None, "unset".to_string());
    };
    if let Err(e) = manager.register(hotkey) {
        tracing::warn!("[INIT] Failed to register {} hotkey {}: {}", action, name, e);
        return (None, "unset".to_string());
    }
    (Some(hotkey.id()), name)
}

fn main() {
    let base = get_data_dir();
    init_logging(&base);

    println!("Auto Angler {}", APP_VERSION);
    println!("================================");

    let settings = get_settings();
    let template_folder = templates_dir(&base);
    let templates = TemplateStore::load(
        &template_folder,
        &settings.marker_template,
        &settings.bar_template,
    );
    if !templates.is_complete() {
        println!(
            "Template images missing from {:?}. The bot cannot start until they are added.",
            template_folder
        );
    }

    let input = match EnigoInput::new() {
        Ok(input) => input,
        Err(e) => {
            tracing::error!("[INIT] {:#}", e);
            return;
        }
    };
    let devices = Devices {
        screen: Box::new(ScreenService::new()),
        input: Box::new(input),
    };

    let (events, event_rx) = EventSink::channel();
    let mut bot = FishingBot::new(templates, devices, events)
        .with_focus(Box::new(GameWindow::new(settings.window_title.clone())))
        .with_journal(Journal::in_data_dir());
    bot.apply_settings(&settings);
    if bot.region().is_none() {
        println!(
            "No fishing area configured. Set \"region\" in {:?}.",
            get_settings_path()
        );
    }

    let manager = match GlobalHotKeyManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!("[INIT] Failed to create hotkey manager: {}", e);
            return;
        }
    };
    let (start_id, start_name) = register(&manager, &settings.start_key, "start");
    let (stop_id, stop_name) = register(&manager, &settings.stop_key, "stop");
    let (quit_id, quit_name) = register(&manager, &settings.quit_key, "quit");
    println!(
        "Hotkeys: START={}, STOP={}, QUIT={}",
        start_name, stop_name, quit_name
    );

    let debug_frame_path = base.join("debug").join("last_frame.png");
    if settings.save_debug_frames {
        let _ = std::fs::create_dir_all(base.join("debug"));
    }

    let state = bot.state();
    let mut last_activity = state.activity();
    let hotkeys = GlobalHotKeyEvent::receiver();

    loop {
        pump_messages();

        let mut quit = false;
        while let Ok(event) = hotkeys.try_recv() {
            if event.state != HotKeyState::Pressed {
                continue;
            }
            let id = Some(event.id);
            if id == start_id {
                if let Err(e) = bot.start() {
                    tracing::debug!("[HOTKEY] Start refused: {}", e);
                }
            } else if id == stop_id {
                bot.stop();
            } else if id == quit_id {
                quit = true;
            }
        }

        // Log lines already reach stdout through tracing
        for event in event_rx.try_iter() {
            if let SessionEvent::DebugImage(frame) = event {
                if settings.save_debug_frames {
                    if let Err(e) = frame.save(&debug_frame_path) {
                        tracing::warn!("[DEBUG] Failed to save debug frame: {}", e);
                    }
                }
            }
        }

        let activity = state.activity();
        if activity != last_activity {
            println!("[{}] {}", activity.description(), state.to_json());
            last_activity = activity;
        }

        if quit {
            break;
        }
        thread::sleep(POLL_INTERVAL);
    }

    println!("App is closing, cleaning up...");
    if !bot.shutdown() {
        println!("Worker still busy, exiting anyway.");
    }
}
