// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
fn main() -> eframe::Result<()> {
    use eframe::{egui, NativeOptions};
    use tracing::Level;
    use tweak_utility::{
        config::{AppPaths, WindowConfig},
        constants::{APP_TITLE, MIN_WINDOW_SIZE},
        ui::app::TweakApp,
    };

    // Initialize logging based on build mode
    #[cfg(debug_assertions)]
    {
        // Log to the terminal in debug mode
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_target(false)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        // In release mode, set up a no-op subscriber to disable logging
        use tracing_subscriber::Registry;
        let noop_subscriber = Registry::default();
        tracing::subscriber::set_global_default(noop_subscriber)
            .expect("Failed to set global subscriber.");
    }

    let paths = AppPaths::from_executable();
    let window = WindowConfig::load(&paths.config);
    tracing::debug!("Using stores in '{}'.", paths.tweaks.display());

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(APP_TITLE)
            .with_inner_size(window.size)
            .with_position(window.position)
            .with_min_inner_size(MIN_WINDOW_SIZE),
        ..Default::default()
    };

    let run_span = tracing::span!(Level::INFO, "Run Native");
    run_span.in_scope(|| {
        eframe::run_native(
            APP_TITLE,
            options,
            Box::new(move |cc| Ok(Box::new(TweakApp::new(cc, paths, window)))),
        )
    })
}

#[cfg(not(windows))]
fn main() {
    eprintln!(
        "{} only runs on Windows.",
        tweak_utility::constants::APP_TITLE
    );
    std::process::exit(1);
}
