// src/constants.rs

/// Scheme created and activated by the power plan action.
pub const PRO_POWER_PLAN_GUID: &str = "a1b2c3d4-e5f6-a1b2-c3d4-e5f6a1b2c3d4";
/// High Performance scheme that the power plan is duplicated from.
pub const BASE_POWER_PLAN_GUID: &str = "8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c";
pub const PRO_POWER_PLAN_NAME: &str = "Pro Tweak Utility Plan";

pub const TWEAKS_FILE: &str = "tweaks.json";
pub const UNDO_FILE: &str = "undo_data.json";
pub const CONFIG_FILE: &str = "config.json";

/// Tweaks offered by the system analyzer when they are not applied yet.
pub const RECOMMENDED_TWEAK_IDS: [&str; 5] = [
    "prioritize_apps",
    "optimize_memory",
    "disable_network_throttling",
    "disable_telemetry_services",
    "disable_game_bar",
];

pub const APP_TITLE: &str = "Pro Tweak Utility";

pub const UI_SPACING: f32 = 10.0; // Spacing between UI elements
pub const UI_PADDING: f32 = 3.0; // Padding inside UI elements

pub const TWEAK_CARD_WIDTH: f32 = 300.0;
pub const TWEAK_CARD_HEIGHT: f32 = 110.0;

pub const DEFAULT_WINDOW_SIZE: [f32; 2] = [1200.0, 800.0];
pub const DEFAULT_WINDOW_POSITION: [f32; 2] = [100.0, 100.0];
pub const MIN_WINDOW_SIZE: [f32; 2] = [800.0, 600.0];

pub const LABEL_FONT_SIZE: f32 = 14.0;

pub const SIDE_PANEL_WIDTH: f32 = 180.0;
