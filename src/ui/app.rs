// src/ui/app.rs

use std::{collections::HashSet, time::Duration};

use eframe::{egui, App, Frame};
use egui::{Color32, FontFamily, FontId, RichText};
use egui_dialogs::{DialogDetails, Dialogs, StandardDialog, StandardReply};
use indexmap::IndexMap;
use tracing::Level;

use super::button::{ActionButton, ButtonState, BUTTON_DIMENSIONS};
use crate::{
    config::{AppPaths, WindowConfig},
    constants::{
        APP_TITLE, LABEL_FONT_SIZE, SIDE_PANEL_WIDTH, TWEAK_CARD_HEIGHT, TWEAK_CARD_WIDTH,
        UI_PADDING, UI_SPACING,
    },
    engine::{self, NextAction, OperationResult, TweakEngine, TweakState},
    tweaks::{
        catalog::{display_category, Catalog},
        Tweak,
    },
    utils::{windows::is_elevated, Platform},
    worker::{Operation, TweakExecutor, WorkerMessage, WorkerResult},
};

/// Which list the central panel shows.
#[derive(Clone, Debug, PartialEq, Eq)]
enum View {
    All,
    Category(String),
    Analyzer,
}

/// What the dialog currently on screen is asking.
#[derive(Clone, Debug)]
enum OpenDialog {
    /// Closing it closes the application.
    Fatal,
    Confirm { id: String, action: Operation },
    Result,
}

pub struct TweakApp {
    paths: AppPaths,
    window: WindowConfig,

    catalog: Catalog,
    states: IndexMap<String, TweakState>,
    states_loaded: bool,
    /// `None` when startup failed.
    executor: Option<TweakExecutor>,
    /// Tweaks with an operation queued on the worker.
    busy: HashSet<String>,
    view: View,

    dialogs: Dialogs<'static>,
    open_dialog: Option<OpenDialog>,
    pending_results: Vec<OperationResult>,
}

impl TweakApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, paths: AppPaths, window: WindowConfig) -> Self {
        let app_span = tracing::span!(Level::INFO, "App Initialization");
        let _app_guard = app_span.enter();

        let mut app = Self {
            paths,
            window,
            catalog: Catalog::default(),
            states: IndexMap::new(),
            states_loaded: false,
            executor: None,
            busy: HashSet::new(),
            view: View::All,
            dialogs: Dialogs::new(),
            open_dialog: None,
            pending_results: Vec::new(),
        };

        if !is_elevated() {
            app.show_fatal("Warning", "This program must be run in administrator mode.");
            return app;
        }

        match TweakEngine::load(&app.paths.tweaks, &app.paths.undo, Platform::system()) {
            Ok(engine) => {
                app.catalog = engine.catalog().clone();
                let executor = TweakExecutor::new(engine);
                executor.send(WorkerMessage::RefreshStates);
                app.executor = Some(executor);
            }
            Err(e) => {
                tracing::error!("Startup failed: {:#}", e);
                app.show_fatal("Configuration Error", &format!("{:#}", e));
            }
        }
        app
    }

    fn show_fatal(&mut self, title: &str, message: &str) {
        self.dialogs.add(DialogDetails::new(
            StandardDialog::error(title.to_string(), message.to_string())
                .buttons(vec![("OK".into(), StandardReply::Cancel)]),
        ));
        self.open_dialog = Some(OpenDialog::Fatal);
    }

    fn show_confirm(&mut self, tweak: &Tweak, warning: &str, action: Operation) {
        self.dialogs.add(DialogDetails::new(
            StandardDialog::confirm(tweak.title.clone(), warning.to_string()).buttons(vec![
                ("Continue".into(), StandardReply::Yes),
                ("Cancel".into(), StandardReply::Cancel),
            ]),
        ));
        self.open_dialog = Some(OpenDialog::Confirm {
            id: tweak.id.clone(),
            action,
        });
    }

    fn show_result(&mut self, result: OperationResult) {
        let dialog = if result.success {
            StandardDialog::info("Success", result.message)
        } else {
            StandardDialog::error("Error", result.message)
        };
        self.dialogs.add(DialogDetails::new(
            dialog.buttons(vec![("OK".into(), StandardReply::Ok)]),
        ));
        self.open_dialog = Some(OpenDialog::Result);
    }

    fn submit(&mut self, id: String, action: Operation) {
        let Some(executor) = &self.executor else {
            return;
        };
        let message = match action {
            Operation::Apply => WorkerMessage::Apply(id.clone()),
            Operation::Revert => WorkerMessage::Revert(id.clone()),
        };
        if executor.send(message) {
            self.busy.insert(id);
        }
    }

    /// Asks for confirmation first when applying a tweak that carries a
    /// warning.
    fn request(&mut self, id: &str, action: Operation) {
        let Some(tweak) = self.catalog.find(id).cloned() else {
            return;
        };
        match (&tweak.warning, action) {
            (Some(warning), Operation::Apply) => self.show_confirm(&tweak, warning, action),
            _ => self.submit(tweak.id, action),
        }
    }

    fn on_dialog_reply(&mut self, ctx: &egui::Context, reply: Option<StandardReply>) {
        match (self.open_dialog.take(), reply) {
            (Some(OpenDialog::Fatal), _) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            (Some(OpenDialog::Confirm { id, action }), Some(StandardReply::Yes)) => {
                self.submit(id, action);
            }
            _ => {}
        }
    }

    fn poll_worker(&mut self) {
        let Some(executor) = &self.executor else {
            return;
        };
        let mut refresh = false;
        while let Some(result) = executor.try_recv() {
            match result {
                WorkerResult::States(states) => {
                    tracing::debug!("Received states for {} tweaks.", states.len());
                    self.states = states;
                    self.states_loaded = true;
                }
                WorkerResult::Completed { id, action, result } => {
                    tracing::debug!("{} -> {:?} finished: {}", id, action, result.message);
                    self.busy.remove(&id);
                    refresh |= result.success;
                    self.pending_results.push(result);
                }
            }
        }
        if refresh {
            executor.send(WorkerMessage::RefreshStates);
        }
    }

    fn remember_geometry(&mut self, ctx: &egui::Context) {
        let (inner, outer) = ctx.input(|i| (i.viewport().inner_rect, i.viewport().outer_rect));
        if let Some(inner) = inner {
            self.window.size = [inner.width(), inner.height()];
        }
        if let Some(outer) = outer {
            self.window.position = [outer.min.x, outer.min.y];
        }
    }

    fn draw_side_panel(&mut self, ctx: &egui::Context) {
        let mut views = vec![(View::All, "All Tweaks".to_string())];
        views.extend(
            self.catalog
                .categories()
                .map(|(name, _)| (View::Category(name.to_string()), display_category(name))),
        );
        views.push((View::Analyzer, "System Analyzer".to_string()));

        egui::SidePanel::left("categories")
            .exact_width(SIDE_PANEL_WIDTH)
            .resizable(false)
            .show(ctx, |ui| {
                ui.add_space(UI_SPACING);
                ui.heading(APP_TITLE);
                ui.separator();
                for (view, label) in views {
                    let selected = self.view == view;
                    if ui.selectable_label(selected, label).clicked() {
                        self.view = view;
                    }
                }
            });
    }

    fn draw_central_panel(&mut self, ctx: &egui::Context) {
        let (heading, tweaks): (String, Vec<Tweak>) = match &self.view {
            View::All => (
                "All Tweaks".to_string(),
                self.catalog.tweaks().cloned().collect(),
            ),
            View::Category(name) => (
                display_category(name),
                self.catalog
                    .tweaks()
                    .filter(|tweak| &tweak.category == name)
                    .cloned()
                    .collect(),
            ),
            View::Analyzer => (
                "System Analyzer".to_string(),
                engine::recommendations(&self.catalog, &self.states)
                    .into_iter()
                    .cloned()
                    .collect(),
            ),
        };

        let mut requested = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(heading);
            ui.separator();

            if self.view == View::Analyzer {
                let text = if tweaks.is_empty() {
                    "All recommended tweaks are applied."
                } else {
                    "Recommended tweaks that are not applied yet:"
                };
                ui.label(RichText::new(text).font(FontId::proportional(LABEL_FONT_SIZE)));
                ui.add_space(UI_SPACING);
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing = egui::vec2(UI_SPACING, UI_SPACING);
                        for tweak in &tweaks {
                            if let Some(action) = self.draw_tweak_card(ui, tweak) {
                                requested = Some((tweak.id.clone(), action));
                            }
                        }
                    });
                });
        });

        if let Some((id, action)) = requested {
            self.request(&id, action);
        }
    }

    /// Draws one tweak and returns the operation its button asked for.
    fn draw_tweak_card(&self, ui: &mut egui::Ui, tweak: &Tweak) -> Option<Operation> {
        let state = self.states.get(&tweak.id).cloned().unwrap_or_default();
        let next = state.next_action(tweak);
        let button_state = if self.busy.contains(&tweak.id) {
            ButtonState::InProgress
        } else {
            ButtonState::Default
        };

        let mut clicked = false;
        egui::Frame::group(ui.style())
            .inner_margin(egui::Margin::same(UI_PADDING * 2.0))
            .show(ui, |ui| {
                ui.set_width(TWEAK_CARD_WIDTH);
                ui.set_height(TWEAK_CARD_HEIGHT);
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(&tweak.title)
                            .strong()
                            .font(FontId::proportional(LABEL_FONT_SIZE)),
                    );
                    if let Some(description) = &tweak.description {
                        ui.label(
                            RichText::new(description)
                                .font(FontId::new(12.0, FontFamily::Proportional)),
                        );
                    }
                    if let Some(error) = &state.error {
                        ui.colored_label(Color32::RED, format!("Error: {}", error));
                    }
                    ui.with_layout(egui::Layout::bottom_up(egui::Align::RIGHT), |ui| {
                        ui.set_min_height(BUTTON_DIMENSIONS[1]);
                        clicked = ui.add(ActionButton::new(next, button_state)).clicked();
                    });
                });
            });

        if !clicked {
            return None;
        }
        match next {
            NextAction::Run | NextAction::Apply => Some(Operation::Apply),
            NextAction::Revert { available: true } => Some(Operation::Revert),
            NextAction::Revert { available: false } => None,
        }
    }
}

impl App for TweakApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.remember_geometry(ctx);
        self.poll_worker();

        if !self.dialogs.dialogs().is_empty() {
            if let Some(res) = self.dialogs.show(ctx) {
                let reply = res.reply().ok();
                self.on_dialog_reply(ctx, reply);
            }
        } else if !self.pending_results.is_empty() {
            let result = self.pending_results.remove(0);
            self.show_result(result);
        }

        if self.executor.is_none() {
            return;
        }

        if !self.states_loaded {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.heading("Reading system state...");
                ui.add(egui::widgets::Spinner::new());
            });
        } else {
            self.draw_side_panel(ctx);
            self.draw_central_panel(ctx);
        }

        // Keep polling while the worker has something queued
        if !self.busy.is_empty() || !self.states_loaded {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.window.save(&self.paths.config) {
            tracing::error!("Failed to save window config: {:#}", e);
        }
        // Dropping the executor shuts the worker down
        self.executor = None;
    }
}
