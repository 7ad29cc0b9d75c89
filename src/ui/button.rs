// src/ui/button.rs

use egui::{self, Color32, Response, Rounding, Sense, Stroke, Ui, Vec2, Widget};

use crate::engine::NextAction;

pub const BUTTON_DIMENSIONS: [f32; 2] = [100.0, 30.0];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonState {
    Default,
    InProgress,
}

/// The button on a tweak card. Its label follows the tweak's next action.
#[derive(Clone, Debug)]
pub struct ActionButton {
    action: NextAction,
    state: ButtonState,
    fill: Color32,
    stroke: Stroke,
    rounding: Rounding,
    min_size: Vec2,
}

impl ActionButton {
    pub fn new(action: NextAction, state: ButtonState) -> Self {
        let fill = match action {
            NextAction::Revert { .. } => Color32::from_rgb(90, 180, 110),
            NextAction::Run | NextAction::Apply => Color32::from_rgb(100, 150, 250),
        };
        Self {
            action,
            state,
            fill,
            stroke: Stroke::new(1.0, Color32::BLACK),
            rounding: Rounding::same(5.0),
            min_size: Vec2::from(BUTTON_DIMENSIONS),
        }
    }

    fn label(&self) -> &'static str {
        match (self.state, self.action) {
            (ButtonState::InProgress, NextAction::Revert { .. }) => "Reverting...",
            (ButtonState::InProgress, _) => "Applying...",
            (ButtonState::Default, NextAction::Run) => "Run",
            (ButtonState::Default, NextAction::Apply) => "Apply",
            (ButtonState::Default, NextAction::Revert { .. }) => "Revert",
        }
    }

    fn is_clickable(&self) -> bool {
        self.state == ButtonState::Default
            && !matches!(self.action, NextAction::Revert { available: false })
    }
}

impl Widget for ActionButton {
    fn ui(self, ui: &mut Ui) -> Response {
        let label = self.label();
        let is_clickable = self.is_clickable();

        let sense = if is_clickable {
            Sense::click()
        } else {
            Sense::hover()
        };

        let (rect, mut response) = ui.allocate_exact_size(self.min_size, sense);

        if is_clickable && response.clicked() {
            response.mark_changed();
        }

        response.widget_info(|| {
            egui::WidgetInfo::selected(egui::WidgetType::Button, is_clickable, false, label)
        });

        if ui.is_rect_visible(rect) {
            let visuals = ui.style().interact(&response);
            let fill = if is_clickable {
                self.fill
            } else {
                self.fill.gamma_multiply(0.4)
            };

            ui.painter().rect_filled(rect, self.rounding, fill);
            ui.painter().rect_stroke(rect, self.rounding, self.stroke);

            let galley = ui.fonts(|f| {
                f.layout_no_wrap(
                    label.to_string(),
                    egui::FontId::default(),
                    visuals.text_color(),
                )
            });

            let text_pos = rect.center() - galley.size() / 2.0;
            ui.painter().galley(text_pos, galley, visuals.text_color());
        }

        response
    }
}
