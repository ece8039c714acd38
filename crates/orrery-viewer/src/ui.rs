//! UI overlay using bevy_egui

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use orrery_core::precision::{MAX_DIGITS, MIN_DIGITS};
use orrery_core::{BodyId, Command, PrecisionMode, PrecisionSettings};
use orrery_scene::{Tracker, TrackingCommand, TrackingStatus};

use crate::bodies::{SimSpeed, PLANETS};

/// Selections shown in the panel
#[derive(Resource, Debug, Clone)]
pub struct PanelState {
    pub anchor: Option<BodyId>,
    pub precision: PrecisionSettings,
}

/// Grouped system parameters for the panel
#[derive(SystemParam)]
pub struct UiParams<'w, 's> {
    pub contexts: EguiContexts<'w, 's>,
    pub speed: ResMut<'w, SimSpeed>,
    pub panel: ResMut<'w, PanelState>,
    pub tracker: Res<'w, Tracker>,
    pub status: Res<'w, TrackingStatus>,
    pub commands: MessageWriter<'w, TrackingCommand>,
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_panel_state)
            .add_systems(EguiPrimaryContextPass, ui_system);
    }
}

fn init_panel_state(mut commands: Commands, tracker: Res<Tracker>) {
    commands.insert_resource(PanelState {
        anchor: None,
        precision: *tracker.precision(),
    });
}

fn ui_system(mut params: UiParams) {
    let Ok(ctx) = params.contexts.ctx_mut() else { return };

    let mut anchor = params.panel.anchor.clone();
    let mut precision = params.panel.precision;

    egui::Window::new("Orrery")
        .default_width(220.0)
        .resizable(false)
        .show(ctx, |ui| {
            ui.add(
                egui::Slider::new(&mut params.speed.days_per_second, 0.0..=SimSpeed::MAX)
                    .text("Speed (days/s)"),
            );

            let anchor_label = anchor
                .as_ref()
                .and_then(|id| PLANETS.iter().find(|p| p.id == id.as_str()))
                .map_or("None", |p| p.label);
            egui::ComboBox::from_label("Anchor")
                .selected_text(anchor_label)
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut anchor, None, "None");
                    for planet in PLANETS {
                        ui.selectable_value(&mut anchor, Some(BodyId::from(planet.id)), planet.label);
                    }
                });

            egui::ComboBox::from_label("Precision")
                .selected_text(precision.mode.to_string())
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut precision.mode, PrecisionMode::Standard, "standard");
                    ui.selectable_value(
                        &mut precision.mode,
                        PrecisionMode::HighPrecision,
                        "high_precision",
                    );
                });
            if precision.mode == PrecisionMode::HighPrecision {
                ui.add(
                    egui::DragValue::new(&mut precision.digits)
                        .range(MIN_DIGITS..=MAX_DIGITS)
                        .suffix(" digits"),
                );
            }

            ui.separator();
            match params.tracker.tracking().session() {
                Some(session) => {
                    ui.label(format!(
                        "Tracking {} ({}), tick {}",
                        session.target(),
                        session.precision(),
                        session.ticks()
                    ));
                }
                None => {
                    ui.label("Not tracking");
                }
            }
            if let Some(err) = &params.status.last_error {
                ui.colored_label(egui::Color32::LIGHT_RED, err.as_str());
            }
        });

    if precision != params.panel.precision {
        params.panel.precision = precision;
        params.commands.write(TrackingCommand(Command::SetPrecision(precision)));
        // Re-arm so the new precision takes effect right away
        if let Some(id) = &anchor {
            params.commands.write(TrackingCommand(Command::SelectTarget(Some(id.clone()))));
        }
    }

    if anchor != params.panel.anchor {
        params.panel.anchor = anchor.clone();
        params.commands.write(TrackingCommand(Command::SelectTarget(anchor.clone())));
        if anchor.is_none() {
            params.commands.write(TrackingCommand(Command::Reset));
        }
    }
}
