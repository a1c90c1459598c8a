use eframe::egui::{self, Align, Color32, Layout, Ui};
use futures::FutureExt;

use crate::snapshot::SnapshotKey;

use super::{CHARGE_OPTIONS, ViewerApp};

const ERROR_COLOR: Color32 = Color32::from_rgb(0xe7, 0x4c, 0x3c);

impl ViewerApp {
    pub(in crate::app) fn draw_toolbar(&mut self, ui: &mut Ui) {
        let state = self.store.view_state();
        let mut step_previous = false;
        let mut step_next = false;
        let mut retry_next = false;
        let mut chosen_architecture = None;
        let mut chosen_charge = None;

        ui.horizontal(|ui| {
            ui.heading("simianviz");
            ui.separator();

            egui::ComboBox::from_id_salt("architecture")
                .selected_text(state.architecture.as_deref().unwrap_or("none"))
                .show_ui(ui, |ui| {
                    for name in &self.architectures {
                        let selected = state.architecture.as_deref() == Some(name.as_str());
                        if ui.selectable_label(selected, name).clicked() && !selected {
                            chosen_architecture = Some(name.clone());
                        }
                    }
                });

            if state.has_previous_step && ui.button("Previous").clicked() {
                step_previous = true;
            }
            ui.label(format!("step {}", state.step));
            if state.has_next_step {
                step_next = ui.button("Next").clicked();
            } else if state.architecture.is_some() && self.store.pending_fetches() == 0 {
                retry_next = ui
                    .small_button("Retry next")
                    .on_hover_text("Fetch the next step again")
                    .clicked();
            }
            ui.separator();

            egui::ComboBox::from_label("charge")
                .selected_text(format!("{}", -state.charge))
                .show_ui(ui, |ui| {
                    for magnitude in CHARGE_OPTIONS {
                        let charge = -f32::from(magnitude);
                        let selected = state.charge == charge;
                        let option = ui.selectable_label(selected, magnitude.to_string());
                        if option.clicked() && !selected {
                            chosen_charge = Some(charge);
                        }
                    }
                });

            if self.store.pending_fetches() > 0 {
                ui.spinner();
            }
            if let Some(message) = self.last_error.borrow().as_deref() {
                ui.colored_label(ERROR_COLOR, message);
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                if let Some(view) = &self.view {
                    ui.label(format!(
                        "nodes: {}  edges: {}",
                        view.visible_node_count(),
                        view.visible_edge_count()
                    ));
                }
            });
        });

        if let Some(architecture) = chosen_architecture {
            self.spawn_action(self.store.select(&architecture, 0));
        }
        if step_previous {
            self.spawn_action(self.store.step_previous());
        }
        if step_next {
            self.spawn_action(self.store.step_next());
        }
        if retry_next && let Some(architecture) = state.architecture {
            let fetch = self.store.ensure(SnapshotKey::new(architecture, state.step + 1));
            self.spawn_action(fetch.map(|loaded| loaded.map(drop)).boxed_local());
        }
        if let Some(charge) = chosen_charge {
            self.store.set_charge(charge);
        }
    }
}
