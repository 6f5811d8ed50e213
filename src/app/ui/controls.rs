use std::collections::BTreeMap;

use eframe::egui::{self, RichText, Ui, vec2};

use crate::config::ForceSettings;
use crate::network::{LayoutMode, UNKNOWN_LANGUAGE};

use super::super::ViewModel;
use super::super::render_utils::rgb_color;

const MAX_NODE_LIMIT: usize = 120;

fn force_slider(
    ui: &mut Ui,
    value: &mut f32,
    range: std::ops::RangeInclusive<f32>,
    label: &str,
    hint: &str,
) -> bool {
    ui.add(
        egui::Slider::new(value, range)
            .text(label)
            .clamping(egui::SliderClamping::Always),
    )
    .on_hover_text(hint)
    .changed()
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Network Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search (name, language or topic)");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Highlight matching repositories without changing the network.");

        ui.separator();

        ui.label("Layout");
        let mut requested_mode = self.mode;
        ui.horizontal(|ui| {
            for mode in LayoutMode::ALL {
                ui.selectable_value(&mut requested_mode, mode, mode.label());
            }
        });
        if requested_mode != self.mode {
            self.set_layout_mode(requested_mode);
        }

        let node_limit = self.portfolio.repositories.len().clamp(1, MAX_NODE_LIMIT);
        let max_nodes_slider = ui
            .add(
                egui::Slider::new(&mut self.settings.network.max_nodes, 1..=node_limit.max(2))
                    .text("Max repositories"),
            )
            .on_hover_text("Keep the most-starred repositories up to this count.");
        if max_nodes_slider.drag_stopped() || (max_nodes_slider.changed() && !max_nodes_slider.dragged()) {
            self.network_dirty = true;
        }

        ui.separator();

        ui.checkbox(&mut self.live_layout, "Animate layout")
            .on_hover_text("Keep stepping the force simulation or easing toward layout targets.");
        ui.checkbox(&mut self.auto_rotate, "Auto-rotate")
            .on_hover_text("Slowly orbit the camera when not dragging.");
        ui.checkbox(&mut self.show_labels, "Show labels")
            .on_hover_text("Label large nodes and search matches.");
        if ui.button("Reset camera").clicked() {
            let extent = self.network_extent();
            self.camera = Default::default();
            self.camera.frame(extent);
        }

        ui.collapsing("Force tuning", |ui| {
            let force = &mut self.settings.force;
            let mut changed = false;
            changed |= force_slider(ui, &mut force.repulsion, 1.0..=120.0, "Repulsion", "Inverse-square push between every pair.");
            changed |= force_slider(ui, &mut force.attraction, 0.0..=0.3, "Attraction", "Spring stiffness along connections.");
            changed |= force_slider(ui, &mut force.link_distance, 2.0..=30.0, "Link distance", "Rest length for a connection of strength zero.");
            changed |= force_slider(ui, &mut force.center_gravity, 0.0..=0.2, "Center gravity", "Pull toward the origin.");
            changed |= force_slider(ui, &mut force.damping, 0.0..=0.5, "Damping", "Velocity lost every step.");
            changed |= force_slider(ui, &mut force.max_speed, 1.0..=60.0, "Max speed", "Upper bound on node speed.");
            if changed {
                ui.ctx().request_repaint();
            }

            if ui.button("Reset forces").clicked() {
                *force = ForceSettings::default();
            }
        });

        ui.separator();
        self.draw_language_legend(ui);
    }

    fn draw_language_legend(&self, ui: &mut Ui) {
        let mut languages = BTreeMap::<&str, (usize, egui::Color32)>::new();
        for node in self.network.nodes() {
            let entry = languages
                .entry(node.language_key())
                .or_insert((0, rgb_color(node.color)));
            entry.0 += 1;
        }

        ui.label(RichText::new("Languages").strong());
        if languages.is_empty() {
            ui.label("No repositories loaded.");
            return;
        }

        let mut rows = languages.into_iter().collect::<Vec<_>>();
        rows.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.0.cmp(b.0)));

        egui::ScrollArea::vertical()
            .id_salt("language_legend_scroll")
            .max_height(240.0)
            .show(ui, |ui| {
                for (language, (count, color)) in rows {
                    ui.horizontal(|ui| {
                        let (rect, _) = ui.allocate_exact_size(vec2(10.0, 10.0), egui::Sense::hover());
                        ui.painter().circle_filled(rect.center(), 5.0, color);
                        let name = if language == UNKNOWN_LANGUAGE {
                            "(no language)"
                        } else {
                            language
                        };
                        ui.label(format!("{name}  {count}"));
                    });
                }
            });
    }
}
