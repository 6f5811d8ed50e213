use eframe::egui::{self, Ui};

use super::super::ViewModel;
use super::super::render_utils::Projected;

const AUTO_ROTATE_SPEED: f32 = 0.12;

/// On-screen radius of a node with world radius `radius` at projection `projected`.
pub(super) fn screen_radius(radius: f32, projected: &Projected) -> f32 {
    (radius * projected.scale * 0.55).clamp(2.0, 64.0)
}

impl ViewModel {
    /// Scroll zooms, primary drag orbits, secondary or middle drag pans.
    pub(in crate::app) fn handle_camera_input(&mut self, ui: &Ui, response: &egui::Response, dt: f32) {
        if response.hovered() {
            let scroll = ui.input(|input| input.raw_scroll_delta.y);
            if scroll.abs() > f32::EPSILON {
                self.camera.zoom(scroll);
            }
        }

        if response.dragged_by(egui::PointerButton::Primary) {
            self.camera.orbit(response.drag_delta());
        } else if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.camera.pan += response.drag_delta();
        } else if self.auto_rotate {
            self.camera.spin(dt * AUTO_ROTATE_SPEED);
        }
    }

    /// Front-most node under the pointer.
    pub(in crate::app) fn hovered_index(&self, ui: &Ui) -> Option<usize> {
        let pointer = ui.input(|input| input.pointer.hover_pos())?;
        let nodes = self.network.nodes();

        self.view_scratch
            .projected
            .iter()
            .enumerate()
            .filter_map(|(index, projected)| {
                let projected = projected.as_ref()?;
                let radius = screen_radius(nodes.get(index)?.radius, projected);
                (projected.screen.distance(pointer) <= radius).then_some((index, projected.depth))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(in crate::app) fn apply_graph_selection(&mut self, clicked: Option<usize>) {
        let selected = clicked
            .and_then(|index| self.network.nodes().get(index))
            .map(|node| node.full_name.clone());
        self.set_selected(selected);
    }
}
