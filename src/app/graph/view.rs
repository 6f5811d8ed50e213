use eframe::egui::{self, Align2, Color32, FontId, Sense, Stroke, Ui, vec2};

use crate::util::{format_count, short_name};

use super::super::highlight::{build_highlight_state, search_matches};
use super::super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, rgb_color, with_opacity,
};
use super::super::{ViewModel, ViewScratch};
use super::interaction::screen_radius;

const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);

impl ViewScratch {
    pub(in crate::app) fn clear(&mut self) {
        self.projected.clear();
        self.draw_order.clear();
    }
}

impl ViewModel {
    fn project_nodes(&mut self, rect: egui::Rect) {
        let camera = self.camera;
        let scratch = &mut self.view_scratch;

        scratch.projected.clear();
        scratch.projected.extend(
            self.network
                .nodes()
                .iter()
                .map(|node| camera.project(rect, node.position)),
        );

        scratch.draw_order.clear();
        scratch
            .draw_order
            .extend((0..scratch.projected.len()).filter(|&index| scratch.projected[index].is_some()));
        // Far to near, so closer nodes paint over distant ones.
        scratch.draw_order.sort_by(|&a, &b| {
            let depth = |index: usize| scratch.projected[index].map_or(0.0, |projected| projected.depth);
            depth(b).total_cmp(&depth(a))
        });
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        if self.network_dirty {
            self.rebuild_network();
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let dt = ui.ctx().input(|input| input.stable_dt).clamp(1.0 / 240.0, 1.0 / 20.0);

        self.handle_camera_input(ui, &response, dt);
        draw_background(&painter, rect, self.camera.yaw);

        if self.network.nodes().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No repositories to show for this account.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
            return;
        }

        let moving = self.advance_layout(dt);
        if moving || self.auto_rotate || response.dragged() {
            ui.ctx().request_repaint();
        }

        self.project_nodes(rect);

        let hovered = if response.hovered() {
            self.hovered_index(ui)
        } else {
            None
        };
        if hovered.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let selected_index = self
            .selected
            .as_deref()
            .and_then(|full_name| self.network.index_of(full_name));
        let highlight = hovered
            .or(selected_index)
            .and_then(|focus| build_highlight_state(&self.network, focus));
        let matches = search_matches(&self.network, &self.search);
        let search_active = !self.search.trim().is_empty();

        let nodes = self.network.nodes();
        let projected = &self.view_scratch.projected;

        for connection in self.network.connections() {
            let (Some(Some(start)), Some(Some(end))) = (
                projected.get(connection.source),
                projected.get(connection.target),
            ) else {
                continue;
            };

            let base = blend_color(
                rgb_color(nodes[connection.source].color),
                rgb_color(nodes[connection.target].color),
                0.5,
            );
            let depth_scale = ((start.scale + end.scale) * 0.5).sqrt().clamp(0.4, 2.2);
            let (width, color) = match &highlight {
                Some(state) if state.related_edges.contains(&(connection.source, connection.target)) => (
                    (1.6 + connection.strength * 1.8) * depth_scale,
                    with_opacity(blend_color(base, Color32::WHITE, 0.35), 0.95),
                ),
                Some(_) => (
                    0.6 * depth_scale,
                    with_opacity(base, connection.opacity() * 0.25),
                ),
                None => (
                    (0.6 + connection.strength) * depth_scale,
                    with_opacity(base, connection.opacity()),
                ),
            };

            painter.line_segment([start.screen, end.screen], Stroke::new(width, color));
        }

        let mut selection_animating = false;
        for &index in &self.view_scratch.draw_order {
            let Some(projection) = projected[index] else {
                continue;
            };
            let node = &nodes[index];
            let radius = screen_radius(node.radius, &projection);
            if !circle_visible(rect, projection.screen, radius) {
                continue;
            }

            let is_selected = selected_index == Some(index);
            let is_hovered = hovered == Some(index);
            let is_related = highlight
                .as_ref()
                .is_some_and(|state| state.related_nodes.contains(&index));
            let is_match = matches.contains(&index);

            let base_color = rgb_color(node.color);
            let unselected_color = if is_hovered {
                blend_color(base_color, Color32::WHITE, 0.35)
            } else if is_match {
                blend_color(base_color, MATCH_COLOR, 0.55)
            } else if highlight.is_some() && !is_related {
                dim_color(base_color, 0.35)
            } else if search_active && !is_match {
                dim_color(base_color, 0.45)
            } else {
                base_color
            };

            let selection_mix = ui.ctx().animate_bool(
                ui.make_persistent_id(("repo-selection", node.full_name.as_str())),
                is_selected,
            );
            if selection_mix > 0.0 && selection_mix < 1.0 {
                selection_animating = true;
            }

            let color = blend_color(unselected_color, SELECTED_COLOR, selection_mix * 0.5);
            painter.circle_filled(projection.screen, radius, color);
            painter.circle_stroke(
                projection.screen,
                radius,
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(10, 10, 16, 200)),
            );
            if selection_mix > 0.0 {
                painter.circle_stroke(
                    projection.screen,
                    radius + 3.0 + ((1.0 - selection_mix) * 6.0),
                    Stroke::new(1.5, with_opacity(SELECTED_COLOR, selection_mix)),
                );
            }

            let should_draw_label = is_selected
                || is_hovered
                || (is_related && highlight.as_ref().is_some_and(|state| state.focus != index))
                || (self.show_labels && (radius > 12.0 || is_match));
            if should_draw_label {
                painter.text(
                    projection.screen + vec2(radius + 5.0, 0.0),
                    Align2::LEFT_CENTER,
                    short_name(&node.full_name),
                    FontId::proportional(12.0),
                    Color32::from_gray(236),
                );
            }
        }

        if selection_animating {
            ui.ctx().request_repaint();
        }

        if let Some(node) = hovered.and_then(|index| nodes.get(index)) {
            let panel_text = format!(
                "{}  |  {} stars  |  {}  |  {} connections",
                short_name(&node.full_name),
                format_count(node.stars),
                node.language.as_deref().unwrap_or("no language"),
                node.adjacent.len()
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                panel_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            self.apply_graph_selection(hovered);
        }
    }
}
