use tracing::debug;

use crate::network::{LayoutMode, RepoNetwork};

use super::super::ViewModel;

impl ViewModel {
    /// Rebuilds the network from the loaded portfolio with the current
    /// node limit and layout mode.
    pub(in crate::app) fn rebuild_network(&mut self) {
        self.network = RepoNetwork::build(
            self.portfolio.repositories.clone(),
            &self.palette,
            &self.settings.network,
            self.mode,
            self.portfolio.fetched_at,
        );
        self.network_dirty = false;
        self.view_scratch.clear();

        if let Some(selected) = &self.selected
            && self.network.index_of(selected).is_none()
        {
            debug!(selected = selected.as_str(), "selection dropped by rebuild");
            self.selected = None;
        }

        self.camera.frame(self.network_extent());
    }

    pub(in crate::app) fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.mode == mode {
            return;
        }

        debug!(from = self.mode.label(), to = mode.label(), "switching layout");
        self.mode = mode;
        self.network.relayout(mode);
        self.camera.frame(self.network_extent());
    }

    /// Largest distance of any node or layout target from the origin.
    pub(in crate::app) fn network_extent(&self) -> f32 {
        self.network
            .nodes()
            .iter()
            .map(|node| node.position.length().max(node.target.length()))
            .filter(|extent| extent.is_finite())
            .fold(0.0, f32::max)
    }

    /// Steps the layout for one frame. Returns whether anything is still moving.
    pub(in crate::app) fn advance_layout(&mut self, dt: f32) -> bool {
        if !self.live_layout || self.network.nodes().is_empty() {
            return false;
        }

        self.network.advance(&self.settings.force, dt);
        self.network.nodes().iter().any(|node| {
            node.velocity.length_squared() > 1.0e-4
                || (self.mode != LayoutMode::Force && node.position.distance_squared(node.target) > 1.0e-4)
        })
    }
}
