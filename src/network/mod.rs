//! Repository network: nodes, inferred connections and their 3D layout.

mod connections;
mod layout;
mod node;
mod palette;
mod physics;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::Serialize;
use tracing::debug;

use crate::config::{ForceSettings, NetworkSettings};
use crate::github::RepositoryRecord;

use connections::{Connection, ConnectionKind, infer_connections};
use layout::{ease_toward, place, spiral_positions};
use node::{RepositoryNode, select_top_by_stars};
use physics::{Body, Link, step};

pub use layout::LayoutMode;
pub use node::UNKNOWN_LANGUAGE;
pub use palette::{LanguagePalette, Rgb};

/// Rate used to ease nodes toward spiral / cluster targets.
const EASE_RATE: f32 = 4.5;

pub struct RepoNetwork {
    nodes: Vec<RepositoryNode>,
    connections: Vec<Connection>,
    mode: LayoutMode,
    degree_cap: usize,
    index_by_name: HashMap<String, usize>,
}

impl RepoNetwork {
    /// Builds the network from scratch: top-N selection, node attributes,
    /// connection inference and initial placement.
    pub fn build(
        records: Vec<RepositoryRecord>,
        palette: &LanguagePalette,
        settings: &NetworkSettings,
        mode: LayoutMode,
        reference: DateTime<Utc>,
    ) -> Self {
        let records = select_top_by_stars(records, settings.max_nodes);
        let mut nodes = records
            .into_iter()
            .map(|record| RepositoryNode::from_record(record, palette, reference))
            .collect::<Vec<_>>();

        let set = infer_connections(&nodes, settings.degree_cap_for(nodes.len()));
        let degree_cap = set.cap();
        let isolated = (0..nodes.len()).filter(|&index| set.degree(index) == 0).count();
        for (node, neighbours) in nodes.iter_mut().zip(set.adjacency()) {
            node.adjacent = neighbours;
        }

        seed_layout(&mut nodes, mode);

        let index_by_name = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.full_name.clone(), index))
            .collect();

        debug!(
            nodes = nodes.len(),
            connections = set.len(),
            degree_cap,
            isolated,
            mode = mode.label(),
            "built repository network"
        );

        Self {
            nodes,
            connections: set.into_vec(),
            mode,
            degree_cap,
            index_by_name,
        }
    }

    pub fn nodes(&self) -> &[RepositoryNode] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn degree_cap(&self) -> usize {
        self.degree_cap
    }

    pub fn index_of(&self, full_name: &str) -> Option<usize> {
        self.index_by_name.get(full_name).copied()
    }

    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.nodes
            .get(index)
            .map(|node| node.adjacent.as_slice())
            .unwrap_or(&[])
    }

    pub fn connections_of(&self, index: usize) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |connection| connection.touches(index))
    }

    /// Switches layout mode. Layout state is regenerated exactly as `build`
    /// would produce it for `mode`; nothing carries over from the old mode.
    /// Connections do not depend on the mode and are kept.
    pub fn relayout(&mut self, mode: LayoutMode) {
        seed_layout(&mut self.nodes, mode);
        self.mode = mode;
    }

    /// Advances the layout by one frame.
    pub fn advance(&mut self, force: &ForceSettings, dt: f32) {
        match self.mode {
            LayoutMode::Force => {
                let next = step(&self.bodies(), &self.links(), force, dt);
                for (node, body) in self.nodes.iter_mut().zip(next) {
                    node.position = body.position;
                    node.velocity = body.velocity;
                    node.force = body.force;
                }
            }
            LayoutMode::Spiral | LayoutMode::Clusters => {
                let positions = self.nodes.iter().map(|node| node.position).collect::<Vec<_>>();
                let targets = self.nodes.iter().map(|node| node.target).collect::<Vec<_>>();
                let dt = if dt.is_finite() { dt.min(force.max_dt) } else { 0.0 };
                for (node, position) in self
                    .nodes
                    .iter_mut()
                    .zip(ease_toward(&positions, &targets, EASE_RATE, dt))
                {
                    node.position = position;
                }
            }
        }
    }

    pub fn bodies(&self) -> Vec<Body> {
        self.nodes
            .iter()
            .map(|node| Body {
                position: node.position,
                velocity: node.velocity,
                force: node.force,
                mass: node.mass,
            })
            .collect()
    }

    pub fn links(&self) -> Vec<Link> {
        self.connections
            .iter()
            .map(|connection| Link {
                source: connection.source,
                target: connection.target,
                strength: connection.strength,
            })
            .collect()
    }

    pub fn snapshot(&self) -> NetworkSnapshot {
        NetworkSnapshot {
            mode: self.mode,
            degree_cap: self.degree_cap,
            nodes: self
                .nodes
                .iter()
                .map(|node| NodeSnapshot {
                    full_name: node.full_name.clone(),
                    language: node.language.clone(),
                    stars: node.stars,
                    radius: node.radius,
                    color: node.color,
                    position: node.position,
                    degree: node.adjacent.len(),
                })
                .collect(),
            connections: self
                .connections
                .iter()
                .map(|connection| ConnectionSnapshot {
                    source: self.nodes[connection.source].full_name.clone(),
                    target: self.nodes[connection.target].full_name.clone(),
                    kind: connection.kind,
                    strength: connection.strength,
                    opacity: connection.opacity(),
                })
                .collect(),
        }
    }
}

/// Every mode starts from the spiral. Force mode simulates from there; spiral
/// and cluster modes ease toward their closed-form targets.
fn seed_layout(nodes: &mut [RepositoryNode], mode: LayoutMode) {
    let seeds = spiral_positions(nodes.len());
    let targets = place(nodes, mode);
    for ((node, seed), target) in nodes.iter_mut().zip(seeds).zip(targets) {
        node.position = seed;
        node.target = target;
        node.velocity = Vec3::ZERO;
        node.force = Vec3::ZERO;
    }
}

#[derive(Debug, Serialize)]
pub struct NetworkSnapshot {
    pub mode: LayoutMode,
    pub degree_cap: usize,
    pub nodes: Vec<NodeSnapshot>,
    pub connections: Vec<ConnectionSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct NodeSnapshot {
    pub full_name: String,
    pub language: Option<String>,
    pub stars: u32,
    pub radius: f32,
    pub color: Rgb,
    pub position: Vec3,
    pub degree: usize,
}

#[derive(Debug, Serialize)]
pub struct ConnectionSnapshot {
    pub source: String,
    pub target: String,
    pub kind: ConnectionKind,
    pub strength: f32,
    pub opacity: f32,
}
