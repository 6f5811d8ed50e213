use std::collections::BTreeMap;
use std::f32::consts::{PI, TAU};

use clap::ValueEnum;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::node::RepositoryNode;

const GOLDEN_ANGLE: f32 = PI * 0.763_932; // π·(3 − √5)
const SPIRAL_SPREAD: f32 = 2.6;
const SPIRAL_RISE: f32 = 18.0;
const CLUSTER_RING_BASE: f32 = 10.0;
const CLUSTER_RING_PER_GROUP: f32 = 2.2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    #[default]
    Force,
    Spiral,
    Clusters,
}

impl LayoutMode {
    pub const ALL: [Self; 3] = [Self::Force, Self::Spiral, Self::Clusters];

    pub fn label(self) -> &'static str {
        match self {
            Self::Force => "Force",
            Self::Spiral => "Spiral",
            Self::Clusters => "Clusters",
        }
    }
}

/// Target position for every node. Force mode targets its spiral seed.
pub fn place(nodes: &[RepositoryNode], mode: LayoutMode) -> Vec<Vec3> {
    match mode {
        LayoutMode::Force | LayoutMode::Spiral => spiral_positions(nodes.len()),
        LayoutMode::Clusters => cluster_positions(nodes),
    }
}

/// Golden-angle spiral rising along Y.
pub fn spiral_positions(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|index| {
            let t = (index as f32 + 0.5) / count as f32;
            let radius = SPIRAL_SPREAD * ((index + 1) as f32).sqrt();
            let angle = index as f32 * GOLDEN_ANGLE;
            Vec3::new(
                radius * angle.cos(),
                (t - 0.5) * SPIRAL_RISE,
                radius * angle.sin(),
            )
        })
        .collect()
}

/// Language groups on an outer ring, members on an inner ring by star rank.
pub fn cluster_positions(nodes: &[RepositoryNode]) -> Vec<Vec3> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
        groups.entry(node.language_key()).or_default().push(index);
    }

    let mut groups = groups.into_iter().collect::<Vec<_>>();
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    let group_count = groups.len();
    let outer_radius = if group_count > 1 {
        CLUSTER_RING_BASE + CLUSTER_RING_PER_GROUP * group_count as f32
    } else {
        0.0
    };

    let mut positions = vec![Vec3::ZERO; nodes.len()];
    for (group_index, (_language, mut members)) in groups.into_iter().enumerate() {
        let outer_angle = group_index as f32 / group_count as f32 * TAU;
        let center = Vec3::new(
            outer_radius * outer_angle.cos(),
            0.0,
            outer_radius * outer_angle.sin(),
        );

        members.sort_by(|&a, &b| {
            nodes[b]
                .stars
                .cmp(&nodes[a].stars)
                .then_with(|| nodes[a].full_name.cmp(&nodes[b].full_name))
        });

        let member_count = members.len();
        let inner_radius = if member_count > 1 {
            1.6 + 0.9 * (member_count as f32).sqrt()
        } else {
            0.0
        };
        for (rank, &index) in members.iter().enumerate() {
            let inner_angle = rank as f32 / member_count as f32 * TAU + group_index as f32 * 0.37;
            let lift = ((rank % 3) as f32 - 1.0) * 0.8;
            positions[index] = center
                + Vec3::new(
                    inner_radius * inner_angle.cos(),
                    lift,
                    inner_radius * inner_angle.sin(),
                );
        }
    }

    positions
}

/// Moves each position a frame-rate independent fraction of the way to its target.
pub fn ease_toward(positions: &[Vec3], targets: &[Vec3], rate: f32, dt: f32) -> Vec<Vec3> {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let blend = 1.0 - (-rate.max(0.0) * dt).exp();

    positions
        .iter()
        .zip(targets)
        .map(|(&position, &target)| {
            let next = position.lerp(target, blend);
            if next.is_finite() { next } else { target }
        })
        .collect()
}
