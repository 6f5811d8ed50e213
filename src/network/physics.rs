use std::f32::consts::TAU;

use glam::Vec3;

use crate::config::ForceSettings;

const MIN_DIRECTION_LENGTH_SQ: f32 = 1.0e-8;
const MIN_SPRING_LENGTH: f32 = 1.0e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Net force accumulated during the step that produced this body.
    pub force: Vec3,
    pub mass: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Link {
    pub source: usize,
    pub target: usize,
    pub strength: f32,
}

/// One explicit-Euler step of the force simulation.
///
/// All forces are accumulated before any body moves. `dt` is clamped to
/// `[0, settings.max_dt]`; the returned speeds never exceed
/// `settings.max_speed` and every coordinate stays finite.
pub fn step(bodies: &[Body], links: &[Link], settings: &ForceSettings, dt: f32) -> Vec<Body> {
    let dt = if dt.is_finite() {
        dt.clamp(0.0, settings.max_dt.max(0.0))
    } else {
        0.0
    };
    let count = bodies.len();
    let masses = bodies.iter().map(|body| sanitize_mass(body.mass)).collect::<Vec<_>>();
    let positions = bodies
        .iter()
        .map(|body| finite_or_zero(body.position))
        .collect::<Vec<_>>();
    let mut forces = vec![Vec3::ZERO; count];

    let min_distance_sq = settings.min_distance_sq.max(f32::MIN_POSITIVE);
    for a in 0..count {
        for b in (a + 1)..count {
            let delta = positions[a] - positions[b];
            let distance_sq = delta.length_squared();
            let direction = if distance_sq > MIN_DIRECTION_LENGTH_SQ && distance_sq.is_finite() {
                delta / distance_sq.sqrt()
            } else {
                fallback_direction(a, b)
            };

            let magnitude = settings.repulsion * masses[a] * masses[b] / distance_sq.max(min_distance_sq);
            let push = direction * magnitude;
            forces[a] += push;
            forces[b] -= push;
        }
    }

    for link in links {
        let (source, target) = (link.source, link.target);
        if source >= count || target >= count || source == target || !link.strength.is_finite() {
            continue;
        }

        let delta = positions[target] - positions[source];
        let distance = delta.length();
        if distance <= MIN_SPRING_LENGTH || !distance.is_finite() {
            continue;
        }

        let direction = delta / distance;
        let rest = settings.link_distance * (1.1 - 0.35 * link.strength);
        let magnitude = (distance - rest) * settings.attraction * (0.6 + link.strength);
        let pull = direction * magnitude;
        forces[source] += pull;
        forces[target] -= pull;
    }

    for (index, force) in forces.iter_mut().enumerate() {
        let weight = (masses[index] * 0.35).max(0.6);
        *force -= positions[index] * settings.center_gravity * weight;
    }

    let damping = 1.0 - settings.damping.clamp(0.0, 1.0);
    let max_speed = settings.max_speed.max(0.0);

    bodies
        .iter()
        .enumerate()
        .map(|(index, body)| {
            let force = finite_or_zero(forces[index]);
            let acceleration = force / masses[index];

            let mut velocity = finite_or_zero(finite_or_zero(body.velocity) + acceleration * dt) * damping;
            let speed = velocity.length();
            if speed > max_speed {
                velocity *= max_speed / speed;
            }
            let velocity = finite_or_zero(velocity);

            let moved = positions[index] + velocity * dt;
            let position = if moved.is_finite() {
                moved
            } else {
                positions[index]
            };

            Body {
                position,
                velocity,
                force,
                mass: body.mass,
            }
        })
        .collect()
}

fn sanitize_mass(mass: f32) -> f32 {
    if mass.is_finite() && mass > 0.0 {
        mass
    } else {
        1.0
    }
}

fn finite_or_zero(vector: Vec3) -> Vec3 {
    if vector.is_finite() { vector } else { Vec3::ZERO }
}

/// Deterministic unit vector used to separate coincident bodies.
fn fallback_direction(a: usize, b: usize) -> Vec3 {
    let angle = ((a as f32) * 0.618_034 + (b as f32) * 0.414_214 + 0.11) * TAU;
    let lift = ((a + b) as f32 * 0.37).sin() * 0.5;
    Vec3::new(angle.cos(), lift, angle.sin()).normalize()
}
