//! Throw choreography
//!
//! Turns parsed terms into body slots laid out on a grid above the tray,
//! each with a uniformly random pose and a randomized throw. All draws come
//! from [`SecureRng`].

use glam::Vec3;
use rand::{CryptoRng, RngCore};

use super::state::ThrowControl;
use crate::dice3d::rng::SecureRng;
use crate::dice3d::tray::SpawnPlan;
use crate::dice3d::types::{
    DiceTerm, DiceType, DieRole, ParsedExpression, RollError, TrayConfig,
};

/// One physical body to put in the tray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlannedDie {
    pub term: DiceTerm,
    pub role: DieRole,
    /// Circumradius of this body.
    pub radius: f32,
    pub plan: SpawnPlan,
}

/// Body slots for the terms, in order. A d100 takes two adjacent slots,
/// tens die first.
pub fn body_slots(parsed: &ParsedExpression) -> Vec<(usize, DiceTerm, DieRole)> {
    let mut slots = Vec::with_capacity(parsed.body_count());
    for (index, term) in parsed.terms.iter().enumerate() {
        if term.die == DiceType::D100 {
            slots.push((index, *term, DieRole::PercentileTens));
            slots.push((index, *term, DieRole::PercentileOnes));
        } else {
            slots.push((index, *term, DieRole::Single));
        }
    }
    slots
}

/// Grid pitch and column count for `count` bodies of at most `max_radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnGrid {
    pub pitch: f32,
    pub columns: usize,
    pub rows_per_layer: usize,
    pub jitter: f32,
    pub base_height: f32,
}

impl SpawnGrid {
    pub fn new(config: &TrayConfig, max_radius: f32) -> Self {
        let throw = &config.throw;
        let jitter = throw.jitter * throw.spacing;
        // Neighbouring dice may not touch even at full jitter.
        let pitch = throw.spacing.max(2.0 * max_radius + 2.0 * jitter + 0.01);

        let usable = 2.0 * (config.tray.half_extent - max_radius - jitter).max(0.0);
        let fit = (usable / pitch).floor() as usize + 1;

        Self {
            pitch,
            columns: throw.max_per_row.min(fit).max(1),
            rows_per_layer: fit.max(1),
            jitter,
            base_height: throw.spawn_height.max(max_radius + jitter),
        }
    }

    /// Layers needed to hold `count` bodies.
    pub fn layers(&self, count: usize) -> usize {
        let columns = self.columns.min(count).max(1);
        count.div_ceil(columns).div_ceil(self.rows_per_layer.max(1))
    }

    /// Highest point any body of radius `max_radius` can reach at spawn,
    /// upward jitter included.
    pub fn top(&self, count: usize, max_radius: f32) -> f32 {
        let layers = self.layers(count).max(1);
        self.base_height + (layers - 1) as f32 * self.pitch + self.jitter + max_radius
    }

    /// Slot centers for `count` bodies; rows fill the tray depth, then stack
    /// upward in layers.
    pub fn positions(&self, count: usize) -> Vec<Vec3> {
        let columns = self.columns.min(count).max(1);
        let rows = count.div_ceil(columns);
        let per_layer = self.rows_per_layer;

        (0..count)
            .map(|i| {
                let row = i / columns;
                let col = i % columns;
                let in_row = columns.min(count - row * columns);

                let layer = row / per_layer;
                let layer_row = row % per_layer;
                let layer_rows = per_layer.min(rows - layer * per_layer);

                Vec3::new(
                    (col as f32 - (in_row - 1) as f32 / 2.0) * self.pitch,
                    self.base_height + layer as f32 * self.pitch,
                    (layer_row as f32 - (layer_rows - 1) as f32 / 2.0) * self.pitch,
                )
            })
            .collect()
    }
}

/// Plan every body of a roll: position, pose and throw.
///
/// Fails with [`RollError::InvalidExpression`] when the stacked spawn grid
/// would reach the tray's lid.
pub fn plan_throw<R: RngCore + CryptoRng>(
    parsed: &ParsedExpression,
    config: &TrayConfig,
    control: &ThrowControl,
    rng: &mut SecureRng<R>,
) -> Result<Vec<PlannedDie>, RollError> {
    let slots = body_slots(parsed);
    let radius_of = |die: DiceType| config.dice.radius * die.scale();
    let max_radius = slots
        .iter()
        .map(|(_, term, _)| radius_of(term.die))
        .fold(0.0_f32, f32::max);

    let grid = SpawnGrid::new(config, max_radius);
    let top = grid.top(slots.len(), max_radius);
    if top >= config.tray.containment_height {
        return Err(RollError::InvalidExpression(format!(
            "{} dice do not fit in this tray ({} layers reach {:.2}, lid at {:.2})",
            slots.len(),
            grid.layers(slots.len()),
            top,
            config.tray.containment_height
        )));
    }
    let positions = grid.positions(slots.len());
    let speed = control.speed_range(&config.throw.impulse);

    let planned: Vec<PlannedDie> = slots
        .into_iter()
        .zip(positions)
        .map(|((_, term, role), center)| {
            let jitter = Vec3::new(
                rng.symmetric(grid.jitter),
                rng.range(0.0..grid.jitter),
                rng.symmetric(grid.jitter),
            );
            let rotation = rng.uniform_rotation();
            let horizontal = control.direction(rng) * rng.range(speed.clone());
            let lift = rng.range(config.throw.lift.clone());
            let spin = rng.symmetric_vec3(config.throw.spin);

            PlannedDie {
                term,
                role,
                radius: radius_of(term.die),
                plan: SpawnPlan {
                    position: center + jitter,
                    rotation,
                    linear_velocity: horizontal + Vec3::Y * lift,
                    angular_velocity: spin,
                },
            }
        })
        .collect();
    Ok(planned)
}
