//! The physics tray
//!
//! A floor, four visible walls, and a taller invisible containment boundary
//! with its own ceiling, all static rapier colliders. Dice are dynamic
//! convex-hull bodies with CCD enabled. The world advances in fixed steps
//! driven by [`FixedStepper`].

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::*;
use tracing::warn;

use crate::dice3d::meshes::DieModel;
use crate::dice3d::types::{RollError, StepSettings, TraySettings};

/// What a static tray block is for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrayBlockKind {
    Floor,
    Wall,
    /// Invisible, above the visible walls.
    Containment,
    /// Invisible lid on top of the containment walls.
    Ceiling,
}

impl TrayBlockKind {
    pub fn is_visible(&self) -> bool {
        matches!(self, TrayBlockKind::Floor | TrayBlockKind::Wall)
    }
}

/// Axis-aligned static cuboid making up the tray
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrayBlock {
    pub kind: TrayBlockKind,
    pub center: Vec3,
    pub half_extents: Vec3,
}

/// Floor top sits at y = 0 and walls at +/- `half_extent` on X and Z.
pub fn tray_blocks(settings: &TraySettings) -> Vec<TrayBlock> {
    let half = settings.half_extent;
    let t = settings.wall_thickness;
    let wall_h = settings.wall_height;
    let top = settings.containment_height;

    let mut blocks = vec![TrayBlock {
        kind: TrayBlockKind::Floor,
        center: Vec3::new(0.0, -t, 0.0),
        half_extents: Vec3::new(half + t, t, half + t),
    }];

    let mut ring = |kind: TrayBlockKind, bottom: f32, height: f32| {
        let y = bottom + height / 2.0;
        let hy = height / 2.0;
        // North / south span the full width including corners.
        for z in [-half - t / 2.0, half + t / 2.0] {
            blocks.push(TrayBlock {
                kind,
                center: Vec3::new(0.0, y, z),
                half_extents: Vec3::new(half + t, hy, t / 2.0),
            });
        }
        for x in [-half - t / 2.0, half + t / 2.0] {
            blocks.push(TrayBlock {
                kind,
                center: Vec3::new(x, y, 0.0),
                half_extents: Vec3::new(t / 2.0, hy, half),
            });
        }
    };
    ring(TrayBlockKind::Wall, 0.0, wall_h);
    ring(TrayBlockKind::Containment, wall_h, top - wall_h);

    blocks.push(TrayBlock {
        kind: TrayBlockKind::Ceiling,
        center: Vec3::new(0.0, top + t / 2.0, 0.0),
        half_extents: Vec3::new(half + t, t / 2.0, half + t),
    });

    blocks
}

/// Physical parameters of one die body
#[derive(Clone, Copy, Debug)]
pub struct BodySpec {
    pub radius: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
}

/// Initial pose and velocity of a die body. The throw impulse is expressed
/// as the velocity change it produces on a die at rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPlan {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Snapshot of one die body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
}

/// Fixed-timestep accumulator, decoupled from the render framerate.
#[derive(Clone, Debug)]
pub struct FixedStepper {
    dt: f32,
    max_frame_delta: f32,
    max_substeps: u32,
    accumulator: f32,
}

impl FixedStepper {
    pub fn new(settings: &StepSettings) -> Self {
        Self {
            dt: settings.dt,
            max_frame_delta: settings.max_frame_delta,
            max_substeps: settings.max_substeps,
            accumulator: 0.0,
        }
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Feed one frame's elapsed time and return how many steps to run.
    ///
    /// Frame time is clamped to `max_frame_delta`. When the substep cap is
    /// hit, the leftover time is dropped instead of carried forward.
    pub fn advance(&mut self, frame_delta: f32) -> u32 {
        let delta = if frame_delta.is_finite() {
            frame_delta.clamp(0.0, self.max_frame_delta)
        } else {
            0.0
        };
        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= self.dt && steps < self.max_substeps {
            self.accumulator -= self.dt;
            steps += 1;
        }
        if steps == self.max_substeps {
            self.accumulator = 0.0;
        }
        steps
    }

    #[cfg(test)]
    fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

pub struct Tray {
    settings: TraySettings,
    gravity: Vector<Real>,
    integration_parameters: IntegrationParameters,
    physics_pipeline: PhysicsPipeline,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    query_pipeline: QueryPipeline,
}

impl Tray {
    pub fn new(settings: &TraySettings, dt: f32) -> Self {
        let mut colliders = ColliderSet::new();

        for block in tray_blocks(settings) {
            let (friction, restitution) = match block.kind {
                TrayBlockKind::Floor => (settings.floor_friction, settings.floor_restitution),
                _ => (settings.wall_friction, settings.wall_restitution),
            };
            let e = block.half_extents;
            colliders.insert(
                ColliderBuilder::cuboid(e.x, e.y, e.z)
                    .translation(to_vector(block.center))
                    .friction(friction)
                    .restitution(restitution)
                    .build(),
            );
        }

        let integration_parameters = IntegrationParameters {
            dt,
            ..IntegrationParameters::default()
        };

        Self {
            settings: settings.clone(),
            gravity: vector![0.0, settings.gravity, 0.0],
            integration_parameters,
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders,
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
        }
    }

    pub fn settings(&self) -> &TraySettings {
        &self.settings
    }

    /// Insert a die body with its convex-hull collider.
    pub fn spawn_die(
        &mut self,
        model: &DieModel,
        spec: &BodySpec,
        plan: &SpawnPlan,
    ) -> Result<RigidBodyHandle, RollError> {
        let points: Vec<Point<Real>> = model
            .scaled_vertices(spec.radius)
            .iter()
            .map(|v| point![v.x, v.y, v.z])
            .collect();
        let collider = ColliderBuilder::convex_hull(&points)
            .ok_or_else(|| {
                RollError::PhysicsFault(format!("degenerate hull for {:?}", model.shape))
            })?
            .density(spec.density)
            .friction(spec.friction)
            .restitution(spec.restitution)
            .build();

        let body = RigidBodyBuilder::dynamic()
            .position(Isometry::from_parts(
                Translation3::new(plan.position.x, plan.position.y, plan.position.z),
                to_rotation(plan.rotation),
            ))
            .linvel(to_vector(plan.linear_velocity))
            .angvel(to_vector(plan.angular_velocity))
            .linear_damping(0.1)
            .angular_damping(0.3)
            .ccd_enabled(true)
            .build();

        let handle = self.bodies.insert(body);
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);
        Ok(handle)
    }

    /// Remove a die body and its collider. Removing an unknown handle is a no-op.
    pub fn remove_die(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.island_manager,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn body_state(&self, handle: RigidBodyHandle) -> Result<BodyState, RollError> {
        let body = self
            .bodies
            .get(handle)
            .ok_or_else(|| RollError::PhysicsFault(format!("missing body {:?}", handle)))?;

        Ok(BodyState {
            position: from_vector(body.translation()),
            rotation: from_rotation(body.rotation()),
            linear_velocity: from_vector(body.linvel()),
            angular_velocity: from_vector(body.angvel()),
        })
    }

    /// Advance the world by one fixed step.
    pub fn step(&mut self) {
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Pull a body that escaped the tray back inside with zero velocity.
    /// Returns `true` when a recovery happened.
    pub fn contain(&mut self, handle: RigidBodyHandle, radius: f32) -> Result<bool, RollError> {
        let half = self.settings.half_extent;
        let lid = self.settings.containment_height;
        let inner = (half - radius).max(0.0);
        let drop_height = self.settings.wall_height * 0.5;

        let body = self
            .bodies
            .get_mut(handle)
            .ok_or_else(|| RollError::PhysicsFault(format!("missing body {:?}", handle)))?;

        let p = *body.translation();
        let escaped = p.x.abs() > half
            || p.z.abs() > half
            || p.y < 0.0
            || p.y > lid
            || !p.y.is_finite();
        if !escaped {
            return Ok(false);
        }

        let recovered = vector![
            finite_or_zero(p.x).clamp(-inner, inner),
            drop_height.max(radius),
            finite_or_zero(p.z).clamp(-inner, inner)
        ];
        warn!(
            "die escaped the tray at ({:.2}, {:.2}, {:.2}); recovering",
            p.x, p.y, p.z
        );
        body.set_translation(recovered, true);
        body.set_linvel(vector![0.0, 0.0, 0.0], true);
        body.set_angvel(vector![0.0, 0.0, 0.0], true);
        Ok(true)
    }

    /// Teleport a body, keeping its rotation.
    #[cfg(test)]
    pub(crate) fn set_body_position(
        &mut self,
        handle: RigidBodyHandle,
        position: Vec3,
    ) -> Result<(), RollError> {
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or_else(|| RollError::PhysicsFault(format!("missing body {:?}", handle)))?;
        body.set_translation(to_vector(position), true);
        Ok(())
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}
