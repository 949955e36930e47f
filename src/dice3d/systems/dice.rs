//! Dice result systems
//!
//! This module turns resting orientations into face values: the
//! most-upward face for most dice, the bottom face for a d4, and the
//! tens/ones combination for percentile pairs.

use glam::{Quat, Vec3};

use crate::dice3d::meshes::{die_model, DieModel};
use crate::dice3d::types::*;

/// Reads the raw face value a resting die shows.
///
/// Raw values follow the face layout: a d10 reports `0` for its ten face.
/// The engine uses [`OrientationReader`]; tests swap in fixed readers.
pub trait FaceReader {
    fn read_face(&mut self, shape: DieShape, rotation: Quat) -> u32;
}

/// Reads faces from the die's orientation against world up
#[derive(Clone, Copy, Debug, Default)]
pub struct OrientationReader;

impl FaceReader for OrientationReader {
    fn read_face(&mut self, shape: DieShape, rotation: Quat) -> u32 {
        determine_face(die_model(shape), rotation)
    }
}

/// Determine the face value of a die based on its rotation
pub fn determine_face(model: &DieModel, rotation: Quat) -> u32 {
    let up = Vec3::Y;
    // A resting tetrahedron has three near-tied upward faces but exactly
    // one face on the floor, and d4s are read from that face.
    let facing = if model.shape == DieShape::Tetrahedron {
        -1.0
    } else {
        1.0
    };

    let mut best_match = 0;
    let mut best_dot = f32::NEG_INFINITY;

    for face in &model.faces {
        let world_normal = rotation * face.normal;
        let dot = world_normal.dot(up) * facing;

        if dot > best_dot {
            best_dot = dot;
            best_match = face.value;
        }
    }

    best_match
}

/// Value of a single die from its raw face. A d10's `0` face is worth 10.
pub fn die_value(die: DiceType, raw: u32) -> u32 {
    match die.shape() {
        DieShape::Trapezohedron if raw == 0 => 10,
        _ => raw,
    }
}

/// Combine the raw faces of a percentile pair into `1..=100`.
pub fn percentile_value(tens_raw: u32, ones_raw: u32) -> u32 {
    // "00" on the tens die counts as 100, "0" on the ones die as 10.
    let tens = if tens_raw == 0 { 100 } else { tens_raw * 10 };
    let ones = if ones_raw == 0 { 10 } else { ones_raw };

    let result = if tens == 100 {
        if ones == 10 {
            100
        } else {
            ones
        }
    } else {
        tens + if ones == 10 { 0 } else { ones }
    };

    if result == 0 {
        100
    } else {
        result
    }
}

/// Raw face read off one body
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceReading {
    pub term: DiceTerm,
    pub role: DieRole,
    pub raw: u32,
}

/// Fold per-body readings (in slot order) into one value per term.
///
/// A percentile tens reading must be followed by its ones reading.
pub fn resolve_readings(readings: &[FaceReading]) -> Result<Vec<(DiceTerm, u32)>, RollError> {
    let mut values = Vec::with_capacity(readings.len());
    let mut iter = readings.iter();

    while let Some(reading) = iter.next() {
        match reading.role {
            DieRole::Single => values.push((reading.term, die_value(reading.term.die, reading.raw))),
            DieRole::PercentileTens => match iter.next() {
                Some(ones) if ones.role == DieRole::PercentileOnes => {
                    values.push((reading.term, percentile_value(reading.raw, ones.raw)));
                }
                _ => {
                    return Err(RollError::PhysicsFault(
                        "percentile tens die without its ones die".to_string(),
                    ))
                }
            },
            DieRole::PercentileOnes => {
                return Err(RollError::PhysicsFault(
                    "percentile ones die without its tens die".to_string(),
                ))
            }
        }
    }

    Ok(values)
}
