//! Throw Control State
//!
//! Host-controlled throw parameters: how hard, and optionally which way.

use std::f32::consts::TAU;
use std::ops::Range;

use glam::Vec3;
use rand::{CryptoRng, RngCore};

use crate::dice3d::rng::SecureRng;
use crate::dice3d::types::ThrowSettings;

/// How far a throw may stray from the aimed direction (radians).
const AIM_SPREAD: f32 = 0.35;

#[derive(Clone, Debug, PartialEq)]
pub struct ThrowControl {
    /// Throw strength, 0.0 to 1.0. Scales the top of the impulse range.
    pub throw_strength: f32,

    /// Aim angle around the vertical axis; `None` throws in a random direction.
    pub aim: Option<f32>,
}

impl Default for ThrowControl {
    fn default() -> Self {
        Self {
            throw_strength: 1.0,
            aim: None,
        }
    }
}

impl From<&ThrowSettings> for ThrowControl {
    fn from(settings: &ThrowSettings) -> Self {
        Self {
            throw_strength: settings.strength.clamp(0.0, 1.0),
            aim: settings.aim,
        }
    }
}

impl ThrowControl {
    pub fn with_strength(mut self, strength: f32) -> Self {
        self.throw_strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Aim toward a point on the tray floor, from the tray center.
    pub fn aimed_at(mut self, target: Vec3) -> Self {
        self.aim = if target.x.abs() + target.z.abs() > 0.001 {
            Some(target.z.atan2(target.x))
        } else {
            None
        };
        self
    }

    /// Horizontal speed range at the current strength.
    pub fn speed_range(&self, impulse: &Range<f32>) -> Range<f32> {
        let strength = self.throw_strength.clamp(0.0, 1.0);
        let top = impulse.start + (impulse.end - impulse.start) * strength;
        impulse.start..top
    }

    /// Unit horizontal throw direction.
    pub fn direction<R: RngCore + CryptoRng>(&self, rng: &mut SecureRng<R>) -> Vec3 {
        let angle = match self.aim {
            Some(aim) => aim + rng.symmetric(AIM_SPREAD),
            None => rng.range(0.0..TAU),
        };
        Vec3::new(angle.cos(), 0.0, angle.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_speed_range_scales_with_strength() {
        let impulse = 2.0..6.0;
        let full = ThrowControl::default();
        assert_eq!(full.speed_range(&impulse), 2.0..6.0);

        let half = ThrowControl::default().with_strength(0.5);
        assert_eq!(half.speed_range(&impulse), 2.0..4.0);

        let none = ThrowControl::default().with_strength(-3.0);
        assert_eq!(none.speed_range(&impulse), 2.0..2.0);
    }

    #[test]
    fn test_aimed_direction_stays_near_target() {
        let mut rng = SecureRng::from_rng(StdRng::seed_from_u64(3));
        let control = ThrowControl::default().aimed_at(Vec3::new(0.0, 0.0, -1.5));
        let target = Vec3::NEG_Z;

        for _ in 0..200 {
            let dir = control.direction(&mut rng);
            assert!((dir.length() - 1.0).abs() < 1e-5);
            assert!(dir.dot(target) > AIM_SPREAD.cos() - 1e-4);
        }
    }

    #[test]
    fn test_from_settings() {
        let settings = ThrowSettings {
            strength: 0.25,
            aim: Some(1.0),
            ..ThrowSettings::default()
        };
        let control = ThrowControl::from(&settings);
        assert_eq!(control.throw_strength, 0.25);
        assert_eq!(control.aim, Some(1.0));
    }

    #[test]
    fn test_aim_at_center_is_random() {
        let control = ThrowControl::default().aimed_at(Vec3::ZERO);
        assert_eq!(control.aim, None);
    }
}
