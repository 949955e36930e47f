//! Cryptographically secure randomness for throws
//!
//! Every random draw that shapes a throw (jitter, pose, impulse, torque)
//! goes through [`SecureRng`], whose type bound only admits `CryptoRng`
//! sources.

use std::f32::consts::TAU;
use std::ops::Range;

use glam::{Quat, Vec3};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

pub struct SecureRng<R: RngCore + CryptoRng = OsRng> {
    inner: R,
}

impl SecureRng<OsRng> {
    /// Operating-system entropy.
    pub fn os() -> Self {
        Self { inner: OsRng }
    }
}

impl Default for SecureRng<OsRng> {
    fn default() -> Self {
        Self::os()
    }
}

impl<R: RngCore + CryptoRng> SecureRng<R> {
    pub fn from_rng(inner: R) -> Self {
        Self { inner }
    }

    /// Uniform scalar in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform scalar in `range`; an empty range yields its start.
    pub fn range(&mut self, range: Range<f32>) -> f32 {
        if range.start < range.end {
            self.inner.gen_range(range)
        } else {
            range.start
        }
    }

    /// Uniform scalar in `[-bound, bound)`.
    pub fn symmetric(&mut self, bound: f32) -> f32 {
        self.range(-bound..bound)
    }

    pub fn angle(&mut self) -> f32 {
        self.range(0.0..TAU)
    }

    /// Vector with each component uniform in `[-bound, bound)`.
    pub fn symmetric_vec3(&mut self, bound: f32) -> Vec3 {
        Vec3::new(
            self.symmetric(bound),
            self.symmetric(bound),
            self.symmetric(bound),
        )
    }

    /// Uniformly distributed rotation (Shoemake's subgroup algorithm).
    ///
    /// Independent Euler angles would over-sample poses near the poles;
    /// this draws uniformly over SO(3).
    pub fn uniform_rotation(&mut self) -> Quat {
        let u1 = self.unit();
        let u2 = self.unit();
        let u3 = self.unit();
        shoemake(u1, u2, u3)
    }
}

/// Map three uniform scalars in `[0, 1)` to a uniform unit quaternion.
pub fn shoemake(u1: f32, u2: f32, u3: f32) -> Quat {
    let r1 = (1.0 - u1).sqrt();
    let r2 = u1.sqrt();
    let (s1, c1) = (TAU * u2).sin_cos();
    let (s2, c2) = (TAU * u3).sin_cos();

    Quat::from_xyzw(r1 * s1, r1 * c1, r2 * s2, r2 * c2).normalize()
}
