use std::f32::consts::PI;

use glam::Vec3;

use super::DieModel;
use crate::dice3d::types::DieShape;

/// Pentagonal trapezohedron with ten kite faces, numbered 0-9 with opposite
/// faces summing to 9 (even numbers around the top apex).
pub fn create_d10() -> DieModel {
    let apex = 1.0_f32;
    let step = 2.0 * PI / 5.0;
    // Ring height that keeps every kite planar for a unit ring radius.
    let c = (step / 2.0).cos();
    let ring_y = apex * (1.0 - c) / (1.0 + c);

    let mut vertices = vec![Vec3::new(0.0, apex, 0.0), Vec3::new(0.0, -apex, 0.0)];
    // Upper ring: indices 2..7
    for i in 0..5 {
        let a = i as f32 * step;
        vertices.push(Vec3::new(a.cos(), ring_y, a.sin()));
    }
    // Lower ring, offset half a step: indices 7..12
    for i in 0..5 {
        let a = (i as f32 + 0.5) * step;
        vertices.push(Vec3::new(a.cos(), -ring_y, a.sin()));
    }

    let upper = |i: usize| 2 + i % 5;
    let lower = |i: usize| 7 + i % 5;

    let mut polygons: Vec<([usize; 4], u32)> = Vec::with_capacity(10);
    for i in 0..5 {
        // Kite between upper[i] and upper[i + 1], centered over lower[i].
        polygons.push(([0, upper(i), lower(i), upper(i + 1)], 2 * i as u32));
    }
    for k in 0..5 {
        // Kite centered under upper[k]; its opposite is upper kite (k + 2) % 5.
        let opposite = 2 * ((k + 2) % 5) as u32;
        polygons.push(([1, lower(k + 4), upper(k), lower(k)], 9 - opposite));
    }

    let faces: Vec<(&[usize], u32)> = polygons.iter().map(|(p, v)| (&p[..], *v)).collect();
    DieModel::from_polygons(DieShape::Trapezohedron, &vertices, &faces)
}
