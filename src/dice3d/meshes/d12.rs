use glam::Vec3;

use super::DieModel;
use crate::dice3d::types::DieShape;

/// Dodecahedron with opposite faces summing to 13.
pub fn create_d12() -> DieModel {
    let phi = (1.0 + 5.0_f32.sqrt()) / 2.0;
    let inv_phi = 1.0 / phi;

    // Cube vertices: indices 0..8
    let mut vertices = Vec::with_capacity(20);
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                vertices.push(Vec3::new(sx, sy, sz));
            }
        }
    }

    // Rectangle vertices on each axis: indices 8..20
    for a in [-1.0, 1.0] {
        for b in [-1.0, 1.0] {
            vertices.push(Vec3::new(0.0, a * phi, b * inv_phi));
            vertices.push(Vec3::new(a * inv_phi, 0.0, b * phi));
            vertices.push(Vec3::new(a * phi, b * inv_phi, 0.0));
        }
    }

    let faces: [(&[usize], u32); 12] = [
        (&[9, 15, 4, 8, 0], 1),
        (&[1, 10, 0, 8, 11], 2),
        (&[13, 2, 9, 0, 10], 3),
        (&[5, 18, 12, 1, 11], 4),
        (&[17, 14, 2, 13, 3], 5),
        (&[12, 3, 13, 10, 1], 6),
        (&[14, 6, 15, 9, 2], 9),
        (&[4, 16, 5, 11, 8], 8),
        (&[6, 19, 16, 4, 15], 7),
        (&[7, 17, 3, 12, 18], 12),
        (&[14, 17, 7, 19, 6], 11),
        (&[19, 7, 18, 5, 16], 10),
    ];

    DieModel::from_polygons(DieShape::Dodecahedron, &vertices, &faces)
}
