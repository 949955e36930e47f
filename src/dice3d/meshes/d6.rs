use glam::Vec3;

use super::DieModel;
use crate::dice3d::types::DieShape;

/// Cube with opposite faces summing to 7.
pub fn create_d6() -> DieModel {
    // Vertex index bits: 4 = +X, 2 = +Y, 1 = +Z
    let vertices: Vec<Vec3> = (0..8)
        .map(|i| {
            let axis = |bit: usize| if i & bit != 0 { 1.0 } else { -1.0 };
            Vec3::new(axis(4), axis(2), axis(1))
        })
        .collect();

    let faces: [(&[usize], u32); 6] = [
        (&[2, 3, 6, 7], 1), // +Y
        (&[0, 1, 4, 5], 6), // -Y
        (&[4, 5, 6, 7], 2), // +X
        (&[0, 1, 2, 3], 5), // -X
        (&[1, 3, 5, 7], 3), // +Z
        (&[0, 2, 4, 6], 4), // -Z
    ];

    DieModel::from_polygons(DieShape::Cube, &vertices, &faces)
}
